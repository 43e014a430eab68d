//! Per-tick field statistics.
//!
//! A [`Recorder`] is handed to [`crate::erosion::Simulation::tick_recorded`]
//! and receives a [`TickRecord`] for each tick it asks for. Non-finite values
//! are reported through `tracing` as they are seen.

use serde::Serialize;
use tracing::warn;

use crate::grid::GridState;

/// Summary of one scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStats {
    pub sum: f64,
    pub min: f32,
    pub max: f32,
    /// Number of NaN or infinite entries. These are excluded from the other
    /// statistics.
    pub non_finite: usize,
}

impl Default for FieldStats {
    fn default() -> Self {
        Self {
            sum: 0.0,
            min: 0.0,
            max: 0.0,
            non_finite: 0,
        }
    }
}

impl FieldStats {
    pub fn of(values: &[f32]) -> Self {
        let mut sum = 0.0f64;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut non_finite = 0;
        for &v in values {
            if !v.is_finite() {
                non_finite += 1;
                continue;
            }
            sum += v as f64;
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            return Self {
                non_finite,
                ..Default::default()
            };
        }
        Self {
            sum,
            min,
            max,
            non_finite,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.non_finite == 0
    }
}

/// Water and sediment statistics after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub water: FieldStats,
    pub sediment: FieldStats,
}

impl TickRecord {
    /// Gathers statistics from `state`, warning about any non-finite values.
    pub fn capture(tick: u64, state: &GridState) -> Self {
        let water = FieldStats::of(state.water());
        let sediment = FieldStats::of(state.sediment());
        if !water.is_finite() {
            warn!(tick, count = water.non_finite, "water contains non-finite values");
        }
        if !sediment.is_finite() {
            warn!(tick, count = sediment.non_finite, "sediment contains non-finite values");
        }
        Self { tick, water, sediment }
    }

    /// Name of the first field holding a non-finite value, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        if !self.water.is_finite() {
            Some("water")
        } else if !self.sediment.is_finite() {
            Some("sediment")
        } else {
            None
        }
    }
}

/// Receives per-tick statistics from the simulation.
pub trait Recorder {
    /// Whether a record should be captured after `tick`. Capturing walks
    /// every cell, so recorders that sample can skip ticks here.
    fn wants(&self, _tick: u64) -> bool {
        true
    }

    fn record(&mut self, record: TickRecord);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn wants(&self, _tick: u64) -> bool {
        false
    }

    fn record(&mut self, _record: TickRecord) {}
}

/// Keeps every `stride`-th record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    pub stride: u64,
    pub records: Vec<TickRecord>,
}

impl History {
    /// A stride of 0 is treated as 1.
    pub fn new(stride: u64) -> Self {
        Self {
            stride: stride.max(1),
            records: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<&TickRecord> {
        self.records.last()
    }
}

impl Recorder for History {
    fn wants(&self, tick: u64) -> bool {
        tick % self.stride.max(1) == 0
    }

    fn record(&mut self, record: TickRecord) {
        self.records.push(record);
    }
}
