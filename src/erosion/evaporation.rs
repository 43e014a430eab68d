//! Evaporation.

use rayon::prelude::*;

use super::Coefficient;

/// Removes `time_step * kevap` of depth from every cell, never below zero.
pub(crate) fn evaporate(water: &mut [f32], evaporation: &Coefficient, time_step: f32) {
    water.par_iter_mut().enumerate().for_each(|(i, w)| {
        *w = (*w - time_step * evaporation.at(i)).max(0.0);
    });
}
