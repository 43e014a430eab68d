//! Concrete terrain storage: a single height layer and a rock/soil stack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TerrainModel;
use crate::grid::GridSize;

/// Errors raised when building terrain from caller-supplied data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("{layer} data has {actual} values, expected {expected} for a {width}x{height} grid")]
    SizeMismatch {
        layer: &'static str,
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

fn check_len(layer: &'static str, size: GridSize, len: usize) -> Result<(), TerrainError> {
    if len != size.cell_count() {
        return Err(TerrainError::SizeMismatch {
            layer,
            width: size.width,
            height: size.height,
            expected: size.cell_count(),
            actual: len,
        });
    }
    Ok(())
}

/// A single composite elevation layer stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMap {
    size: GridSize,
    heights: Vec<f32>,
}

impl HeightMap {
    /// Creates a flat height map at elevation 0.
    pub fn new(width: usize, height: usize) -> Self {
        let size = GridSize::new(width, height);
        Self {
            size,
            heights: vec![0.0; size.cell_count()],
        }
    }

    /// Wraps existing row-major elevation data.
    pub fn from_vec(width: usize, height: usize, heights: Vec<f32>) -> Result<Self, TerrainError> {
        let size = GridSize::new(width, height);
        check_len("height", size, heights.len())?;
        Ok(Self { size, heights })
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.heights
    }
}

impl TerrainModel for HeightMap {
    fn width(&self) -> usize {
        self.size.width
    }

    fn height(&self) -> usize {
        self.size.height
    }

    #[inline]
    fn get_height(&self, x: usize, y: usize) -> f32 {
        self.heights[self.size.index(x, y)]
    }

    #[inline]
    fn set_height(&mut self, x: usize, y: usize, value: f32) {
        let i = self.size.index(x, y);
        self.heights[i] = value;
    }

    #[inline]
    fn add_height(&mut self, x: usize, y: usize, delta: f32) {
        let i = self.size.index(x, y);
        self.heights[i] += delta;
    }

    fn total_height(&self) -> f64 {
        self.heights.iter().map(|&h| h as f64).sum()
    }
}

/// Terrain made of a fixed rock base and an erodible soil layer on top.
///
/// The elevation seen by the solver is `rock + soil`. Every height change
/// lands in the soil layer; the rock never moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredTerrain {
    size: GridSize,
    rock: Vec<f32>,
    soil: Vec<f32>,
}

impl LayeredTerrain {
    /// Creates flat rock at elevation 0 covered by `soil_depth` of soil.
    pub fn new(width: usize, height: usize, soil_depth: f32) -> Self {
        let size = GridSize::new(width, height);
        Self {
            size,
            rock: vec![0.0; size.cell_count()],
            soil: vec![soil_depth; size.cell_count()],
        }
    }

    /// Builds terrain from a rock layer with a uniform soil cover.
    pub fn from_rock(width: usize, height: usize, rock: Vec<f32>, soil_depth: f32) -> Result<Self, TerrainError> {
        let size = GridSize::new(width, height);
        check_len("rock", size, rock.len())?;
        Ok(Self {
            size,
            soil: vec![soil_depth; rock.len()],
            rock,
        })
    }

    /// Builds terrain from explicit rock and soil layers.
    pub fn from_layers(width: usize, height: usize, rock: Vec<f32>, soil: Vec<f32>) -> Result<Self, TerrainError> {
        let size = GridSize::new(width, height);
        check_len("rock", size, rock.len())?;
        check_len("soil", size, soil.len())?;
        Ok(Self { size, rock, soil })
    }

    pub fn rock(&self) -> &[f32] {
        &self.rock
    }

    pub fn soil(&self) -> &[f32] {
        &self.soil
    }

    /// Combined `rock + soil` elevation per cell.
    pub fn combined(&self) -> Vec<f32> {
        self.rock.iter().zip(&self.soil).map(|(r, s)| r + s).collect()
    }
}

impl TerrainModel for LayeredTerrain {
    fn width(&self) -> usize {
        self.size.width
    }

    fn height(&self) -> usize {
        self.size.height
    }

    #[inline]
    fn get_height(&self, x: usize, y: usize) -> f32 {
        let i = self.size.index(x, y);
        self.rock[i] + self.soil[i]
    }

    fn set_height(&mut self, x: usize, y: usize, value: f32) {
        let i = self.size.index(x, y);
        self.soil[i] = value - self.rock[i];
    }

    #[inline]
    fn add_height(&mut self, x: usize, y: usize, delta: f32) {
        let i = self.size.index(x, y);
        self.soil[i] += delta;
    }

    fn erodible_depth(&self, x: usize, y: usize) -> f32 {
        self.soil[self.size.index(x, y)].max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_map_get_set() {
        let mut map = HeightMap::new(4, 3);
        map.set_height(2, 1, 0.5);
        assert_eq!(map.get_height(2, 1), 0.5);
        assert_eq!(map.heights()[6], 0.5);

        map.add_height(2, 1, -0.25);
        assert_eq!(map.get_height(2, 1), 0.25);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = HeightMap::from_vec(3, 3, vec![0.0; 8]).unwrap_err();
        assert_eq!(
            err,
            TerrainError::SizeMismatch {
                layer: "height",
                width: 3,
                height: 3,
                expected: 9,
                actual: 8,
            }
        );
    }

    #[test]
    fn test_height_range_and_total() {
        let map = HeightMap::from_vec(2, 2, vec![-0.5, 0.0, 1.5, 1.0]).unwrap();
        assert_eq!(map.height_range(), (-0.5, 1.5));
        assert!((map.total_height() - 2.0).abs() < 1e-9);

        let empty = HeightMap::new(0, 0);
        assert_eq!(empty.height_range(), (0.0, 0.0));
    }

    #[test]
    fn test_layered_terrain_moves_soil_only() {
        let mut terrain = LayeredTerrain::from_rock(2, 1, vec![1.0, 2.0], 0.5).unwrap();
        assert_eq!(terrain.get_height(1, 0), 2.5);

        terrain.add_height(1, 0, -0.2);
        assert_eq!(terrain.rock(), &[1.0, 2.0]);
        assert!((terrain.soil()[1] - 0.3).abs() < 1e-6);
        assert!((terrain.erodible_depth(1, 0) - 0.3).abs() < 1e-6);

        terrain.set_height(0, 0, 1.25);
        assert_eq!(terrain.soil()[0], 0.25);
        assert_eq!(terrain.combined()[0], 1.25);
    }

    #[test]
    fn test_default_erodible_depth_is_unbounded() {
        let map = HeightMap::new(1, 1);
        assert!(map.erodible_depth(0, 0).is_infinite());
    }
}
