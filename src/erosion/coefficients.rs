//! Spatially varying (or uniform) erosion coefficients.

use serde::{Deserialize, Serialize};

use super::config::{require_non_negative, ConfigError};

/// A per-cell coefficient lookup.
///
/// Serialized as a bare number or an array of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coefficient {
    /// Same value everywhere.
    Uniform(f32),
    /// One value per cell, row-major.
    Field(Vec<f32>),
}

impl Default for Coefficient {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl From<f32> for Coefficient {
    fn from(value: f32) -> Self {
        Self::Uniform(value)
    }
}

impl From<Vec<f32>> for Coefficient {
    fn from(values: Vec<f32>) -> Self {
        Self::Field(values)
    }
}

impl Coefficient {
    /// Value at flat cell index `index`.
    #[inline]
    pub fn at(&self, index: usize) -> f32 {
        match self {
            Coefficient::Uniform(v) => *v,
            Coefficient::Field(values) => values[index],
        }
    }

    /// Checks the coefficient is finite, non-negative and, for a field,
    /// sized to `cells`.
    pub fn validate(&self, name: &'static str, cells: usize) -> Result<(), ConfigError> {
        match self {
            Coefficient::Uniform(v) => require_non_negative(name, *v),
            Coefficient::Field(values) => {
                if values.len() != cells {
                    return Err(ConfigError::FieldSize {
                        name,
                        expected: cells,
                        actual: values.len(),
                    });
                }
                values.iter().try_for_each(|&v| require_non_negative(name, v))
            }
        }
    }
}

/// The four coefficient maps consumed by the sediment and evaporation stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coefficients {
    /// Carry capacity constant (Kc).
    pub carry_capacity: Coefficient,
    /// Deposition constant (Kd).
    pub deposition: Coefficient,
    /// Erosion constant (Ke).
    pub erosion: Coefficient,
    /// Water depth removed per second (Kevap).
    pub evaporation: Coefficient,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::uniform(0.01, 0.01, 0.005, 0.1)
    }
}

impl Coefficients {
    /// Uniform coefficients everywhere.
    pub fn uniform(carry_capacity: f32, deposition: f32, erosion: f32, evaporation: f32) -> Self {
        Self {
            carry_capacity: Coefficient::Uniform(carry_capacity),
            deposition: Coefficient::Uniform(deposition),
            erosion: Coefficient::Uniform(erosion),
            evaporation: Coefficient::Uniform(evaporation),
        }
    }

    /// Validates all four maps against a grid of `cells` cells.
    pub fn validate(&self, cells: usize) -> Result<(), ConfigError> {
        self.carry_capacity.validate("carry_capacity", cells)?;
        self.deposition.validate("deposition", cells)?;
        self.erosion.validate("erosion", cells)?;
        self.evaporation.validate("evaporation", cells)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_and_field_lookup() {
        let uniform = Coefficient::from(0.25);
        assert_eq!(uniform.at(0), 0.25);
        assert_eq!(uniform.at(1000), 0.25);

        let field = Coefficient::from(vec![0.0, 1.0, 2.0]);
        assert_eq!(field.at(2), 2.0);
    }

    #[test]
    fn test_field_size_is_checked() {
        let coefficients = Coefficients {
            erosion: Coefficient::Field(vec![0.1; 3]),
            ..Default::default()
        };
        assert_eq!(coefficients.validate(3), Ok(()));
        assert_eq!(
            coefficients.validate(4),
            Err(ConfigError::FieldSize {
                name: "erosion",
                expected: 4,
                actual: 3,
            })
        );
    }

    #[test]
    fn test_negative_values_rejected() {
        let coefficients = Coefficients::uniform(0.01, -0.1, 0.1, 0.1);
        assert!(matches!(
            coefficients.validate(1),
            Err(ConfigError::Negative { name: "deposition", .. })
        ));
    }

    #[test]
    fn test_json_accepts_numbers_and_arrays() {
        let coefficients: Coefficients =
            serde_json::from_str(r#"{"erosion": 0.2, "evaporation": [0.0, 0.5]}"#).unwrap();
        assert_eq!(coefficients.erosion, Coefficient::Uniform(0.2));
        assert_eq!(coefficients.evaporation, Coefficient::Field(vec![0.0, 0.5]));
        assert_eq!(coefficients.deposition, Coefficients::default().deposition);
    }
}
