use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How a new material picks its color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPolicy {
    /// Normalized RGB.
    Fixed(Vec3),
    /// Hue drawn uniformly from `[0, 1)` once, at creation.
    RandomHue { saturation: f32, luminance: f32 },
}

impl ColorPolicy {
    pub fn hex(hex: u32) -> Self {
        Self::Fixed(crate::color::from_hex(hex))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::Fixed(color) => {
                for (parameter, value) in [("red", color.x), ("green", color.y), ("blue", color.z)] {
                    check_unit(parameter, value)?;
                }
                Ok(())
            }
            Self::RandomHue {
                saturation,
                luminance,
            } => {
                check_unit("saturation", saturation)?;
                check_unit("luminance", luminance)
            }
        }
    }
}

impl Default for ColorPolicy {
    /// Saturated mid-luminance random hue.
    fn default() -> Self {
        Self::RandomHue {
            saturation: 1.0,
            luminance: 0.5,
        }
    }
}

fn check_unit(parameter: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::ColorOutOfRange { parameter, value })
    }
}

/// Which faces of a triangle are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Surface appearance. The color is fixed at creation and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Vec3,
    /// Hue, saturation and luminance when the color came from a random hue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsl: Option<Vec3>,
    #[serde(default)]
    pub side: Side,
    /// Draw as lines regardless of the geometry topology.
    #[serde(default)]
    pub wireframe: bool,
}

impl Material {
    pub fn solid(color: Vec3) -> Self {
        Self {
            color,
            hsl: None,
            side: Side::Front,
            wireframe: false,
        }
    }

    /// Double sided HSL material, the look used for the primitive showcase.
    pub fn from_hsl(hue: f32, saturation: f32, luminance: f32) -> Self {
        Self {
            color: crate::color::from_hsl(hue, saturation, luminance),
            hsl: Some(Vec3::new(hue, saturation, luminance)),
            side: Side::Double,
            wireframe: false,
        }
    }

    /// Material for line geometry.
    pub fn line(color: Vec3) -> Self {
        Self {
            color,
            hsl: None,
            side: Side::Front,
            wireframe: true,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::solid(Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn policy_rejects_out_of_range_components() {
        let bad = ColorPolicy::RandomHue {
            saturation: 1.5,
            luminance: 0.5,
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigurationError::ColorOutOfRange {
                parameter: "saturation",
                value: 1.5
            })
        );
        assert!(ColorPolicy::Fixed(Vec3::new(0.0, -0.1, 0.0)).validate().is_err());
        assert!(ColorPolicy::hex(0x44aa88).validate().is_ok());
    }

    #[test]
    fn hsl_material_records_components() {
        let material = Material::from_hsl(0.25, 1.0, 0.5);
        assert_eq!(material.side, Side::Double);
        assert_eq!(material.hsl, Some(Vec3::new(0.25, 1.0, 0.5)));
        assert_abs_diff_eq!(material.color.x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(material.color.y, 1.0, epsilon = 1e-6);
    }
}
