use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color;

/// Speed assignment for inserted objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationProfile {
    pub base_speed: f32,
    pub speed_increment: f32,
}

impl AnimationProfile {
    /// Rotation speed, in radians per second, for the object at `index`.
    pub fn speed(&self, index: usize) -> f32 {
        self.base_speed + index as f32 * self.speed_increment
    }
}

impl Default for AnimationProfile {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            speed_increment: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Initial aspect; replaced by the surface ratio on the first tick.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            aspect: 2.0,
            near: 0.1,
            far: 5.0,
            position: Vec3::new(0.0, 0.0, 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl LightConfig {
    pub fn white(position: Vec3) -> Self {
        Self {
            position,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

/// Everything a scene needs besides its objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World distance between neighbouring grid cells.
    pub spread: f32,
    pub animation: AnimationProfile,
    pub camera: CameraConfig,
    pub background: Option<Vec3>,
    pub lights: Vec<LightConfig>,
}

impl EngineConfig {
    /// Three spinning cubes seen from up close.
    pub fn cubes() -> Self {
        Self {
            spread: 1.0,
            animation: AnimationProfile {
                base_speed: 1.0,
                speed_increment: 0.1,
            },
            camera: CameraConfig::default(),
            background: None,
            lights: vec![LightConfig::white(Vec3::new(-1.0, 2.0, 4.0))],
        }
    }

    /// Grid of every primitive kind on a white background.
    pub fn primitives() -> Self {
        Self {
            spread: 15.0,
            animation: AnimationProfile {
                base_speed: 0.1,
                speed_increment: 0.5,
            },
            camera: CameraConfig {
                fov: 40.0,
                aspect: 2.0,
                near: 0.1,
                far: 1000.0,
                position: Vec3::new(0.0, 0.0, 120.0),
            },
            background: Some(color::from_hex(0xffffff)),
            lights: vec![
                LightConfig::white(Vec3::new(-1.0, 2.0, 4.0)),
                LightConfig::white(Vec3::new(1.0, -2.0, -4.0)),
            ],
        }
    }

    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Cubes => Self::cubes(),
            Preset::Primitives => Self::primitives(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::cubes()
    }
}

/// Named starting configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Cubes,
    #[default]
    Primitives,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cubes => "cubes",
            Self::Primitives => "primitives",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cubes" => Ok(Self::Cubes),
            "primitives" => Ok(Self::Primitives),
            other => Err(anyhow!("unknown preset {other:?}, expected cubes or primitives")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn speeds_grow_linearly_with_index() {
        let profile = EngineConfig::primitives().animation;
        assert_abs_diff_eq!(profile.speed(0), 0.1);
        assert_abs_diff_eq!(profile.speed(3), 1.6, epsilon = 1e-6);
        let cubes = EngineConfig::cubes().animation;
        assert_abs_diff_eq!(cubes.speed(2), 1.2, epsilon = 1e-6);
    }

    #[test]
    fn presets_differ_in_camera() {
        let cubes = EngineConfig::cubes();
        let primitives = EngineConfig::primitives();
        assert_eq!(cubes.camera.fov, 75.0);
        assert_eq!(primitives.camera.far, 1000.0);
        assert_eq!(primitives.lights.len(), 2);
        assert_eq!(primitives.background, Some(Vec3::ONE));
        assert_eq!(EngineConfig::preset(Preset::Cubes), cubes);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "spread": 4.0 }"#).unwrap();
        assert_eq!(config.spread, 4.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("Cubes".parse::<Preset>().unwrap(), Preset::Cubes);
        assert!("teapots".parse::<Preset>().is_err());
    }
}
