use thiserror::Error;

use crate::geometry::PrimitiveKind;

/// Invalid construction parameters. Raised before anything reaches the scene.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{kind}: `{parameter}` must be positive, got {value}")]
    NonPositive {
        kind: PrimitiveKind,
        parameter: &'static str,
        value: f32,
    },
    #[error("{kind}: `{parameter}` must not be negative, got {value}")]
    Negative {
        kind: PrimitiveKind,
        parameter: &'static str,
        value: f32,
    },
    #[error("{kind}: `{parameter}` must be finite")]
    NotFinite {
        kind: PrimitiveKind,
        parameter: &'static str,
    },
    #[error("{kind}: `{parameter}` needs at least {minimum}, got {value}")]
    TooFewSegments {
        kind: PrimitiveKind,
        parameter: &'static str,
        minimum: u32,
        value: u32,
    },
    #[error("{kind}: `{parameter}` allows at most {maximum}, got {value}")]
    TooManySegments {
        kind: PrimitiveKind,
        parameter: &'static str,
        maximum: u32,
        value: u32,
    },
    #[error("shape outline needs at least 3 distinct points, got {0}")]
    DegenerateShape(usize),
    #[error("text {0:?} produced no glyph outlines")]
    EmptyText(String),
    #[error("wireframe source must not itself be a wireframe")]
    NestedWireframe,
    #[error("color `{parameter}` must lie in [0, 1], got {value}")]
    ColorOutOfRange {
        parameter: &'static str,
        value: f32,
    },
}

/// Failure of an asynchronous asset load. The scene is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetLoadError {
    #[error("failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("loader for {url} was dropped without resolving")]
    Abandoned { url: String },
    #[error("geometry built from {url} is invalid: {source}")]
    Geometry {
        url: String,
        #[source]
        source: ConfigurationError,
    },
}

impl AssetLoadError {
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Parse { url, .. }
            | Self::Abandoned { url }
            | Self::Geometry { url, .. } => url,
        }
    }
}

/// Failure of the external draw call. Fatal to one tick only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("surface is not available for drawing")]
    SurfaceUnavailable,
    #[error("backend draw failed: {0}")]
    Backend(String),
}

/// The refresh signal refused to schedule another frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("refresh signal unavailable: {0}")]
    RefreshUnavailable(String),
}
