//! Rendering parameters and their configured fallbacks.

use std::fmt;

use serde_json::Value;

use super::error::DomainError;

pub const DEFAULT_MAP_STYLE: &str = "klokantech-basic";
pub const DEFAULT_WIDTH: u32 = 2048;
pub const DEFAULT_HEIGHT: u32 = 2048;
pub const DEFAULT_ZOOM: f64 = 10.5;
pub const DEFAULT_PITCH: f64 = 43.0;
pub const DEFAULT_BEARING: f64 = 163.0;

/// Dimensions above this tend to be rejected or time out upstream.
pub const RECOMMENDED_MAX_DIMENSION: u32 = 4096;

/// Map styles offered by the rendering service.
pub const KNOWN_MAP_STYLES: &[&str] = &[
    "osm-carto",
    "osm-bright",
    "osm-bright-grey",
    "osm-bright-smooth",
    "osm-liberty",
    "klokantech-basic",
    "positron",
    "dark-matter",
    "maptiler-3d",
    "toner",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleFactor {
    Single,
    #[default]
    Double,
}

impl ScaleFactor {
    pub fn get(self) -> u8 {
        match self {
            ScaleFactor::Single => 1,
            ScaleFactor::Double => 2,
        }
    }
}

impl TryFrom<u8> for ScaleFactor {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ScaleFactor::Single),
            2 => Ok(ScaleFactor::Double),
            other => Err(DomainError::validation(format!(
                "Scale factor must be 1 or 2 (got {other})."
            ))),
        }
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Per-request parameters; `None` falls back to [`MapDefaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub scale_factor: ScaleFactor,
    pub style: Option<String>,
    pub zoom: Option<f64>,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
}

impl RenderOptions {
    pub fn new(width: u32, height: u32, scale_factor: ScaleFactor) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::validation(
                "Width and height must be positive integers.",
            ));
        }

        Ok(Self {
            width,
            height,
            scale_factor,
            style: None,
            zoom: None,
            pitch: None,
            bearing: None,
        })
    }

    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_camera(mut self, zoom: Option<f64>, pitch: Option<f64>, bearing: Option<f64>) -> Self {
        self.zoom = zoom;
        self.pitch = pitch;
        self.bearing = bearing;
        self
    }

    pub fn is_oversized(&self) -> bool {
        self.width > RECOMMENDED_MAX_DIMENSION || self.height > RECOMMENDED_MAX_DIMENSION
    }

    pub fn resolve(&self, defaults: &MapDefaults) -> ResolvedRender {
        ResolvedRender {
            width: self.width,
            height: self.height,
            scale_factor: self.scale_factor,
            style: self
                .style
                .clone()
                .unwrap_or_else(|| defaults.style.clone()),
            zoom: self.zoom.or(defaults.zoom),
            pitch: self.pitch.or(defaults.pitch),
            bearing: self.bearing.or(defaults.bearing),
            style_customization: defaults.style_customization.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDefaults {
    pub style: String,
    pub width: u32,
    pub height: u32,
    pub scale_factor: ScaleFactor,
    pub zoom: Option<f64>,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
    pub style_customization: Vec<Value>,
}

impl MapDefaults {
    /// Options equivalent to submitting the form untouched.
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
            scale_factor: self.scale_factor,
            style: None,
            zoom: None,
            pitch: None,
            bearing: None,
        }
    }
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            style: DEFAULT_MAP_STYLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale_factor: ScaleFactor::Double,
            zoom: Some(DEFAULT_ZOOM),
            pitch: Some(DEFAULT_PITCH),
            bearing: Some(DEFAULT_BEARING),
            style_customization: Vec::new(),
        }
    }
}

/// Options after defaults have been applied; what actually goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRender {
    pub width: u32,
    pub height: u32,
    pub scale_factor: ScaleFactor,
    pub style: String,
    pub zoom: Option<f64>,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
    pub style_customization: Vec<Value>,
}

impl ResolvedRender {
    pub fn effective_resolution(&self) -> Resolution {
        let scale = u32::from(self.scale_factor.get());
        Resolution {
            width: self.width.saturating_mul(scale),
            height: self.height.saturating_mul(scale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
