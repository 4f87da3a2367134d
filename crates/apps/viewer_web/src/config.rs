use scene::GlobeSettings;
use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Pointer interaction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Radians of rotation per pixel of drag.
    pub drag_sensitivity: f64,
    /// Time for the globe to ease toward the accumulated drag offset.
    pub rotation_duration_s: f64,
    /// Window widths at or above this use the side-by-side layout.
    pub wide_layout_min_width_px: f64,
    pub auto_rotate_enabled: bool,
    pub auto_rotate_speed_deg_per_s: f64,
    /// Spin resumes this long after the last drag.
    pub auto_rotate_resume_delay_s: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.005,
            rotation_duration_s: 2.0,
            wide_layout_min_width_px: 1280.0,
            auto_rotate_enabled: true,
            auto_rotate_speed_deg_per_s: 3.0,
            auto_rotate_resume_delay_s: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    /// Eye position on +Z, looking at the origin.
    pub distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 4x MSAA when the adapter supports it.
    pub antialias: bool,
    /// Render at `window.devicePixelRatio`; off renders at CSS resolution.
    pub hidpi: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            hidpi: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub container: String,
    pub tooltip: String,
    pub label: String,
    pub value: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            container: "canvasContainer".to_string(),
            tooltip: "popUpElement".to_string(),
            label: "populationElement".to_string(),
            value: "populationElementValue".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub globe: GlobeSettings,
    pub controls: ControlConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub texture_url: String,
    pub elements: ElementIds,
    /// `EnvFilter` directives, e.g. `"info,scene=debug"`.
    pub log_filter: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            globe: GlobeSettings::default(),
            controls: ControlConfig::default(),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
            texture_url: "globe.jpg".to_string(),
            elements: ElementIds::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parse a (possibly partial) JSON config; absent fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| ViewerError::Config(e.to_string()))
    }
}
