use serde::{Deserialize, Serialize};
use shield_model::camera::{
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_STEP,
};
use shield_model::history::DEFAULT_MAX_HISTORY_SIZE;
use shield_model::Camera;
use std::path::Path;

/// Common range metadata so bounds live in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SettingRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

// Camera ranges
pub const ZOOM_BOUND_RANGE: SettingRange =
    SettingRange::new(0.05, 10.0, 0.05);
pub const ZOOM_STEP_RANGE: SettingRange =
    SettingRange::new(0.01, 1.0, 0.01);

// History range
pub const HISTORY_SIZE_RANGE: SettingRange =
    SettingRange::new(1.0, 1000.0, 1.0);

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub camera: CameraSettings,
    pub history: HistorySettings,
    pub project: ProjectSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl CameraSettings {
    pub fn to_camera(&self) -> Camera {
        Camera::with_bounds(self.min_zoom, self.max_zoom)
            .with_zoom_step(self.zoom_step)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_history_size: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Pretty-print saved project files.
    pub pretty: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl EditorSettings {
    /// Reads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(
                path = %path.display(),
                "no settings file, using defaults"
            );
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let settings: EditorSettings = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamps every value into its range and orders the zoom bounds.
    pub fn sanitized(mut self) -> Self {
        let a = ZOOM_BOUND_RANGE.clamp(self.camera.min_zoom);
        let b = ZOOM_BOUND_RANGE.clamp(self.camera.max_zoom);
        self.camera.min_zoom = a.min(b);
        self.camera.max_zoom = a.max(b);
        self.camera.zoom_step = ZOOM_STEP_RANGE.clamp(self.camera.zoom_step);

        let size = self.history.max_history_size as f32;
        self.history.max_history_size =
            HISTORY_SIZE_RANGE.clamp(size) as usize;
        self
    }
}
