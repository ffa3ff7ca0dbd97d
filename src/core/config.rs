//! Engine and camera configuration
//!
//! Stored as RON so it can be hand-edited next to the binary.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable VSync
    pub vsync: bool,
    /// Background colour, sRGB-encoded as in an image editor
    pub clear_color: [f64; 3],
    /// Starting camera parameters
    pub camera: CameraConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Lumen"),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: [0.4, 0.6, 0.75],
            camera: CameraConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with a title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set window dimensions
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable VSync
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Replace the camera parameters
    #[must_use]
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    /// Save the configuration to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a configuration from a RON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse a configuration from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::DeserializeError(e.to_string()))
    }

    /// Load `path` if it exists, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::load_ron(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Clear colour for a render target. sRGB targets expect linear values
    /// and encode on write; other targets take the stored values as-is.
    pub fn clear_color(&self, srgb_target: bool) -> wgpu::Color {
        let [r, g, b] = if srgb_target {
            self.clear_color.map(srgb_to_linear)
        } else {
            self.clear_color
        };
        wgpu::Color { r, g, b, a: 1.0 }
    }
}

/// Decode one sRGB channel to linear
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Fly camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position
    pub position: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Units per second
    pub movement_speed: f32,
    /// Radians per pixel of mouse drag
    pub mouse_look_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -10.0),
            fov: std::f32::consts::FRAC_PI_4,
            near: 0.01,
            far: 400.0,
            movement_speed: 10.0,
            mouse_look_speed: 1.0 / 30.0,
        }
    }
}

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.clear_color, [0.4, 0.6, 0.75]);
        assert_eq!(config.camera.position, Vec3::new(0.0, 0.0, -10.0));
        assert!((config.camera.far - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_clear_color_decoded_for_srgb_target() {
        let config = EngineConfig::default();

        let raw = config.clear_color(false);
        assert_eq!([raw.r, raw.g, raw.b], [0.4, 0.6, 0.75]);

        let linear = config.clear_color(true);
        assert!((linear.r - 0.1329).abs() < 1e-3);
        assert!((linear.g - 0.3185).abs() < 1e-3);
        assert!((linear.b - 0.5225).abs() < 1e-3);
        assert_eq!(linear.a, 1.0);

        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_title("Demo")
            .with_size(800, 600)
            .with_vsync(false);

        assert_eq!(config.title, "Demo");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.vsync);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = EngineConfig::default().with_title("Round trip");
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();

        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config =
            EngineConfig::from_ron_str("(title: \"Partial\", camera: (movement_speed: 2.5))")
                .unwrap();

        assert_eq!(config.title, "Partial");
        assert_eq!(config.width, 1280);
        assert!((config.camera.movement_speed - 2.5).abs() < 1e-6);
        assert!((config.camera.near - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_ron() {
        let result = EngineConfig::from_ron_str("(width: \"wide\")");
        assert!(matches!(result, Err(ConfigError::DeserializeError(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EngineConfig::load_or_default("no/such/lumen.ron").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
