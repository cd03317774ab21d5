//! Player configuration
//!
//! Read from an optional JSON file; every field has a default.

use std::fs;
use std::path::{Path, PathBuf};

use rgss_bitmap::FontDefaults;
use rgss_render::GraphicsConfig;
use rgss_types::{Color, RgssError, RgssResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: i32,
    pub pacing: bool,
    /// Directory scanned for `.ttf` / `.otf` fonts
    pub font_dir: Option<PathBuf>,
    pub font: FontDefaults,
    pub clear_color: Color,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let graphics = GraphicsConfig::default();
        Self {
            title: String::from("RGSS Player"),
            width: graphics.width,
            height: graphics.height,
            frame_rate: graphics.frame_rate,
            pacing: graphics.pacing,
            font_dir: Some(PathBuf::from("Fonts")),
            font: FontDefaults::default(),
            clear_color: graphics.clear_color,
        }
    }
}

impl PlayerConfig {
    /// Load a JSON config file
    pub fn load(path: &Path) -> RgssResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| RgssError::invalid_data(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> RgssResult<Self> {
        serde_json::from_str(text).map_err(|e| RgssError::invalid_data(e.to_string()))
    }

    pub fn graphics(&self) -> GraphicsConfig {
        GraphicsConfig {
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            pacing: self.pacing,
            clear_color: self.clear_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.frame_rate, 40);
        assert_eq!(config.font.name, "MS PGothic");
        assert_eq!(config.font.size, 22);
    }

    #[test]
    fn test_partial_json() {
        let config = PlayerConfig::from_json(
            r#"{ "title": "Test", "width": 320, "font": { "size": 16 }, "clear_color": [10, 20, 30, 255] }"#,
        )
        .unwrap();
        assert_eq!(config.title, "Test");
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 480);
        assert_eq!(config.font.size, 16);
        assert_eq!(config.font.name, "MS PGothic");
        assert_eq!(config.clear_color, Color::new(10.0, 20.0, 30.0, 255.0));

        let graphics = config.graphics();
        assert_eq!(graphics.width, 320);
        assert_eq!(graphics.clear_color, config.clear_color);
    }

    #[test]
    fn test_invalid_json() {
        assert!(PlayerConfig::from_json("{ width: }").is_err());
        assert!(PlayerConfig::from_json(r#"{ "width": "wide" }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = PlayerConfig::load(Path::new("/nonexistent/player.json")).unwrap_err();
        assert!(matches!(err, RgssError::Io(_)));
    }
}
