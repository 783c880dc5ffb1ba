//! # Configuration
//!
//! Every setting has a default, so a partial (or missing) settings file is always valid.

use crate::style::{Color, Style};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("malformed settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not write settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{field} must be {requirement}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub grid_display: bool,
    /// Grid spacing, logical pixels.
    pub grid_size: f32,
    /// Draw bounds and endpoints over every element.
    pub debug: bool,
    /// Margin between a selected element and its highlight.
    pub selection_padding: f32,
    pub background: Color,
}
impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_display: true,
            grid_size: 20.0,
            debug: false,
            selection_padding: 10.0,
            background: Color::WHITE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    pub color: Color,
    pub width: f32,
    pub opacity: f32,
    /// Track device pressure when the pointer reports it. Otherwise pressure is simulated.
    pub use_pressure: bool,
}
impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
            opacity: 1.0,
            use_pressure: true,
        }
    }
}
impl StrokeConfig {
    /// Style given to new strokes.
    #[must_use]
    pub fn style(&self) -> Style {
        Style {
            stroke_color: self.color,
            stroke_width: self.width,
            opacity: self.opacity,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the latest late-arriving move on the frame after, instead of dropping the frame's first.
    pub trailing: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}
impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub stroke: StrokeConfig,
    pub scheduler: SchedulerConfig,
    pub canvas: CanvasConfig,
}
impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, requirement| Err(ConfigError::Invalid { field, requirement });
        if !(self.render.grid_size.is_finite() && self.render.grid_size > 0.0) {
            return invalid("render.grid_size", "a positive number");
        }
        if !(self.render.selection_padding.is_finite() && self.render.selection_padding >= 0.0) {
            return invalid("render.selection_padding", "a non-negative number");
        }
        if !(self.stroke.width.is_finite() && self.stroke.width > 0.0) {
            return invalid("stroke.width", "a positive number");
        }
        if !(0.0..=1.0).contains(&self.stroke.opacity) {
            return invalid("stroke.opacity", "between 0 and 1");
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return invalid("canvas", "at least 1x1");
        }
        Ok(())
    }
    #[must_use]
    pub fn throttle_mode(&self) -> crate::scheduler::ThrottleMode {
        crate::scheduler::ThrottleMode::from_trailing(self.scheduler.trailing)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }
    #[test]
    fn partial_sections() {
        let config = Config::from_toml_str(
            r##"
            [render]
            grid_display = false
            background = "#202020"

            [stroke]
            width = 3.0
        "##,
        )
        .unwrap();
        assert!(!config.render.grid_display);
        assert_eq!(config.render.grid_size, 20.0);
        assert_eq!(config.render.background, Color::rgba(0x20, 0x20, 0x20, 255));
        assert_eq!(config.stroke.style().stroke_width, 3.0);
        assert!(config.stroke.use_pressure);
    }
    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_toml_str("[stroke]\nwidth = -1.0"),
            Err(ConfigError::Invalid {
                field: "stroke.width",
                ..
            })
        ));
        assert!(matches!(
            Config::from_toml_str("[render]\nbackground = \"plaid\""),
            Err(ConfigError::Parse(_))
        ));
    }
    #[test]
    fn roundtrip() {
        let mut config = Config::default();
        config.scheduler.trailing = true;
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
