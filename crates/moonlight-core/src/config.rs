//! Engine options and theme defaults.

use crate::error::EngineResult;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::shapes::Style;
use crate::snap::GRID_SIZE;
use serde::{Deserialize, Serialize};

/// Color theme. Supplies the style used wherever an element leaves a field
/// unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Fully resolved style values for a theme.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeStyle {
    pub stroke: &'static str,
    pub fill: &'static str,
    pub stroke_width: f64,
    pub text: &'static str,
    pub background: &'static str,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn style(self) -> ThemeStyle {
        match self {
            Theme::Light => ThemeStyle {
                stroke: "#1e1e1e",
                fill: "none",
                stroke_width: 2.0,
                text: "#1e1e1e",
                background: "#ffffff",
            },
            Theme::Dark => ThemeStyle {
                stroke: "#e0e0e0",
                fill: "none",
                stroke_width: 2.0,
                text: "#e0e0e0",
                background: "#121212",
            },
        }
    }
}

/// Which style fields fell back to the theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeFallback {
    pub fill: bool,
    pub stroke: bool,
    pub stroke_width: bool,
}

impl ThemeFallback {
    pub fn any(&self) -> bool {
        self.fill || self.stroke || self.stroke_width
    }
}

impl ThemeStyle {
    /// Fill in unset fields of `style`, reporting which ones were filled.
    pub fn resolve(&self, style: &Style, is_text: bool) -> (Style, ThemeFallback) {
        let fallback = ThemeFallback {
            fill: style.fill.is_none(),
            stroke: style.stroke.is_none(),
            stroke_width: style.stroke_width.is_none(),
        };
        let default_fill = if is_text { self.text } else { self.fill };
        let default_stroke = if is_text { "none" } else { self.stroke };
        let resolved = Style {
            fill: Some(style.fill.clone().unwrap_or_else(|| default_fill.to_string())),
            stroke: Some(
                style
                    .stroke
                    .clone()
                    .unwrap_or_else(|| default_stroke.to_string()),
            ),
            stroke_width: Some(style.stroke_width.unwrap_or(self.stroke_width)),
        };
        (resolved, fallback)
    }
}

/// Options a host passes when creating an engine. Every field has a
/// default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub width: f64,
    pub height: f64,
    /// Snap gestures to the grid.
    #[serde(alias = "gridSnap")]
    pub gridsnap: bool,
    pub grid_size: f64,
    pub theme: Theme,
    pub zoom: f64,
    pub readonly: bool,
    /// Markup loaded when the engine starts.
    pub initial_svg: Option<String>,
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            gridsnap: false,
            grid_size: GRID_SIZE,
            theme: Theme::Light,
            zoom: 1.0,
            readonly: false,
            initial_svg: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let mut config: EngineConfig = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Replace unusable values with defaults.
    pub fn sanitize(&mut self) {
        let defaults = EngineConfig::default();
        self.width = positive_or(self.width, defaults.width);
        self.height = positive_or(self.height, defaults.height);
        self.grid_size = positive_or(self.grid_size, defaults.grid_size);
        self.zoom = positive_or(self.zoom, defaults.zoom);
        self.history_limit = self.history_limit.max(1);
    }
}

fn positive_or(value: f64, default: f64) -> f64 {
    if value > 0.0 && value.is_finite() { value } else { default }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_camel_case_fields() {
        let config = EngineConfig::from_json(
            r#"{"gridsnap": true, "gridSize": 10, "theme": "dark", "historyLimit": 5, "initialSvg": "<svg/>"}"#,
        )
        .unwrap();
        assert!(config.gridsnap);
        assert!((config.grid_size - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.initial_svg.as_deref(), Some("<svg/>"));
    }

    #[test]
    fn test_invalid_values_sanitized() {
        let config = EngineConfig::from_json(r#"{"width": -5, "zoom": 0}"#).unwrap();
        assert!((config.width - 800.0).abs() < f64::EPSILON);
        assert!((config.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(EngineConfig::from_json("{width").is_err());
    }

    #[test]
    fn test_theme_resolution_reports_fallbacks() {
        let style = Style {
            fill: Some("#ff0000".into()),
            stroke: None,
            stroke_width: None,
        };
        let (resolved, fallback) = Theme::Dark.style().resolve(&style, false);
        assert_eq!(resolved.fill.as_deref(), Some("#ff0000"));
        assert_eq!(resolved.stroke.as_deref(), Some("#e0e0e0"));
        assert!(!fallback.fill);
        assert!(fallback.stroke && fallback.stroke_width);
    }
}
