//! Shell and window configuration.
//!
//! Loaded from TOML or JSON. Every field has a default, so a config file
//! only needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{Color, parse_hex_color};
use crate::error::{ConchError, Result};

/// Window chrome settings, forwarded untouched to the window host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Host element or window identifier the shell mounts into.
    pub element: String,
    pub title: String,
    /// Working path shown in the title bar.
    pub path: String,
    pub user: String,
    pub height: String,
    pub width: String,
    /// Background opacity in `[0.0, 1.0]`.
    pub opacity: f32,
    pub fg_color: String,
    pub bg_color: String,
    /// Title bar color.
    pub tl_color: String,
    pub font_name: String,
    pub font_size: u16,
    pub disposable: bool,
    pub minimizable: bool,
    pub movable: bool,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            element: "terminal".to_string(),
            title: "Terminal".to_string(),
            path: "/".to_string(),
            user: "default".to_string(),
            height: "200px".to_string(),
            width: "400px".to_string(),
            opacity: 0.75,
            fg_color: "#ffffff".to_string(),
            bg_color: "#000000".to_string(),
            tl_color: "#121212".to_string(),
            font_name: "Lucida Console".to_string(),
            font_size: 11,
            disposable: true,
            minimizable: true,
            movable: false,
            resizable: false,
        }
    }
}

impl WindowConfig {
    pub fn foreground(&self) -> Color {
        parse_hex_color(&self.fg_color).unwrap_or(Color::WHITE)
    }

    pub fn background(&self) -> Color {
        parse_hex_color(&self.bg_color).unwrap_or(Color::BLACK)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub window: WindowConfig,
    /// Prefix for echoed input lines.
    pub prompt: String,
    /// Prefix every log line with `[HH:MM:SS:ff]`.
    pub date_option: bool,
    /// Reveal every log line one character at a time.
    pub type_mode: bool,
    /// Ignore command registry mutations from the public API.
    pub read_only: bool,
    /// Character painted for each secret keystroke.
    pub mask_char: char,
    /// Delay between revealed characters.
    pub reveal_step_ms: u32,
    /// Delay before scrolling when type mode is on.
    pub scroll_settle_ms: u32,
    /// `sch` delay when none (or zero) is given.
    pub schedule_default_ms: u32,
    /// Delay before the `exit` command tears the surface down.
    pub exit_delay_ms: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            prompt: "$".to_string(),
            date_option: false,
            type_mode: false,
            read_only: false,
            mask_char: '*',
            reveal_step_ms: 15,
            scroll_settle_ms: 100,
            schedule_default_ms: 1000,
            exit_delay_ms: 100,
        }
    }
}

impl ShellConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, picking the format from the extension
    /// (`.json` is JSON, anything else is TOML).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        log::debug!("loading shell config from {}", path.display());
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.window.opacity) {
            return Err(ConchError::Config(format!(
                "opacity must be within 0.0..=1.0, got {}",
                self.window.opacity
            )));
        }
        if self.mask_char.is_control() {
            return Err(ConchError::Config(
                "mask_char must be printable".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.prompt, "$");
        assert_eq!(cfg.mask_char, '*');
        assert_eq!(cfg.reveal_step_ms, 15);
        assert_eq!(cfg.schedule_default_ms, 1000);
        assert!(!cfg.read_only);
        assert_eq!(cfg.window.title, "Terminal");
        assert_eq!(cfg.window.font_size, 11);
        assert!((cfg.window.opacity - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ShellConfig::from_toml_str(
            r##"
read_only = true
date_option = true

[window]
title = "Ops"
bg_color = "#101010"
"##,
        )
        .unwrap();
        assert!(cfg.read_only);
        assert!(cfg.date_option);
        assert!(!cfg.type_mode);
        assert_eq!(cfg.window.title, "Ops");
        assert_eq!(cfg.window.background(), Color::rgb(16, 16, 16));
        assert_eq!(cfg.window.user, "default");
    }

    #[test]
    fn json_config() {
        let cfg =
            ShellConfig::from_json_str(r#"{"type_mode": true, "window": {"user": "root"}}"#)
                .unwrap();
        assert!(cfg.type_mode);
        assert_eq!(cfg.window.user, "root");
        assert_eq!(cfg.prompt, "$");
    }

    #[test]
    fn rejects_out_of_range_opacity() {
        let err = ShellConfig::from_toml_str("[window]\nopacity = 1.5\n").unwrap_err();
        assert!(matches!(err, ConchError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ShellConfig::from_toml_str("prompt = ").unwrap_err();
        assert!(matches!(err, ConchError::TomlParse(_)));
    }

    #[test]
    fn bad_color_falls_back() {
        let mut win = WindowConfig::default();
        win.fg_color = "not-a-color".into();
        assert_eq!(win.foreground(), Color::WHITE);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ShellConfig::load(Path::new("/nonexistent/conch.toml")).unwrap_err();
        assert!(matches!(err, ConchError::Io(_)));
    }
}
