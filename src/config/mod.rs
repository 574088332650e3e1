//! Conversion configuration: geometry, typography, colors and theming.
//!
//! A `Config` starts from built-in defaults, optionally absorbs a JSON
//! theme file, and is finally overridden by command-line flags. The
//! merged record is read-only for the rest of the conversion.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::terminal::ANSI_16_COLORS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read theme file {}", path.display())]
    ThemeRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid theme JSON in {}", path.display())]
    ThemeParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid poster time '{0}': expected a non-negative number of seconds or 'end'")]
    InvalidPosterTime(String),
}

/// Which animation dialect the output SVG uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GeneratorKind {
    /// CSS keyframe animations.
    #[default]
    Css,
    /// SMIL (`<set>`/`<animate>`) animations.
    Smil,
}

/// The instant a static poster frame is taken at, instead of animating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PosterAt {
    Seconds(f64),
    /// The final state of the recording.
    End,
}

impl FromStr for PosterAt {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("end") {
            return Ok(PosterAt::End);
        }
        match s.parse::<f64>() {
            Ok(seconds) if seconds >= 0.0 && seconds.is_finite() => Ok(PosterAt::Seconds(seconds)),
            _ => Err(ConfigError::InvalidPosterTime(s.to_string())),
        }
    }
}

/// Settings a theme file may override. All fields optional; anything
/// absent keeps its current value.
#[derive(Debug, Default, Deserialize)]
pub struct ThemeOverrides {
    pub font_size: Option<f64>,
    pub line_height_factor: Option<f64>,
    pub font_width_factor: Option<f64>,
    pub font_family: Option<String>,
    pub default_fg: Option<String>,
    pub default_bg: Option<String>,
    pub animation_pause_seconds: Option<f64>,
    /// Partial palette override, keyed by foreground SGR code (30-37,
    /// 90-97). Codes not present keep the standard color.
    pub ansi_16_colors: Option<BTreeMap<u8, String>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rows: usize,
    pub cols: usize,
    pub font_size: f64,
    pub line_height_factor: f64,
    pub font_width_factor: f64,
    pub font_family: String,
    pub default_fg: String,
    pub default_bg: String,
    /// Hold on the final frame before the animation loops.
    pub animation_pause_seconds: f64,
    pub generator: GeneratorKind,
    /// Explicit SVG element id prefix; derived from the output path's
    /// content hash when absent.
    pub id: Option<String>,
    /// Render a static frame at this instant instead of an animation.
    pub poster_at: Option<PosterAt>,
    /// 16-color palette, keyed by foreground SGR code.
    pub palette: BTreeMap<u8, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            font_size: 14.0,
            line_height_factor: 1.2,
            font_width_factor: 0.6,
            font_family: "Menlo, Monaco, \"Courier New\", monospace".to_string(),
            default_fg: "#e0e0e0".to_string(),
            default_bg: "#1a1a1a".to_string(),
            animation_pause_seconds: 5.0,
            generator: GeneratorKind::Css,
            id: None,
            poster_at: None,
            palette: default_palette(),
        }
    }
}

impl Config {
    /// Merge a theme file over the current settings.
    pub fn apply_theme_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ThemeRead {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: ThemeOverrides =
            serde_json::from_str(&text).map_err(|source| ConfigError::ThemeParse {
                path: path.to_path_buf(),
                source,
            })?;
        self.apply_theme(overrides);
        Ok(())
    }

    pub fn apply_theme(&mut self, theme: ThemeOverrides) {
        if let Some(v) = theme.font_size {
            self.font_size = v;
        }
        if let Some(v) = theme.line_height_factor {
            self.line_height_factor = v;
        }
        if let Some(v) = theme.font_width_factor {
            self.font_width_factor = v;
        }
        if let Some(v) = theme.font_family {
            self.font_family = v;
        }
        if let Some(v) = theme.default_fg {
            self.default_fg = v;
        }
        if let Some(v) = theme.default_bg {
            self.default_bg = v;
        }
        if let Some(v) = theme.animation_pause_seconds {
            self.animation_pause_seconds = v;
        }
        if let Some(colors) = theme.ansi_16_colors {
            self.palette.extend(colors);
        }
    }

    /// Hex value for a 16-color SGR code. Background codes normalize to
    /// their foreground counterpart before lookup.
    pub fn palette_hex(&self, code: u8) -> Option<&str> {
        let code = match code {
            40..=47 | 100..=107 => code - 10,
            _ => code,
        };
        self.palette.get(&code).map(String::as_str)
    }
}

fn default_palette() -> BTreeMap<u8, String> {
    ANSI_16_COLORS
        .iter()
        .map(|(code, hex)| (*code, (*hex).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_standard_terminal() {
        let config = Config::default();
        assert_eq!((config.cols, config.rows), (80, 24));
        assert_eq!(config.generator, GeneratorKind::Css);
        assert_eq!(config.palette_hex(31), Some("#cc0000"));
    }

    #[test]
    fn background_codes_normalize_in_palette_lookup() {
        let config = Config::default();
        assert_eq!(config.palette_hex(41), config.palette_hex(31));
        assert_eq!(config.palette_hex(101), config.palette_hex(91));
    }

    #[test]
    fn poster_at_parses_seconds_and_end() {
        assert_eq!("end".parse::<PosterAt>().ok(), Some(PosterAt::End));
        assert_eq!("END".parse::<PosterAt>().ok(), Some(PosterAt::End));
        assert_eq!("2.5".parse::<PosterAt>().ok(), Some(PosterAt::Seconds(2.5)));
        assert!("-1".parse::<PosterAt>().is_err());
        assert!("soon".parse::<PosterAt>().is_err());
    }

    #[test]
    fn theme_merges_over_defaults() {
        let mut config = Config::default();
        let theme: ThemeOverrides = serde_json::from_str(
            r##"{
                "font_size": 16,
                "default_bg": "#000000",
                "ansi_16_colors": {"31": "#ff5555"}
            }"##,
        )
        .unwrap();
        config.apply_theme(theme);

        assert_eq!(config.font_size, 16.0);
        assert_eq!(config.default_bg, "#000000");
        assert_eq!(config.palette_hex(31), Some("#ff5555"));
        // Untouched entries keep their standard values.
        assert_eq!(config.palette_hex(32), Some("#4e9a06"));
        assert_eq!(config.default_fg, "#e0e0e0");
    }

    #[test]
    fn theme_file_errors_name_the_path() {
        let mut config = Config::default();
        let err = config
            .apply_theme_file(Path::new("/nonexistent/theme.json"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/theme.json"));
    }
}
