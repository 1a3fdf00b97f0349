use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::color::{Color, ColorOrder};

/// Error types for loading the service configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid [server] section: {0}")]
    Server(String),
    #[error("invalid [strip.{strip}] section: {reason}")]
    Strip { strip: String, reason: String },
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Strips keyed by name, from `[strip.<name>]` sections.
    #[serde(default, rename = "strip")]
    pub strips: BTreeMap<String, StripConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path segment of the HTTP endpoints and suffix of the remote method names.
    pub feature: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7130,
            feature: "rpi_neopixel".to_string(),
        }
    }
}

/// Which [`StripDriver`](crate::StripDriver) backs a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Mock,
    Ws281x,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StripConfig {
    pub driver: DriverKind,
    pub chain_count: usize,
    pub color_order: ColorOrder,
    /// GPIO pin of the data line.
    pub pin: i32,
    pub dma: i32,
    pub brightness: u8,
    pub initial_preset: i32,
    pub initial_red: f64,
    pub initial_green: f64,
    pub initial_blue: f64,
    pub initial_white: f64,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Mock,
            chain_count: 1,
            color_order: ColorOrder::default(),
            pin: 18,
            dma: 10,
            brightness: 255,
            initial_preset: -1,
            initial_red: 0.5,
            initial_green: 0.5,
            initial_blue: 0.5,
            initial_white: 0.5,
        }
    }
}

impl StripConfig {
    #[inline]
    pub fn initial_color(&self) -> Color {
        Color::new(
            self.initial_red,
            self.initial_green,
            self.initial_blue,
            self.initial_white,
        )
    }

    fn validate(&self) -> Result<(), String> {
        if self.chain_count == 0 {
            return Err("chain_count must be at least 1".to_string());
        }
        let components = [
            ("initial_red", self.initial_red),
            ("initial_green", self.initial_green),
            ("initial_blue", self.initial_blue),
            ("initial_white", self.initial_white),
        ];
        for (name, value) in components {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if !self.color_order.is_white_last() {
            return Err(format!(
                "color_order {}: white must be the last channel",
                self.color_order
            ));
        }
        if self.driver == DriverKind::Ws281x && !cfg!(feature = "rpi") {
            return Err("ws281x driver requested but the `rpi` feature is not enabled".to_string());
        }
        Ok(())
    }
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let feature = &self.server.feature;
        if feature.is_empty() || feature.contains('/') {
            return Err(ConfigError::Server(format!(
                "feature '{feature}' must be a non-empty path segment"
            )));
        }
        for (name, strip) in &self.strips {
            strip.validate().map_err(|reason| ConfigError::Strip {
                strip: name.clone(),
                reason,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").expect("empty config is valid");
        assert_eq!(config.server, ServerConfig::default());
        assert!(config.strips.is_empty());
    }

    #[test]
    fn parses_strip_sections() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [strip.case]
            chain_count = 60
            color_order = "GRB"
            initial_preset = 2
            initial_red = 1.0

            [strip.toolhead]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.feature, "rpi_neopixel");

        let case = &config.strips["case"];
        assert_eq!(case.chain_count, 60);
        assert_eq!(case.color_order.component_size(), 3);
        assert_eq!(case.initial_preset, 2);
        assert_eq!(case.initial_color(), Color::new(1.0, 0.5, 0.5, 0.5));
        assert_eq!(case.driver, DriverKind::Mock);

        assert_eq!(config.strips["toolhead"], StripConfig::default());
    }

    #[test_case("[strip.case]\nchain_count = 0"; "zero chain count")]
    #[test_case("[strip.case]\ninitial_blue = 1.5"; "color out of range")]
    #[test_case("[strip.case]\ncolor_order = \"RGX\""; "bad color order")]
    #[test_case("[strip.case]\ncolor_order = \"WBGR\""; "white not last")]
    #[test_case("[strip.case]\nbogus = 1"; "unknown field")]
    #[test_case("[server]\nfeature = \"a/b\""; "feature with slash")]
    #[test_case("[strip.case]\ndriver = \"serial\""; "unknown driver")]
    fn rejects_invalid_config(text: &str) {
        assert!(Config::from_toml(text).is_err());
    }

    #[cfg(not(feature = "rpi"))]
    #[test]
    fn ws281x_requires_rpi_feature() {
        let err = Config::from_toml("[strip.case]\ndriver = \"ws281x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Strip { ref strip, .. } if strip == "case"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/rpi_neopixel.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
