//! Configuration management for mdf.
//!
//! Parses `mdf.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! default_parser = "comrak"
//! theme = "olivero"
//!
//! [conversion]
//! on_failure = "error"
//!
//! [allowed_html.themes]
//! olivero = "<span class> <div class>"
//!
//! [parsers.comrak]
//! extensions = ["table", "autolink"]
//! version_constraint = "^0.29"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mdf_sanitize::AllowedHtml;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the default parser id.
    pub default_parser: Option<String>,
    /// Override the theme context.
    pub theme: Option<String>,
    /// Override the sanitize flag.
    pub sanitize: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdf.toml";

/// Default maximum markdown input size (1 MiB).
const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parser used when none is requested. Falls back to the lowest weight.
    pub default_parser: Option<String>,
    /// Theme context for allowed-HTML overrides.
    pub theme: Option<String>,
    /// Whether rendered HTML is sanitized.
    pub sanitize: bool,
    /// Conversion behaviour.
    pub conversion: ConversionConfig,
    /// Allowed-HTML layers.
    pub allowed_html: AllowedHtmlConfig,
    /// Per-parser settings keyed by parser id.
    pub parsers: BTreeMap<String, ParserConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_parser: None,
            theme: None,
            sanitize: true,
            conversion: ConversionConfig::default(),
            allowed_html: AllowedHtmlConfig::default(),
            parsers: BTreeMap::new(),
            config_path: None,
        }
    }
}

/// What to do when a backend fails to convert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    /// Render an empty string.
    #[default]
    Empty,
    /// Return an error to the caller.
    Error,
}

/// Conversion configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Failure policy.
    pub on_failure: OnFailure,
    /// Maximum markdown input size in bytes.
    pub max_input_bytes: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            on_failure: OnFailure::Empty,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Allowed-HTML layers in allow-list syntax (`<a href> <* class>`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AllowedHtmlConfig {
    /// Replaces the built-in global default when set.
    pub global: Option<String>,
    /// Theme overrides keyed by theme name.
    pub themes: BTreeMap<String, String>,
}

/// Settings for a single parser.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Whether the parser is registered at all.
    pub enabled: bool,
    /// Weight override.
    pub weight: Option<i32>,
    /// Explicit extension selection; replaces the default-enabled set.
    pub extensions: Option<Vec<String>>,
    /// Semver range the backend library version must satisfy.
    pub version_constraint: Option<String>,
    /// Extra allowed HTML for this parser.
    pub allowed_html: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weight: None,
            extensions: None,
            version_constraint: None,
            allowed_html: None,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a field to hold a valid allow-list.
fn require_allowed_html(value: &str, field: &str) -> Result<(), ConfigError> {
    value
        .parse::<AllowedHtml>()
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("{field} is not a valid allow-list: {e}")))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdf.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing
    /// or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(default_parser) = &settings.default_parser {
            self.default_parser = Some(default_parser.clone());
        }
        if let Some(theme) = &settings.theme {
            self.theme = Some(theme.clone());
        }
        if let Some(sanitize) = settings.sanitize {
            self.sanitize = sanitize;
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Settings for a parser, or the defaults if the parser is not configured.
    pub fn parser(&self, id: &str) -> ParserConfig {
        self.parsers.get(id).cloned().unwrap_or_default()
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(default_parser) = &self.default_parser {
            require_non_empty(default_parser, "default_parser")?;
        }
        if let Some(theme) = &self.theme {
            require_non_empty(theme, "theme")?;
        }
        self.validate_conversion()?;
        self.validate_allowed_html()?;
        self.validate_parsers()?;
        Ok(())
    }

    fn validate_conversion(&self) -> Result<(), ConfigError> {
        if self.conversion.max_input_bytes == 0 {
            return Err(ConfigError::Validation(
                "conversion.max_input_bytes must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_allowed_html(&self) -> Result<(), ConfigError> {
        if let Some(global) = &self.allowed_html.global {
            require_allowed_html(global, "allowed_html.global")?;
        }
        for (theme, value) in &self.allowed_html.themes {
            require_allowed_html(value, &format!("allowed_html.themes.{theme}"))?;
        }
        Ok(())
    }

    fn validate_parsers(&self) -> Result<(), ConfigError> {
        for (id, parser) in &self.parsers {
            require_non_empty(id, "parsers key")?;
            for extension in parser.extensions.iter().flatten() {
                require_non_empty(extension, &format!("parsers.{id}.extensions entry"))?;
            }
            if let Some(constraint) = &parser.version_constraint {
                require_non_empty(constraint, &format!("parsers.{id}.version_constraint"))?;
            }
            if let Some(allowed_html) = &parser.allowed_html {
                require_allowed_html(allowed_html, &format!("parsers.{id}.allowed_html"))?;
            }
        }
        Ok(())
    }
}
