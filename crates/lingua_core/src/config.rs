//! Application configuration.
//!
//! # Responsibility
//! - Load optional settings from a TOML file with every field defaulted.
//! - Validate bounds before any component consumes them.
//!
//! # Invariants
//! - A missing config file means defaults, not an error.
//! - The API credential is never read from this file; see
//!   `enrich::credentials`.

use crate::enrich::http::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::graph::layout::LayoutConfig;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MIN_CANVAS_PX: u32 = 64;
const MAX_CANVAS_PX: u32 = 4096;

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Hosted-model settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl EnrichConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Neighborhood image settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub iterations: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let layout = LayoutConfig::default();
        Self {
            width: layout.width,
            height: layout.height,
            seed: layout.seed,
            iterations: layout.iterations,
        }
    }
}

impl RenderConfig {
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            width: self.width,
            height: self.height,
            seed: self.seed,
            iterations: self.iterations,
            ..LayoutConfig::default()
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Glossary JSON document.
    pub data_path: PathBuf,
    pub log_level: Option<String>,
    /// Relative paths resolve against the working directory.
    pub log_dir: PathBuf,
    /// TOML file consulted for the API credential after the environment.
    pub secrets_path: PathBuf,
    pub enrich: EnrichConfig,
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("lingua_layers.json"),
            log_level: None,
            log_dir: PathBuf::from("logs"),
            secrets_path: PathBuf::from("secrets.toml"),
            enrich: EnrichConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };
        let config: Self = toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            source: err,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks numeric bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enrich.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "enrich.timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [("width", self.render.width), ("height", self.render.height)] {
            if !(MIN_CANVAS_PX..=MAX_CANVAS_PX).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "render.{name} must be within {MIN_CANVAS_PX}..={MAX_CANVAS_PX}, got {value}"
                )));
            }
        }
        if self.render.iterations == 0 {
            return Err(ConfigError::Invalid(
                "render.iterations must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute log directory, resolved against `base` when relative.
    pub fn resolved_log_dir(&self, base: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            base.join(&self.log_dir)
        }
    }
}
