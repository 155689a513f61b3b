//! # Configuration
//!
//! The driver is configured once, when it is constructed. Settings come from
//! the host as a loosely typed key/value map, stored as `config.json` in the
//! configuration directory:
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `placeholderServiceUrl` | `http://www.placecage.com/c/%d/%d` | Remote placeholder URL, two `%d` slots (width, height) |
//! | `imageMaxWidth` | `1024` | Upper bound for placeholder width |
//! | `imageMaxHeight` | `1024` | Upper bound for placeholder height |
//! | `useLocalFilesIfAvailable` | `true` | Prefer bundled `<ext>.<ext>` dummy files |
//! | `dummyFilesPath` | bundled `resources/dummy` | Directory holding the dummy files |
//! | `dummyFilesUrl` | `/_assets/fal_dummy/` | Public URL prefix of that directory |
//!
//! Host settings often carry numbers and flags as strings (`"800"`, `"0"`),
//! so both forms are accepted. A key that is absent keeps its default.
//! `useLocalFilesIfAvailable` is the one key where absence and presence
//! differ: absent means enabled, present means whatever the value says.
//!
//! The default `dummyFilesPath` is the `resources/dummy` directory of the
//! source tree the crate was built from. An installed binary that outlives
//! that tree must set `dummyFilesPath`; until it does, the dummy directory is
//! missing and every placeholder comes from the remote service.

use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_PLACEHOLDER_URL: &str = "http://www.placecage.com/c/%d/%d";
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
pub const DEFAULT_DUMMY_FILES_URL: &str = "/_assets/fal_dummy/";

const KEY_PLACEHOLDER_URL: &str = "placeholderServiceUrl";
const KEY_MAX_WIDTH: &str = "imageMaxWidth";
const KEY_MAX_HEIGHT: &str = "imageMaxHeight";
const KEY_USE_LOCAL_FILES: &str = "useLocalFilesIfAvailable";
const KEY_DUMMY_FILES_PATH: &str = "dummyFilesPath";
const KEY_DUMMY_FILES_URL: &str = "dummyFilesUrl";

pub const KEYS: [&str; 6] = [
    KEY_PLACEHOLDER_URL,
    KEY_MAX_WIDTH,
    KEY_MAX_HEIGHT,
    KEY_USE_LOCAL_FILES,
    KEY_DUMMY_FILES_PATH,
    KEY_DUMMY_FILES_URL,
];

/// Bundled assets in the build's source tree.
fn default_dummy_files_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/dummy"))
}

/// Driver-wide settings, resolved once and immutable for the driver's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverConfig {
    pub placeholder_service_url: String,
    pub image_max_width: u32,
    pub image_max_height: u32,
    pub use_local_files_if_available: bool,
    pub dummy_files_path: PathBuf,
    pub dummy_files_url: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            placeholder_service_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            image_max_width: DEFAULT_MAX_DIMENSION,
            image_max_height: DEFAULT_MAX_DIMENSION,
            use_local_files_if_available: true,
            dummy_files_path: default_dummy_files_path(),
            dummy_files_url: DEFAULT_DUMMY_FILES_URL.to_string(),
        }
    }
}

impl DriverConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DriverError::Io)?;
        let value: Value = serde_json::from_str(&content).map_err(DriverError::Serialization)?;
        match value {
            Value::Object(settings) => Ok(Self::from_settings(&settings)),
            Value::Null => Ok(Self::default()),
            _ => Err(DriverError::Config(format!(
                "{} must contain a JSON object",
                config_path.display()
            ))),
        }
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DriverError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(DriverError::Serialization)?;
        fs::write(config_path, content).map_err(DriverError::Io)?;
        Ok(())
    }

    /// Build a config from a raw host key/value map. Unusable values keep
    /// the built-in default.
    pub fn from_settings(settings: &Map<String, Value>) -> Self {
        let mut config = Self::default();

        if let Some(url) = settings.get(KEY_PLACEHOLDER_URL).and_then(non_empty_str) {
            config.placeholder_service_url = url.to_string();
        }

        for key in [KEY_MAX_WIDTH, KEY_MAX_HEIGHT] {
            let Some(value) = settings.get(key) else {
                continue;
            };
            match parse_dimension(value) {
                Some(max) if key == KEY_MAX_WIDTH => config.image_max_width = max,
                Some(max) => config.image_max_height = max,
                None => warn!(key, %value, "ignoring non-positive maximum dimension"),
            }
        }

        config.use_local_files_if_available = match settings.get(KEY_USE_LOCAL_FILES) {
            Some(value) => parse_flag(value),
            None => true,
        };

        if let Some(path) = settings.get(KEY_DUMMY_FILES_PATH).and_then(non_empty_str) {
            config.dummy_files_path = PathBuf::from(path);
        }

        if let Some(url) = settings.get(KEY_DUMMY_FILES_URL).and_then(non_empty_str) {
            config.dummy_files_url = url.to_string();
        }

        config
    }

    /// Current value of a setting, rendered as text.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            KEY_PLACEHOLDER_URL => self.placeholder_service_url.clone(),
            KEY_MAX_WIDTH => self.image_max_width.to_string(),
            KEY_MAX_HEIGHT => self.image_max_height.to_string(),
            KEY_USE_LOCAL_FILES => self.use_local_files_if_available.to_string(),
            KEY_DUMMY_FILES_PATH => self.dummy_files_path.display().to_string(),
            KEY_DUMMY_FILES_URL => self.dummy_files_url.clone(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Update a setting from text. Unlike loading, invalid values are rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let raw = Value::String(value.to_string());
        match key {
            KEY_PLACEHOLDER_URL | KEY_DUMMY_FILES_PATH | KEY_DUMMY_FILES_URL
                if value.trim().is_empty() =>
            {
                Err(DriverError::Config(format!("{} must not be empty", key)))
            }
            KEY_PLACEHOLDER_URL => {
                self.placeholder_service_url = value.to_string();
                Ok(())
            }
            KEY_MAX_WIDTH | KEY_MAX_HEIGHT => {
                let max = parse_dimension(&raw).ok_or_else(|| {
                    DriverError::Config(format!("{} must be a positive integer", key))
                })?;
                if key == KEY_MAX_WIDTH {
                    self.image_max_width = max;
                } else {
                    self.image_max_height = max;
                }
                Ok(())
            }
            KEY_USE_LOCAL_FILES => {
                self.use_local_files_if_available = parse_flag(&raw);
                Ok(())
            }
            KEY_DUMMY_FILES_PATH => {
                self.dummy_files_path = PathBuf::from(value);
                Ok(())
            }
            KEY_DUMMY_FILES_URL => {
                self.dummy_files_url = value.to_string();
                Ok(())
            }
            _ => Err(unknown_key(key)),
        }
    }
}

fn unknown_key(key: &str) -> DriverError {
    DriverError::Config(format!(
        "Unknown config key: {} (expected one of: {})",
        key,
        KEYS.join(", ")
    ))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_dimension(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "off" | "no"
        ),
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
