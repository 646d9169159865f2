//! Nightshift Configuration
//!
//! Handles parsing of nightshift.toml configuration files.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ffi::DEFAULT_OBJC_LIBRARY;

/// Private framework that defines the blue-light client class.
pub const DEFAULT_FRAMEWORK: &str =
    "/System/Library/PrivateFrameworks/CoreBrightness.framework/CoreBrightness";

/// Class that controls Night Shift.
pub const DEFAULT_CLASS: &str = "CBBlueLightClient";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "nightshift.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "NIGHTSHIFT_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching nightshift.toml.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct NightshiftConfig {
    /// Library and class to bind
    #[serde(default)]
    pub framework: FrameworkConfig,

    /// Objective-C runtime location
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Command-line behavior
    #[serde(default)]
    pub cli: CliConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

impl NightshiftConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the configuration the process environment points at, or the
    /// defaults when there is none.
    pub fn load_from_env() -> ConfigResult<Self> {
        Self::load_with(|key| std::env::var_os(key).map(PathBuf::from))
    }

    /// Like [`load_from_env`](Self::load_from_env) with an explicit
    /// environment lookup.
    pub fn load_with(env: impl Fn(&str) -> Option<PathBuf>) -> ConfigResult<Self> {
        // An explicitly named file has to exist.
        if let Some(path) = env(CONFIG_ENV) {
            return Self::load(&path);
        }

        match default_config_path(&env) {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `$XDG_CONFIG_HOME/nightshift/nightshift.toml`, falling back to
/// `~/.config/nightshift/nightshift.toml`.
pub fn default_config_path(env: impl Fn(&str) -> Option<PathBuf>) -> Option<PathBuf> {
    let base = env("XDG_CONFIG_HOME")
        .filter(|p| p.is_absolute())
        .or_else(|| env("HOME").map(|home| home.join(".config")))?;
    Some(base.join("nightshift").join(CONFIG_FILE_NAME))
}

/// Library and class to bind.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FrameworkConfig {
    /// Path to the framework binary
    #[serde(default = "default_framework_path")]
    pub path: PathBuf,

    /// Class to instantiate
    #[serde(default = "default_class")]
    pub class: String,
}

fn default_framework_path() -> PathBuf {
    PathBuf::from(DEFAULT_FRAMEWORK)
}

fn default_class() -> String {
    DEFAULT_CLASS.to_string()
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            path: default_framework_path(),
            class: default_class(),
        }
    }
}

/// Objective-C runtime location.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Path to libobjc
    #[serde(default = "default_objc_library")]
    pub objc_library: PathBuf,
}

fn default_objc_library() -> PathBuf {
    PathBuf::from(DEFAULT_OBJC_LIBRARY)
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            objc_library: default_objc_library(),
        }
    }
}

/// Command-line behavior.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Reject malformed `temp` arguments instead of falling back to a read
    #[serde(default)]
    pub strict_arguments: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Minimum level written to stderr
    #[serde(default)]
    pub level: LogLevel,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Raise the level by `steps` (one per `-v`), saturating at `Trace`.
    pub fn raised(self, steps: u8) -> Self {
        const ORDER: [LogLevel; 6] = [
            LogLevel::Off,
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let index = self as usize + steps as usize;
        ORDER[index.min(ORDER.len() - 1)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &Path)]) -> impl Fn(&str) -> Option<PathBuf> {
        let map: HashMap<String, PathBuf> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_path_buf()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NightshiftConfig::default();
        assert_eq!(config.framework.path, PathBuf::from(DEFAULT_FRAMEWORK));
        assert_eq!(config.framework.class, "CBBlueLightClient");
        assert_eq!(config.runtime.objc_library, PathBuf::from(DEFAULT_OBJC_LIBRARY));
        assert!(!config.cli.strict_arguments);
        assert_eq!(config.log.level, LogLevel::Warn);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[framework]
class = "CBBlueLightClientSubclass"

[cli]
strict_arguments = true

[log]
level = "debug"
"#;

        let config = NightshiftConfig::parse(toml).unwrap();
        assert_eq!(config.framework.class, "CBBlueLightClientSubclass");
        // Unset fields keep their defaults.
        assert_eq!(config.framework.path, PathBuf::from(DEFAULT_FRAMEWORK));
        assert!(config.cli.strict_arguments);
        assert_eq!(config.log.level, LogLevel::Debug);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = NightshiftConfig::parse("").unwrap();
        assert_eq!(config, NightshiftConfig::default());
    }

    #[test]
    fn test_parse_invalid_level() {
        let err = NightshiftConfig::parse("[log]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = NightshiftConfig::load(Path::new("/nonexistent/nightshift.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_default_config_path() {
        let xdg = default_config_path(env_of(&[
            ("XDG_CONFIG_HOME", Path::new("/xdg")),
            ("HOME", Path::new("/home/u")),
        ]));
        assert_eq!(xdg, Some(PathBuf::from("/xdg/nightshift/nightshift.toml")));

        let home = default_config_path(env_of(&[("HOME", Path::new("/home/u"))]));
        assert_eq!(
            home,
            Some(PathBuf::from("/home/u/.config/nightshift/nightshift.toml"))
        );

        // A relative XDG_CONFIG_HOME is ignored.
        let relative = default_config_path(env_of(&[
            ("XDG_CONFIG_HOME", Path::new("relative")),
            ("HOME", Path::new("/home/u")),
        ]));
        assert_eq!(
            relative,
            Some(PathBuf::from("/home/u/.config/nightshift/nightshift.toml"))
        );

        assert_eq!(default_config_path(env_of(&[])), None);
    }

    #[test]
    fn test_load_with_xdg_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("nightshift");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join(CONFIG_FILE_NAME),
            "[framework]\nclass = \"FromXdg\"\n",
        )
        .unwrap();

        let config =
            NightshiftConfig::load_with(env_of(&[("XDG_CONFIG_HOME", dir.path())])).unwrap();
        assert_eq!(config.framework.class, "FromXdg");
    }

    #[test]
    fn test_load_with_absent_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = NightshiftConfig::load_with(env_of(&[("HOME", dir.path())])).unwrap();
        assert_eq!(config, NightshiftConfig::default());
    }

    #[test]
    fn test_load_with_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err =
            NightshiftConfig::load_with(env_of(&[(CONFIG_ENV, missing.as_path())])).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_log_level_raised() {
        assert_eq!(LogLevel::Warn.raised(0), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised(1), LogLevel::Info);
        assert_eq!(LogLevel::Warn.raised(2), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.raised(9), LogLevel::Trace);
        assert_eq!(LogLevel::Off.as_str(), "off");
    }
}
