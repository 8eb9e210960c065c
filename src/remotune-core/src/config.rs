//! On-disk configuration: a versioned TOML file under the config directory,
//! with every section optional and validated after loading.

use crate::models::TargetId;
use crate::object::SessionOptions;
use crate::paths::AppDirs;
use crate::router::TargetNotRunningAction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub media_keys: MediaKeysConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            remote: RemoteConfig::default(),
            targets: TargetsConfig::default(),
            media_keys: MediaKeysConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Upper bound for a single remote call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub launch_if_needed: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            launch_if_needed: false,
        }
    }
}

impl From<&RemoteConfig> for SessionOptions {
    fn from(config: &RemoteConfig) -> Self {
        SessionOptions {
            timeout: Duration::from_millis(config.timeout_ms),
            launch_if_needed: config.launch_if_needed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Bundle id tried first when routing media keys.
    #[serde(default)]
    pub preferred: Option<String>,
    /// Bundle ids to register; empty registers every built-in target.
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl TargetsConfig {
    pub fn is_enabled(&self, id: &TargetId) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|enabled| enabled == id.as_str())
    }

    pub fn preferred_id(&self) -> Option<TargetId> {
        self.preferred.as_deref().map(TargetId::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaKeysConfig {
    #[serde(default = "default_media_keys_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub target_not_running: TargetNotRunningAction,
}

impl Default for MediaKeysConfig {
    fn default() -> Self {
        Self {
            enabled: default_media_keys_enabled(),
            target_not_running: TargetNotRunningAction::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    #[serde(default = "default_stdout_enabled")]
    pub stdout: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stdout: default_stdout_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("remote.timeout_ms must be greater than zero")]
    ZeroTimeout,
    #[error("targets.preferred {preferred} is not listed in targets.enabled")]
    PreferredNotEnabled { preferred: String },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_file()
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::from(&self.remote)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        if self.remote.timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        if let Some(preferred) = &self.targets.preferred {
            if !self.targets.is_enabled(&TargetId::from(preferred.as_str())) {
                return Err(ValidationError::PreferredNotEnabled {
                    preferred: preferred.clone(),
                });
            }
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_media_keys_enabled() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_stdout_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.remote.timeout_ms, 5_000);
        assert!(!config.remote.launch_if_needed);
        assert!(config.media_keys.enabled);
        assert_eq!(
            config.media_keys.target_not_running,
            TargetNotRunningAction::Propagate
        );
        assert_eq!(config.logging.max_log_files, 7);
        assert!(config.logging.stdout);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.session_options(), SessionOptions::default());
    }

    #[test]
    fn invalid_version_rejected() {
        let mut config = Config::default();
        config.config_version = CURRENT_CONFIG_VERSION + 1;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = Config::default();
        config.remote.timeout_ms = 0;
        assert_eq!(config.validate(), Err(ValidationError::ZeroTimeout));
    }

    #[test]
    fn preferred_must_be_enabled() {
        let mut config = Config::default();
        config.targets.preferred = Some("com.spotify.client".into());
        assert!(config.validate().is_ok());

        config.targets.enabled = vec!["com.apple.Music".into()];
        assert!(matches!(
            config.validate(),
            Err(ValidationError::PreferredNotEnabled { .. })
        ));
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
config_version = 1

[remote]
timeout_ms = 1500

[targets]
preferred = "com.apple.Music"

[media_keys]
target_not_running = "launch_target"
"#,
        )
        .expect("write config");

        let config = Config::load_from(&path).expect("config loads");
        assert_eq!(config.session_options().timeout, Duration::from_millis(1500));
        assert_eq!(config.targets.preferred_id(), Some(TargetId::from("com.apple.Music")));
        assert!(config.targets.is_enabled(&TargetId::from("org.cogx.cog")));
        assert_eq!(
            config.media_keys.target_not_running,
            TargetNotRunningAction::LaunchTarget
        );
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn missing_file_yields_defaults_and_creates_dirs() {
        let root = tempfile::tempdir().expect("tempdir");
        let dirs = AppDirs::rooted_at(root.path());
        let config = Config::load_or_default(&dirs).expect("defaults");
        assert_eq!(config.remote.timeout_ms, 5_000);
        assert!(dirs.config_dir().is_dir());
        assert!(!Config::config_path(&dirs).exists());
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "config_version = \"one\"").expect("write config");
        match Config::load_from(&path) {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
