// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolved supervisor configuration.
//!
//! Precedence for every knob: command-line override, then environment
//! variable, then `<config-dir>/supervisor.toml`, then the built-in default.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wsup_adapters::{Platform, PlatformError};

use crate::env;

/// Name of the optional configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "supervisor.toml";

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_HEARTBEAT_STALE_AFTER: Duration = Duration::from_millis(30_000);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(60);

/// Backend executable name looked up next to the supervisor binary.
#[cfg(windows)]
pub const BACKEND_EXE_NAME: &str = "wavesrv.exe";
#[cfg(not(windows))]
pub const BACKEND_EXE_NAME: &str = "wavesrv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid config file {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("cannot locate the supervisor executable: {0}")]
    SelfExe(std::io::Error),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Values given on the command line; each wins over env and file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_dir: Option<PathBuf>,
    pub backend_path: Option<PathBuf>,
    pub backend_cwd: Option<PathBuf>,
}

/// Contents of `supervisor.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub backend_path: Option<PathBuf>,
    #[serde(default)]
    pub backend_args: Vec<String>,
    pub backend_cwd: Option<PathBuf>,
    pub handshake_timeout_ms: Option<u64>,
    pub heartbeat_interval_ms: Option<u64>,
    #[serde(default)]
    pub extra_env: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Read the file if present. A missing file is the empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// How to launch the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPaths {
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// `None` runs the backend inside the selected data directory
    pub cwd: Option<PathBuf>,
    /// Directory holding the unpacked application files
    pub app_path: PathBuf,
    /// This executable, for self-relaunch by the backend
    pub self_exe: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
    pub backend: BackendPaths,
    pub heartbeat_interval: Duration,
    pub heartbeat_stale_after: Duration,
    /// `None` waits for the handshake indefinitely
    pub handshake_timeout: Option<Duration>,
    pub extra_env: BTreeMap<String, String>,
}

impl Config {
    pub fn load(platform: &impl Platform, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let config_dir = match env::config_dir() {
            Some(dir) => dir,
            None => platform.config_dir()?,
        };
        let file = ConfigFile::load(&config_dir.join(CONFIG_FILE_NAME))?;

        let base_dir = match overrides.base_dir.or_else(env::base_dir) {
            Some(dir) => dir,
            None => platform.base_dir()?,
        };

        let self_exe = std::env::current_exe().map_err(ConfigError::SelfExe)?;
        let app_path = self_exe.parent().map(Path::to_path_buf).unwrap_or_default();
        let executable = overrides
            .backend_path
            .or_else(env::backend_path)
            .or(file.backend_path)
            .unwrap_or_else(|| app_path.join(BACKEND_EXE_NAME));
        let cwd = overrides.backend_cwd.or_else(env::backend_cwd).or(file.backend_cwd);

        let heartbeat_interval = env::heartbeat_interval()
            .or(file.heartbeat_interval_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);
        let heartbeat_stale_after =
            env::heartbeat_stale_after().unwrap_or(DEFAULT_HEARTBEAT_STALE_AFTER);
        if heartbeat_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("heartbeat interval"));
        }
        if heartbeat_stale_after.is_zero() {
            return Err(ConfigError::ZeroDuration("heartbeat staleness threshold"));
        }
        let handshake_timeout = env::handshake_timeout()
            .or(file.handshake_timeout_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT);

        Ok(Self {
            base_dir,
            config_dir,
            backend: BackendPaths { executable, args: file.backend_args, cwd, app_path, self_exe },
            heartbeat_interval,
            heartbeat_stale_after,
            handshake_timeout: (!handshake_timeout.is_zero()).then_some(handshake_timeout),
            extra_env: file.extra_env,
        })
    }
}

/// Well-known files inside a selected data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn heartbeat(&self) -> PathBuf {
        self.data_dir.join("heartbeat.json")
    }

    pub fn breadcrumbs(&self) -> PathBuf {
        self.data_dir.join("crash-breadcrumbs.json")
    }

    /// Default crash-dump directory
    pub fn crashpad(&self) -> PathBuf {
        self.data_dir.join("Crashpad")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("wsup.log")
    }

    pub fn crash_report(&self) -> PathBuf {
        self.data_dir.join("crash-report.txt")
    }

    pub fn fatal_report(&self) -> PathBuf {
        self.data_dir.join("fatal-error-report.txt")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
