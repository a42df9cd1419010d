// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host platform information: OS, architecture and well-known directories.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("could not determine the platform {0} directory")]
    NoDirectory(&'static str),
}

/// Platform information provider
pub trait Platform: Clone + Send + Sync + 'static {
    /// OS name, e.g. `linux`, `macos`, `windows`
    fn os_name(&self) -> String;

    /// CPU architecture, e.g. `x86_64`, `aarch64`
    fn arch(&self) -> String;

    /// Directory holding the `wave-data*` instance directories
    fn base_dir(&self) -> Result<PathBuf, PlatformError>;

    /// Shared configuration directory
    fn config_dir(&self) -> Result<PathBuf, PlatformError>;

    /// Desktop session name forwarded to the backend (Linux only)
    fn desktop_session(&self) -> Option<String>;
}

/// The real host, resolved through the `dirs` crate.
#[derive(Clone, Debug)]
pub struct HostPlatform {
    app_dir_name: String,
}

impl HostPlatform {
    /// `dev` selects the `waveterm-dev` directories so development builds
    /// never touch release data.
    pub fn new(dev: bool) -> Self {
        let app_dir_name = if dev { "waveterm-dev" } else { "waveterm" };
        Self { app_dir_name: app_dir_name.to_string() }
    }

    pub fn app_dir_name(&self) -> &str {
        &self.app_dir_name
    }
}

impl Platform for HostPlatform {
    fn os_name(&self) -> String {
        std::env::consts::OS.to_string()
    }

    fn arch(&self) -> String {
        std::env::consts::ARCH.to_string()
    }

    fn base_dir(&self) -> Result<PathBuf, PlatformError> {
        dirs::data_dir()
            .map(|d| d.join(&self.app_dir_name))
            .ok_or(PlatformError::NoDirectory("data"))
    }

    fn config_dir(&self) -> Result<PathBuf, PlatformError> {
        dirs::config_dir()
            .map(|d| d.join(&self.app_dir_name))
            .ok_or(PlatformError::NoDirectory("config"))
    }

    fn desktop_session(&self) -> Option<String> {
        if cfg!(target_os = "linux") {
            std::env::var("XDG_CURRENT_DESKTOP").ok().filter(|s| !s.is_empty())
        } else {
            None
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Platform, PlatformError};
    use std::path::PathBuf;

    /// Fixed platform rooted at a test directory
    #[derive(Clone, Debug)]
    pub struct FakePlatform {
        pub root: PathBuf,
        pub desktop: Option<String>,
    }

    impl FakePlatform {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into(), desktop: None }
        }
    }

    impl Platform for FakePlatform {
        fn os_name(&self) -> String {
            "testos".to_string()
        }

        fn arch(&self) -> String {
            "testarch".to_string()
        }

        fn base_dir(&self) -> Result<PathBuf, PlatformError> {
            Ok(self.root.join("data"))
        }

        fn config_dir(&self) -> Result<PathBuf, PlatformError> {
            Ok(self.root.join("config"))
        }

        fn desktop_session(&self) -> Option<String> {
            self.desktop.clone()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePlatform;

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
