// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment injected into the backend process.

use std::collections::BTreeMap;
use std::path::PathBuf;

pub const AUTH_KEY_VAR: &str = "WAVETERM_AUTH_KEY";
pub const DATA_HOME_VAR: &str = "WAVETERM_DATA_HOME";
pub const CONFIG_HOME_VAR: &str = "WAVETERM_CONFIG_HOME";
pub const APP_PATH_VAR: &str = "WAVETERM_APP_PATH";
pub const SELF_EXE_VAR: &str = "WAVETERM_ELECTRONEXECPATH";
pub const DESKTOP_SESSION_VAR: &str = "XDG_CURRENT_DESKTOP";

/// Published once the backend completes its handshake.
pub const WS_ENDPOINT_VAR: &str = "WAVE_SERVER_WS_ENDPOINT";
pub const WEB_ENDPOINT_VAR: &str = "WAVE_SERVER_WEB_ENDPOINT";

/// Values the backend needs to find its data and call back into the app.
#[derive(Debug, Clone)]
pub struct BackendEnv {
    pub auth_key: String,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub app_path: PathBuf,
    pub self_exe: PathBuf,
    pub desktop_session: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl BackendEnv {
    /// A fresh random auth key for this run.
    pub fn new_auth_key() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Variables layered over the inherited environment. Configured extras
    /// never replace the core variables.
    pub fn vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.extra.clone();
        vars.insert(AUTH_KEY_VAR.to_string(), self.auth_key.clone());
        vars.insert(DATA_HOME_VAR.to_string(), self.data_dir.display().to_string());
        vars.insert(CONFIG_HOME_VAR.to_string(), self.config_dir.display().to_string());
        vars.insert(APP_PATH_VAR.to_string(), self.app_path.display().to_string());
        vars.insert(SELF_EXE_VAR.to_string(), self.self_exe.display().to_string());
        if let Some(session) = &self.desktop_session {
            vars.insert(DESKTOP_SESSION_VAR.to_string(), session.clone());
        }
        vars
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
