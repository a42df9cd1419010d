// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod breadcrumbs;
pub mod crash;
pub mod instance;
pub mod run;

use anyhow::Result;
use std::path::PathBuf;
use wsup_adapters::HostPlatform;
use wsup_core::instance::candidate_dir;
use wsup_supervisor::{env, Config, ConfigOverrides};

pub(crate) fn host_platform() -> HostPlatform {
    HostPlatform::new(env::dev_mode())
}

pub(crate) fn load_config(base_dir: Option<PathBuf>) -> Result<Config> {
    let overrides = ConfigOverrides { base_dir, ..Default::default() };
    Ok(Config::load(&host_platform(), overrides)?)
}

/// `--data-dir`, or the primary directory under the configured base.
pub(crate) fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let config = load_config(None)?;
    let dir = data_dir.unwrap_or_else(|| candidate_dir(&config.base_dir, 1));
    Ok((config, dir))
}
