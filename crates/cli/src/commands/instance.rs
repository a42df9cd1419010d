// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup instance` - data directory arbitration, read-only

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use wsup_adapters::is_process_alive;
use wsup_core::instance::candidate_dir;
use wsup_core::{format_utc_ms, InstanceInfo, MAX_INSTANCES};
use wsup_supervisor::instance::{is_locked, read_lock};

use super::load_config;
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, yes_no, OutputFormat};

#[derive(Args)]
pub struct InstanceArgs {
    #[command(subcommand)]
    pub command: InstanceCommand,
}

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// Print the data directory the next `wsup run` would use
    Find {
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },
    /// List existing data directories and their locks
    Status {
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },
}

pub async fn instance(args: InstanceArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        InstanceCommand::Find { base_dir } => find(base_dir, format),
        InstanceCommand::Status { base_dir } => status(base_dir, format),
    }
}

/// First candidate not held by a live process, without creating anything.
pub fn next_free_directory(base: &Path) -> Option<PathBuf> {
    (1..=MAX_INSTANCES).map(|n| candidate_dir(base, n)).find(|dir| !is_locked(dir))
}

fn find(base_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let config = load_config(base_dir)?;
    let Some(dir) = next_free_directory(&config.base_dir) else {
        return Err(ExitError::new(1, format!("too many instances running (max {MAX_INSTANCES})")).into());
    };
    let info = InstanceInfo::for_dir(dir);
    format_or_json(format, &info, || println!("{}", info.data_dir.display()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceEntry {
    pub data_dir: PathBuf,
    pub instance_id: Option<String>,
    pub primary: bool,
    pub pid: Option<u32>,
    pub alive: bool,
    pub locked_at: Option<String>,
}

/// Every existing candidate directory under `base`, in slot order.
pub fn list_instances(base: &Path) -> Vec<InstanceEntry> {
    (1..=MAX_INSTANCES)
        .map(|n| candidate_dir(base, n))
        .filter(|dir| dir.is_dir())
        .map(|dir| {
            let lock = read_lock(&dir);
            let info = InstanceInfo::for_dir(dir);
            InstanceEntry {
                primary: info.is_primary(),
                data_dir: info.data_dir,
                instance_id: info.instance_id,
                pid: lock.map(|l| l.pid),
                alive: lock.is_some_and(|l| is_process_alive(l.pid)),
                locked_at: lock.map(|l| format_utc_ms(l.timestamp)),
            }
        })
        .collect()
}

fn status(base_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let config = load_config(base_dir)?;
    let entries = list_instances(&config.base_dir);
    format_or_json(format, &entries, || {
        if entries.is_empty() {
            println!("No data directories under {}", config.base_dir.display());
            return;
        }
        println!(
            "{}",
            color::header(&format!(
                "{:<16} {:<8} {:<8} {:<6} {}",
                "DIRECTORY", "PRIMARY", "PID", "LIVE", "LOCKED AT"
            ))
        );
        for entry in &entries {
            let name = entry.data_dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let pid = entry.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "{:<16} {:<8} {:<8} {:<6} {}",
                name,
                yes_no(entry.primary),
                pid,
                yes_no(entry.alive),
                entry.locked_at.as_deref().unwrap_or("-")
            );
        }
    })
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
