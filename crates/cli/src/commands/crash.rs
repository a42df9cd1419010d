// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup crash` - inspect and clear the previous run's crash evidence

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use wsup_core::SystemClock;
use wsup_supervisor::crash_reporter::read_dump;
use wsup_supervisor::recovery::format_recovery_report;
use wsup_supervisor::{env, BreadcrumbRecorder, Config, CrashDetector, DataPaths, HeartbeatMonitor};

use super::resolve_data_dir;
use crate::color;
use crate::output::{field, format_or_json, OutputFormat};

#[derive(Args)]
pub struct CrashArgs {
    #[command(subcommand)]
    pub command: CrashCommand,
}

#[derive(Subcommand)]
pub enum CrashCommand {
    /// Check whether the previous run crashed
    Check {
        /// Data directory to inspect (default: the primary)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Delete crash dumps and breadcrumbs
    Clear {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Decode a crash dump file
    Show {
        /// Path to a `.dmp` file
        dump: PathBuf,
    },
}

pub async fn crash(args: CrashArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        CrashCommand::Check { data_dir } => check(data_dir, format),
        CrashCommand::Clear { data_dir } => clear(data_dir, format),
        CrashCommand::Show { dump } => show(dump, format),
    }
}

/// Read-only view of a data directory's crash evidence.
struct Evidence {
    heartbeat: HeartbeatMonitor,
    breadcrumbs: BreadcrumbRecorder,
    crashes_dir: PathBuf,
}

impl Evidence {
    fn open(config: &Config, data_dir: PathBuf) -> Self {
        let paths = DataPaths::new(data_dir);
        Self {
            heartbeat: HeartbeatMonitor::new(
                paths.heartbeat(),
                SystemClock,
                config.heartbeat_interval,
                config.heartbeat_stale_after,
                env::SUPERVISOR_VERSION,
            ),
            breadcrumbs: BreadcrumbRecorder::new(paths.breadcrumbs(), SystemClock),
            crashes_dir: paths.crashpad(),
        }
    }

    fn detector(&self) -> CrashDetector<'_, SystemClock> {
        CrashDetector::new(&self.heartbeat, &self.breadcrumbs, self.crashes_dir.clone())
    }
}

fn check(data_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let (config, data_dir) = resolve_data_dir(data_dir)?;
    let evidence = Evidence::open(&config, data_dir.clone());
    let verdict = evidence.detector().check_for_previous_crash();

    let obj = serde_json::json!({
        "dataDir": data_dir,
        "crashed": verdict.is_some(),
        "verdict": verdict,
    });
    format_or_json(format, &obj, || match &verdict {
        Some(verdict) => {
            println!("{}", color::alert("Previous run crashed"));
            println!("{}", format_recovery_report(verdict));
        }
        None => println!("No crash detected in {}", data_dir.display()),
    })
}

fn clear(data_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let (config, data_dir) = resolve_data_dir(data_dir)?;
    let evidence = Evidence::open(&config, data_dir);
    let detector = evidence.detector();
    let verdict = detector.check_for_previous_crash().unwrap_or_default();
    let summary = detector.clear_crash_data(&verdict);

    let obj = serde_json::json!({
        "deleted": summary.deleted,
        "failed": summary.failed,
    });
    format_or_json(format, &obj, || {
        println!("Deleted {} crash dump(s), cleared breadcrumbs", summary.deleted.len());
        for path in &summary.failed {
            println!("Could not delete {}", path.display());
        }
    })
}

fn show(dump: PathBuf, format: OutputFormat) -> Result<()> {
    let dump = read_dump(&dump)?;
    format_or_json(format, &dump, || {
        println!("{}", color::header(&format!("{} crash", dump.product_name)));
        println!("{}", field("Time", &dump.timestamp, 9));
        println!("{}", field("PID", dump.pid, 9));
        println!("{}", field("Thread", dump.thread.as_deref().unwrap_or("unknown"), 9));
        println!("{}", field("Message", &dump.message, 9));
        println!("{}", field("Location", dump.location.as_deref().unwrap_or("unknown"), 9));
        for (key, value) in &dump.extra {
            println!("{}", field(key, value, 9));
        }
        if !dump.backtrace.is_empty() {
            println!("\n{}", dump.backtrace);
        }
    })
}
