// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup run` - supervise the backend until shutdown or backend death

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use wsup_adapters::{DialogRouter, Platform};
use wsup_core::{Clock, SystemClock};
use wsup_supervisor::{
    claim_data_directory, show_fatal_dialog, Config, ConfigOverrides, DataPaths, FatalContext,
    FatalReport, LifecycleError, Outcome, Session, SupervisorError, Termination,
};

use super::host_platform;
use crate::exit_error::ExitError;
use crate::logging::Logging;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory holding the wave-data* instance directories
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Backend executable
    #[arg(long)]
    pub backend: Option<PathBuf>,

    /// Backend working directory (default: the selected data directory)
    #[arg(long)]
    pub backend_cwd: Option<PathBuf>,

    /// Answer every dialog with its default instead of showing it
    #[arg(long)]
    pub headless: bool,
}

pub async fn run(args: RunArgs, logging: &mut Logging) -> Result<()> {
    let platform = host_platform();
    let dialog = DialogRouter::new(args.headless);
    let overrides = ConfigOverrides {
        base_dir: args.base_dir,
        backend_path: args.backend,
        backend_cwd: args.backend_cwd,
    };

    let config = match Config::load(&platform, overrides) {
        Ok(config) => config,
        Err(e) => {
            let ctx = host_context(&platform);
            let err = LifecycleError::from(e);
            report_fatal(&dialog, &err, &ctx, &std::env::temp_dir()).await;
            return Err(ExitError::new(1, err.to_string()).into());
        }
    };

    let instance = match claim_data_directory(&config, &SystemClock) {
        Ok(instance) => instance,
        Err(e) => {
            let ctx = FatalContext {
                config_dir: Some(config.config_dir.clone()),
                ..host_context(&platform)
            };
            report_fatal(&dialog, &e, &ctx, &config.base_dir).await;
            return Err(ExitError::new(1, e.to_string()).into());
        }
    };
    logging.attach_file(&DataPaths::new(instance.data_dir.clone()).log_file());

    let mut session = Session::open(config, instance, &platform, dialog, SystemClock).await;

    if let Err(e) = session.start_backend().await {
        if session.lost_instance_race() {
            tracing::warn!(error = %e, "another instance holds the data directory");
        } else {
            report_fatal(session.dialog(), &e, &session.fatal_context(), &session.paths.data_dir).await;
        }
        session.shutdown(&Outcome::Shutdown).await;
        return Err(ExitError::new(1, e.to_string()).into());
    }

    let outcome = session.run_until(shutdown_signal()).await;
    if let Outcome::BackendDied(Termination::InvalidHandshake { line, error }) = &outcome {
        tracing::error!(line = %line, "backend sent an invalid handshake");
        let err = LifecycleError::from(SupervisorError::InvalidHandshake(error.clone()));
        report_fatal(session.dialog(), &err, &session.fatal_context(), &session.paths.data_dir).await;
    } else if let Outcome::BackendDied(t) = &outcome {
        tracing::error!(reason = %t, "backend terminated, shutting down");
    }

    let code = outcome.exit_code();
    session.shutdown(&outcome).await;
    if code != 0 {
        return Err(ExitError::silent(code).into());
    }
    Ok(())
}

fn host_context(platform: &impl Platform) -> FatalContext {
    FatalContext {
        platform: platform.os_name(),
        arch: platform.arch(),
        config_dir: platform.config_dir().ok(),
        ..Default::default()
    }
}

/// Show the fatal error dialog. The report is saved under `report_dir` if
/// the user asks for it.
async fn report_fatal(
    dialog: &DialogRouter,
    error: &LifecycleError,
    ctx: &FatalContext,
    report_dir: &Path,
) {
    let report = FatalReport::generate(error.name(), error, ctx, SystemClock.epoch_ms());
    let report_path = DataPaths::new(report_dir.to_path_buf()).fatal_report();
    show_fatal_dialog(dialog, &report, &report_path).await;
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "failed to install SIGTERM handler"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
