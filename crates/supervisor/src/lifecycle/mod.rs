// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor lifecycle: cold start, the supervised session, and shutdown.

mod startup;
pub use startup::claim_data_directory;

use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use wsup_adapters::DialogAdapter;
use wsup_core::{Clock, InstanceInfo, SystemClock};

use crate::backend::{BackendStatus, RunningBackend, SupervisorError, Termination, UpdateGate};
use crate::breadcrumbs::BreadcrumbRecorder;
use crate::config::{Config, ConfigError, DataPaths};
use crate::crash_reporter::CrashReporter;
use crate::fatal_report::FatalContext;
use crate::heartbeat::HeartbeatMonitor;
use crate::instance::{self, InstanceError};
use crate::recovery::RecoveryAction;

/// How long the backend gets to exit after its stdin closes.
pub const BACKEND_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LifecycleError {
    /// Short name used as the error title in fatal reports.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleError::Config(_) => "ConfigError",
            LifecycleError::Instance(_) => "InstanceError",
            LifecycleError::Supervisor(_) => "SupervisorError",
            LifecycleError::Io(_) => "IoError",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Shutdown was requested (e.g. Ctrl-C)
    Shutdown,
    BackendDied(Termination),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Shutdown => 0,
            Outcome::BackendDied(_) => 1,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Shutdown => f.write_str("shutdown requested"),
            Outcome::BackendDied(t) => write!(f, "{t}"),
        }
    }
}

/// Host facts captured once at startup.
#[derive(Debug, Clone, Default)]
pub struct HostInfo {
    pub platform: String,
    pub arch: String,
    pub desktop_session: Option<String>,
}

/// One supervised run, from a claimed data directory to shutdown.
pub struct Session<D: DialogAdapter, C: Clock = SystemClock> {
    pub config: Config,
    pub paths: DataPaths,
    pub instance: InstanceInfo,
    pub host: HostInfo,
    pub recorder: Arc<BreadcrumbRecorder<C>>,
    pub heartbeat: HeartbeatMonitor<C>,
    pub reporter: CrashReporter,
    pub update: UpdateGate,
    /// The user's answer to the recovery prompt, if one was shown
    pub recovery: Option<RecoveryAction>,
    dialog: D,
    clock: C,
    started_at: Instant,
    backend: Option<RunningBackend>,
}

impl<D: DialogAdapter, C: Clock> Session<D, C> {
    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    pub fn backend_status(&self) -> Option<BackendStatus> {
        self.backend.as_ref().map(RunningBackend::status)
    }

    /// Whether the backend reported that another instance holds its data
    /// lock. The user has already seen the multi-instance dialog by the time
    /// the backend's death is observed.
    pub fn lost_instance_race(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.status().lock_error)
    }

    /// Wait for the backend to die or for `shutdown` to resolve.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> Outcome {
        let Some(backend) = self.backend.as_mut() else {
            shutdown.await;
            return Outcome::Shutdown;
        };
        tokio::select! {
            termination = backend.terminated() => match termination {
                Some(t) => Outcome::BackendDied(t),
                None => Outcome::Shutdown,
            },
            _ = shutdown => Outcome::Shutdown,
        }
    }

    /// Orderly teardown: stop the backend, write the clean-exit heartbeat and
    /// release the data directory.
    pub async fn shutdown(mut self, outcome: &Outcome) {
        tracing::info!(reason = %outcome, "shutting down");
        self.recorder.record("shutdown", json!({ "reason": outcome.to_string() }));
        if let Some(backend) = self.backend.take() {
            backend.shutdown(BACKEND_SHUTDOWN_GRACE).await;
        }
        self.heartbeat.stop().await;
        instance::release_lock(&self.paths.data_dir);
    }

    /// Context for a fatal error report about this session.
    pub fn fatal_context(&self) -> FatalContext {
        let backend = self.backend_status().filter(|s| s.build_time > 0);
        FatalContext {
            platform: self.host.platform.clone(),
            arch: self.host.arch.clone(),
            backend_version: backend.as_ref().map(|s| s.version.clone()),
            backend_build_time: backend.as_ref().map(|s| s.build_time),
            data_dir: Some(self.paths.data_dir.clone()),
            config_dir: Some(self.config.config_dir.clone()),
            instance_id: self.instance.instance_id.clone(),
            uptime: self.clock.now().saturating_duration_since(self.started_at),
            log_file: Some(self.paths.log_file()),
            breadcrumbs: self.recorder.get_all(),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
