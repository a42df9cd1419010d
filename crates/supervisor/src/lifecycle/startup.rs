// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cold start: claim a data directory, look for a previous crash, start the
//! heartbeat and bring up the backend.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use wsup_adapters::{DialogAdapter, Platform};
use wsup_core::{Clock, Handshake, InstanceInfo};

use super::{HostInfo, LifecycleError, Session};
use crate::backend::{BackendCommand, BackendEnv, BackendSupervisor, UpdateGate};
use crate::breadcrumbs::BreadcrumbRecorder;
use crate::config::{Config, DataPaths};
use crate::crash_detector::CrashDetector;
use crate::crash_reporter::{CrashReporter, CrashReporterOptions};
use crate::env::SUPERVISOR_VERSION;
use crate::heartbeat::HeartbeatMonitor;
use crate::instance;
use crate::recovery::RecoveryPrompt;

/// Pick a free data directory under the configured base and lock it.
pub fn claim_data_directory(
    config: &Config,
    clock: &impl Clock,
) -> Result<InstanceInfo, LifecycleError> {
    let data_dir = instance::find_available_data_directory(&config.base_dir)?;
    instance::acquire_lock(&data_dir, clock)?;
    let info = InstanceInfo::for_dir(data_dir);
    info!(
        path = %info.data_dir.display(),
        instance = info.instance_id.as_deref().unwrap_or("primary"),
        "claimed data directory"
    );
    Ok(info)
}

impl<D: DialogAdapter, C: Clock> Session<D, C> {
    /// Bring up crash handling for a claimed directory. Nothing here is
    /// fatal: evidence that cannot be read or written is logged and skipped.
    ///
    /// The previous run's evidence is inspected before this run's heartbeat
    /// starts, since the first tick overwrites it.
    pub async fn open(
        config: Config,
        instance: InstanceInfo,
        platform: &impl Platform,
        dialog: D,
        clock: C,
    ) -> Self {
        let started_at = clock.now();
        let paths = DataPaths::new(instance.data_dir.clone());
        let host = HostInfo {
            platform: platform.os_name(),
            arch: platform.arch(),
            desktop_session: platform.desktop_session(),
        };

        let reporter = CrashReporter::new(paths.crashpad());
        let mut options = CrashReporterOptions::default();
        options.extra.insert("version".to_string(), SUPERVISOR_VERSION.to_string());
        options.extra.insert("platform".to_string(), host.platform.clone());
        options.extra.insert("arch".to_string(), host.arch.clone());
        if let Some(id) = &instance.instance_id {
            options.extra.insert("instanceId".to_string(), id.clone());
        }
        reporter.init(paths.crashpad(), options);

        let recorder = Arc::new(BreadcrumbRecorder::new(paths.breadcrumbs(), clock.clone()));
        let heartbeat = HeartbeatMonitor::new(
            paths.heartbeat(),
            clock.clone(),
            config.heartbeat_interval,
            config.heartbeat_stale_after,
            SUPERVISOR_VERSION,
        );

        let recovery = {
            let detector =
                CrashDetector::new(&heartbeat, &recorder, reporter.crashes_directory());
            match detector.check_for_previous_crash() {
                Some(verdict) => {
                    warn!(
                        kind = %verdict.kind,
                        dumps = verdict.crash_dumps.len(),
                        breadcrumbs = verdict.breadcrumbs.len(),
                        "previous run crashed"
                    );
                    let prompt = RecoveryPrompt::new(dialog.clone(), paths.crash_report());
                    Some(prompt.present(&verdict, &detector).await)
                }
                None => None,
            }
        };

        heartbeat.start();
        recorder.record(
            "app-start",
            json!({
                "version": SUPERVISOR_VERSION,
                "platform": host.platform,
                "arch": host.arch,
                "instanceId": instance.instance_id,
                "crashReporter": reporter.status(),
            }),
        );

        Self {
            config,
            paths,
            instance,
            host,
            recorder,
            heartbeat,
            reporter,
            update: UpdateGate::default(),
            recovery,
            dialog,
            clock,
            started_at,
            backend: None,
        }
    }

    /// Spawn the backend and wait for its handshake.
    ///
    /// On failure the backend handle is kept so [`Session::fatal_context`]
    /// can still report on it; [`Session::shutdown`] reaps it.
    pub async fn start_backend(&mut self) -> Result<Handshake, LifecycleError> {
        let backend = &self.config.backend;
        let command = BackendCommand {
            executable: backend.executable.clone(),
            args: backend.args.clone(),
            cwd: backend.cwd.clone().unwrap_or_else(|| self.paths.data_dir.clone()),
            env: BackendEnv {
                auth_key: BackendEnv::new_auth_key(),
                data_dir: self.paths.data_dir.clone(),
                config_dir: self.config.config_dir.clone(),
                app_path: backend.app_path.clone(),
                self_exe: backend.self_exe.clone(),
                desktop_session: self.host.desktop_session.clone(),
                extra: self.config.extra_env.clone(),
            },
        };
        let supervisor = BackendSupervisor::new(
            command,
            self.dialog.clone(),
            self.update.clone(),
            self.config.handshake_timeout,
        );

        let recorder = Arc::clone(&self.recorder);
        let running = supervisor.run(move |event: Value| {
            let kind = event
                .get("eventtype")
                .and_then(Value::as_str)
                .unwrap_or("backend-event")
                .to_string();
            recorder.record(kind, event);
        })?;
        let backend = self.backend.insert(running);

        let handshake = backend.wait_ready().await?;
        info!(
            version = %handshake.version,
            ws = %handshake.ws_endpoint,
            web = %handshake.web_endpoint,
            "backend ready"
        );
        let endpoints: serde_json::Map<String, Value> = backend
            .status()
            .endpoint_vars()
            .into_iter()
            .map(|(var, value)| (var.to_string(), Value::String(value)))
            .collect();
        self.recorder.record(
            "backend-ready",
            json!({ "version": handshake.version, "pid": backend.pid(), "endpoints": endpoints }),
        );
        Ok(handshake)
    }
}
