// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend supervisor: spawns the backend server, reads its line protocol,
//! and reports its death.
//!
//! The backend is never respawned. Its exit ends the session unless an update
//! install is in progress or the supervisor itself asked it to stop.

mod env;
mod exit;
mod reader;

pub use env::{
    BackendEnv, APP_PATH_VAR, AUTH_KEY_VAR, CONFIG_HOME_VAR, DATA_HOME_VAR, DESKTOP_SESSION_VAR,
    SELF_EXE_VAR, WEB_ENDPOINT_VAR, WS_ENDPOINT_VAR,
};
pub use exit::{multi_instance_prompt, DOCS_URL, MULTI_INSTANCE_TITLE};
pub use reader::BACKEND_LOG_TARGET;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wsup_adapters::DialogAdapter;
use wsup_core::{Handshake, ProtocolError};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn backend {}: {source}", path.display())]
    Spawn { path: PathBuf, source: std::io::Error },

    #[error("backend already started")]
    AlreadyStarted,

    #[error("backend did not complete its handshake within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("invalid backend handshake: {0}")]
    InvalidHandshake(ProtocolError),

    #[error("backend exited before completing its handshake")]
    ReadyChannelClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendState {
    NotStarted,
    Spawning,
    Running,
    Exited,
}

wsup_core::simple_display! {
    BackendState {
        NotStarted => "not-started",
        Spawning => "spawning",
        Running => "running",
        Exited => "exited",
    }
}

/// Snapshot of the backend handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub state: BackendState,
    pub pid: Option<u32>,
    pub is_dead: bool,
    /// `unknown` until the handshake arrives
    pub version: String,
    /// Epoch seconds, 0 until the handshake arrives
    pub build_time: u64,
    /// Sticky once the backend reports a data-lock conflict
    pub lock_error: bool,
    pub exit_code: Option<i32>,
    pub ws_endpoint: Option<String>,
    pub web_endpoint: Option<String>,
}

impl BackendStatus {
    /// Endpoint variables for processes launched alongside the backend, empty
    /// until the handshake arrives.
    pub fn endpoint_vars(&self) -> Vec<(&'static str, String)> {
        [(WS_ENDPOINT_VAR, &self.ws_endpoint), (WEB_ENDPOINT_VAR, &self.web_endpoint)]
            .into_iter()
            .filter_map(|(var, value)| Some((var, value.clone()?)))
            .collect()
    }
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self {
            state: BackendState::NotStarted,
            pid: None,
            is_dead: false,
            version: "unknown".to_string(),
            build_time: 0,
            lock_error: false,
            exit_code: None,
            ws_endpoint: None,
            web_endpoint: None,
        }
    }
}

/// Handshake progress, observed by [`RunningBackend::wait_ready`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready(Handshake),
    Invalid(ProtocolError),
    Exited,
}

/// Why the session must end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    BackendExited { code: Option<i32>, lock_conflict: bool },
    InvalidHandshake { line: String, error: ProtocolError },
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::BackendExited { code: Some(code), .. } => {
                write!(f, "backend exited with code {code}")
            }
            Termination::BackendExited { code: None, .. } => write!(f, "backend killed by signal"),
            Termination::InvalidHandshake { error, .. } => write!(f, "invalid backend handshake: {error}"),
        }
    }
}

/// Set while an update is being installed; backend exits are then expected.
#[derive(Debug, Clone, Default)]
pub struct UpdateGate(Arc<AtomicBool>);

impl UpdateGate {
    pub fn set_installing(&self, installing: bool) {
        self.0.store(installing, Ordering::SeqCst);
    }

    pub fn is_installing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives each parsed backend event.
pub type EventCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// State shared between the reader tasks, the exit watcher and the owner.
pub(crate) struct Shared {
    status: Mutex<BackendStatus>,
    ready_tx: watch::Sender<Readiness>,
    term_tx: mpsc::UnboundedSender<Termination>,
    on_event: EventCallback,
    update: UpdateGate,
    stopping: AtomicBool,
}

/// Everything needed to launch the backend.
#[derive(Debug, Clone)]
pub struct BackendCommand {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BackendEnv,
}

pub struct BackendSupervisor<D: DialogAdapter> {
    command: BackendCommand,
    dialog: D,
    update: UpdateGate,
    handshake_timeout: Option<Duration>,
    started: AtomicBool,
}

impl<D: DialogAdapter> BackendSupervisor<D> {
    /// `handshake_timeout` of `None` waits for the handshake indefinitely.
    pub fn new(
        command: BackendCommand,
        dialog: D,
        update: UpdateGate,
        handshake_timeout: Option<Duration>,
    ) -> Self {
        Self { command, dialog, update, handshake_timeout, started: AtomicBool::new(false) }
    }

    /// Spawn the backend. `Ok` means the process started; use
    /// [`RunningBackend::wait_ready`] for the authoritative handshake.
    ///
    /// Must be called inside a tokio runtime. A supervisor runs at most one
    /// backend in its lifetime.
    pub fn run(
        &self,
        on_event: impl Fn(Value) + Send + Sync + 'static,
    ) -> Result<RunningBackend, SupervisorError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SupervisorError::AlreadyStarted);
        }

        let (ready_tx, ready_rx) = watch::channel(Readiness::Pending);
        let (term_tx, term_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            status: Mutex::new(BackendStatus { state: BackendState::Spawning, ..Default::default() }),
            ready_tx,
            term_tx,
            on_event: Arc::new(on_event),
            update: self.update.clone(),
            stopping: AtomicBool::new(false),
        });

        let executable = &self.command.executable;
        tracing::info!(
            path = %executable.display(),
            cwd = %self.command.cwd.display(),
            "spawning backend"
        );
        let mut child = Command::new(executable)
            .args(&self.command.args)
            .current_dir(&self.command.cwd)
            .envs(self.command.env.vars())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                let mut status = shared.status.lock();
                status.state = BackendState::Exited;
                status.is_dead = true;
                SupervisorError::Spawn { path: executable.clone(), source }
            })?;

        let pid = child.id();
        {
            let mut status = shared.status.lock();
            status.state = BackendState::Running;
            status.pid = pid;
        }
        tracing::info!(pid, "backend spawned");

        let stdin = child.stdin.take();
        let stdout_task = child.stdout.take().map(reader::spawn_stdout_reader);
        let stderr_task = child.stderr.take().map(|s| reader::spawn_stderr_reader(s, Arc::clone(&shared)));

        let kill = CancellationToken::new();
        let exit_task = exit::spawn_exit_watcher(
            child,
            stdout_task,
            stderr_task,
            Arc::clone(&shared),
            self.dialog.clone(),
            kill.clone(),
        );

        Ok(RunningBackend {
            shared,
            ready_rx,
            term_rx,
            stdin,
            kill,
            exit_task: Some(exit_task),
            handshake_timeout: self.handshake_timeout,
        })
    }
}

/// Handle to a spawned backend, owned by the lifecycle.
pub struct RunningBackend {
    shared: Arc<Shared>,
    ready_rx: watch::Receiver<Readiness>,
    term_rx: mpsc::UnboundedReceiver<Termination>,
    stdin: Option<ChildStdin>,
    kill: CancellationToken,
    exit_task: Option<JoinHandle<()>>,
    handshake_timeout: Option<Duration>,
}

impl RunningBackend {
    pub fn pid(&self) -> Option<u32> {
        self.shared.status.lock().pid
    }

    pub fn status(&self) -> BackendStatus {
        self.shared.status.lock().clone()
    }

    /// Wait for the handshake, bounded by the configured timeout.
    pub async fn wait_ready(&mut self) -> Result<Handshake, SupervisorError> {
        let wait = self.ready_rx.wait_for(|r| !matches!(r, Readiness::Pending));
        let readiness = match self.handshake_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| SupervisorError::HandshakeTimeout(limit))?,
            None => wait.await,
        }
        .map_err(|_| SupervisorError::ReadyChannelClosed)?
        .clone();

        match readiness {
            Readiness::Ready(handshake) => Ok(handshake),
            Readiness::Invalid(e) => Err(SupervisorError::InvalidHandshake(e)),
            Readiness::Pending | Readiness::Exited => Err(SupervisorError::ReadyChannelClosed),
        }
    }

    /// Wait until the session must end.
    pub async fn terminated(&mut self) -> Option<Termination> {
        self.term_rx.recv().await
    }

    /// Stop the backend: close its stdin, give it `grace` to exit, then kill
    /// it. The resulting exit is expected and raises no termination.
    pub async fn shutdown(mut self, grace: Duration) -> BackendStatus {
        self.shared.stopping.store(true, Ordering::SeqCst);
        drop(self.stdin.take());

        if let Some(mut task) = self.exit_task.take() {
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                tracing::warn!(grace_ms = grace.as_millis() as u64, "backend did not exit, killing");
                self.kill.cancel();
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "backend exit watcher failed");
                }
            }
        }
        self.status()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
