// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend exit handling.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wsup_adapters::{ChoicePrompt, DialogAdapter, DialogKind};

use super::{BackendState, Readiness, Shared, Termination};

pub const MULTI_INSTANCE_TITLE: &str = "Wave is Already Running";
pub const DOCS_URL: &str = "https://docs.waveterm.dev/";

/// How long to let the readers drain after the process exits, so a lock
/// conflict printed just before exit is seen.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) fn spawn_exit_watcher<D: DialogAdapter>(
    mut child: Child,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
    dialog: D,
    kill: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let status = tokio::select! {
            status = child.wait() => status,
            _ = kill.cancelled() => {
                if let Err(e) = child.start_kill() {
                    tracing::warn!(error = %e, "failed to kill backend");
                }
                child.wait().await
            }
        };

        for (stream, task) in [("stdout", stdout_task), ("stderr", stderr_task)] {
            let Some(task) = task else { continue };
            if tokio::time::timeout(DRAIN_TIMEOUT, task).await.is_err() {
                tracing::debug!(
                    stream,
                    drain_ms = DRAIN_TIMEOUT.as_millis() as u64,
                    "backend reader still running after exit"
                );
            }
        }

        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to wait for backend");
                None
            }
        };
        handle_exit(code, &shared, &dialog).await;
    })
}

pub(crate) async fn handle_exit<D: DialogAdapter>(code: Option<i32>, shared: &Shared, dialog: &D) {
    if shared.update.is_installing() {
        tracing::info!(code, "backend exited during update install");
        return;
    }

    let lock_conflict = {
        let mut status = shared.status.lock();
        status.state = BackendState::Exited;
        status.is_dead = true;
        status.exit_code = code;
        status.lock_error
    };

    let stopping = shared.stopping.load(Ordering::SeqCst);
    if stopping {
        tracing::info!(code, "backend stopped");
    } else {
        tracing::error!(code, lock_conflict, "backend exited");
        // Waiters resume only once the user has dismissed the dialog
        if lock_conflict {
            show_multi_instance_dialog(dialog).await;
        }
    }

    shared.ready_tx.send_if_modified(|r| {
        if matches!(r, Readiness::Pending) {
            *r = Readiness::Exited;
            true
        } else {
            false
        }
    });
    if !stopping {
        let _ = shared.term_tx.send(Termination::BackendExited { code, lock_conflict });
    }
}

pub fn multi_instance_prompt() -> ChoicePrompt {
    ChoicePrompt::new(
        DialogKind::Info,
        MULTI_INSTANCE_TITLE,
        "Another instance of Wave is already using this data directory.",
    )
    .detail(
        "Each running instance gets its own data directory (wave-data, wave-data-2, ...), \
         seeded from the primary so settings are shared.\n\n\
         This instance lost the race for its directory. Close it and launch again to pick \
         the next free directory.\n\n\
         Choose 'Learn More' for documentation on multi-instance mode.",
    )
    .options(["Close", "Learn More"])
    .default_option(0)
}

async fn show_multi_instance_dialog<D: DialogAdapter>(dialog: &D) {
    match dialog.present_choice(&multi_instance_prompt()).await {
        Ok(1) => {
            tracing::info!(url = DOCS_URL, "multi-instance documentation");
            let info = ChoicePrompt::new(DialogKind::Info, "Learn More", format!("Documentation: {DOCS_URL}"));
            if let Err(e) = dialog.present_choice(&info).await {
                tracing::warn!(error = %e, "failed to show documentation dialog");
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "failed to show multi-instance dialog"),
    }
}
