// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line readers for the backend's stdout and stderr.
//!
//! stdout is passed through to the log. stderr carries the protocol: the
//! handshake, events, and lock-conflict reports; anything else is logged.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use wsup_core::BackendLine;

use super::{Readiness, Shared, Termination};

/// Tracing target for lines passed through from the backend.
pub const BACKEND_LOG_TARGET: &str = "wsup::backend";

pub(crate) fn spawn_stdout_reader<R>(stdout: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tracing::info!(target: BACKEND_LOG_TARGET, stream = "stdout", "{line}"),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read backend stdout");
                    break;
                }
            }
        }
    })
}

pub(crate) fn spawn_stderr_reader<R>(stderr: R, shared: Arc<Shared>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => handle_stderr_line(&line, &shared),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read backend stderr");
                    break;
                }
            }
        }
    })
}

pub(crate) fn handle_stderr_line(line: &str, shared: &Shared) {
    match BackendLine::classify(line) {
        BackendLine::Handshake(Ok(handshake)) => {
            tracing::info!(
                version = %handshake.version,
                build_time = handshake.build_time,
                ws = %handshake.ws_endpoint,
                web = %handshake.web_endpoint,
                "backend handshake"
            );
            {
                let mut status = shared.status.lock();
                status.version = handshake.version.clone();
                status.build_time = handshake.build_time;
                status.ws_endpoint = Some(handshake.ws_endpoint.clone());
                status.web_endpoint = Some(handshake.web_endpoint.clone());
            }
            shared.ready_tx.send_replace(Readiness::Ready(handshake));
        }
        BackendLine::Handshake(Err(error)) => {
            tracing::error!(line, error = %error, "invalid backend handshake");
            shared.ready_tx.send_replace(Readiness::Invalid(error.clone()));
            let _ = shared.term_tx.send(Termination::InvalidHandshake { line: line.to_string(), error });
        }
        BackendLine::Event(Ok(event)) => (shared.on_event)(event),
        BackendLine::Event(Err(e)) => {
            tracing::warn!(line, error = %e, "discarding malformed backend event");
        }
        BackendLine::LockConflict(line) => {
            shared.status.lock().lock_error = true;
            tracing::info!(target: BACKEND_LOG_TARGET, stream = "stderr", "{line}");
        }
        BackendLine::Log(line) => {
            tracing::info!(target: BACKEND_LOG_TARGET, stream = "stderr", "{line}");
        }
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
