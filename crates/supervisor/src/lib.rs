// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsup-supervisor: backend supervision and crash recovery.
//!
//! A run claims a data directory, inspects the previous run's heartbeat,
//! crash dumps and breadcrumbs, starts its own heartbeat and then supervises
//! the backend until it exits or shutdown is requested.

pub mod backend;
pub mod breadcrumbs;
pub mod config;
pub mod crash_detector;
pub mod crash_reporter;
pub mod env;
pub mod fatal_report;
pub mod heartbeat;
pub mod instance;
pub mod lifecycle;
pub mod recovery;

pub use backend::{
    BackendCommand, BackendState, BackendStatus, BackendSupervisor, RunningBackend,
    SupervisorError, Termination, UpdateGate,
};
pub use breadcrumbs::BreadcrumbRecorder;
pub use config::{Config, ConfigError, ConfigOverrides, DataPaths};
pub use crash_detector::{ClearSummary, CrashDetector};
pub use crash_reporter::{CrashDump, CrashReporter, CrashReporterOptions, CrashReporterStatus};
pub use fatal_report::{show_fatal_dialog, FatalAction, FatalContext, FatalReport};
pub use heartbeat::HeartbeatMonitor;
pub use instance::InstanceError;
pub use lifecycle::{claim_data_directory, LifecycleError, Outcome, Session};
pub use recovery::{RecoveryAction, RecoveryPrompt};
