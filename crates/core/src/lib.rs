// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsup-core: data model and wire grammar shared by the supervisor crates

pub mod macros;

pub mod breadcrumb;
pub mod clock;
pub mod crash;
pub mod heartbeat;
pub mod instance;
pub mod protocol;
pub mod time_fmt;

pub use breadcrumb::{format_breadcrumbs, Breadcrumb, MAX_BREADCRUMBS};
pub use clock::{Clock, FakeClock, SystemClock};
pub use crash::{CrashKind, CrashVerdict};
pub use heartbeat::{HeartbeatDetail, HeartbeatRecord, StaleCheck, StaleReason};
pub use instance::{InstanceInfo, InstanceLock, LOCK_FILE_NAME, MAX_INSTANCES, PRIMARY_DIR_NAME};
pub use protocol::{BackendLine, Handshake, ProtocolError};
pub use time_fmt::{format_system_time, format_uptime, format_utc_ms};
