// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the outside world: user prompts, host platform paths, and
//! OS process probing.

pub mod dialog;
pub mod platform;
pub mod process;

pub use dialog::{
    ChoicePrompt, DesktopDialogAdapter, DialogAdapter, DialogError, DialogKind, DialogRouter,
    HeadlessDialogAdapter,
};
pub use platform::{HostPlatform, Platform, PlatformError};
pub use process::{current_pid, is_process_alive};

#[cfg(any(test, feature = "test-support"))]
pub use dialog::{FakeDialogAdapter, PromptCall};
#[cfg(any(test, feature = "test-support"))]
pub use platform::FakePlatform;
