// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error carrying the process exit code.
//!
//! Commands return `ExitError` so that `main()` alone decides when the process
//! ends, after the log writer has been flushed.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    /// `None` when the failure was already reported (dialog or log)
    pub message: Option<String>,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: Some(message.into()) }
    }

    pub fn silent(code: i32) -> Self {
        Self { code, message: None }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "exit code {}", self.code),
        }
    }
}

impl std::error::Error for ExitError {}
