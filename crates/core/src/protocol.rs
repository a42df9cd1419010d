// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend stderr line protocol.
//!
//! Every stderr line from the backend falls into exactly one class, checked
//! in this order:
//!
//! 1. **Handshake**: contains [`HANDSHAKE_MARKER`], followed by exactly four
//!    space-separated fields in fixed order:
//!    `ws:<addr> web:<addr> version:<ver> buildtime:<epoch-secs>`.
//!    Addresses use `[a-z0-9.:]`, versions `[a-z0-9.-]`, build time is decimal.
//! 2. **Event**: starts with [`EVENT_PREFIX`], immediately followed by a JSON
//!    object.
//! 3. **Lock conflict**: contains one of [`LOCK_CONFLICT_MARKERS`].
//! 4. **Log**: anything else, passed through verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const HANDSHAKE_MARKER: &str = "WAVESRV-ESTART";
pub const EVENT_PREFIX: &str = "WAVESRV-EVENT:";
pub const LOCK_CONFLICT_MARKERS: [&str; 2] = ["error acquiring wave lock", "lock already acquired"];

/// Errors from parsing protocol lines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("handshake marker not found")]
    MissingMarker,

    #[error("handshake field `{0}` missing")]
    MissingField(&'static str),

    #[error("handshake field `{field}` has invalid value {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("unexpected trailing handshake input {0:?}")]
    TrailingInput(String),

    #[error("event payload is not valid JSON: {0}")]
    InvalidEvent(String),

    #[error("event payload is not a JSON object")]
    EventNotObject,
}

/// Startup handshake announced by the backend once it is listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub ws_endpoint: String,
    pub web_endpoint: String,
    pub version: String,
    /// Epoch seconds
    pub build_time: u64,
}

impl Handshake {
    /// Parse the handshake from a line containing [`HANDSHAKE_MARKER`].
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let start = line.find(HANDSHAKE_MARKER).ok_or(ProtocolError::MissingMarker)?;
        let mut tokens = line[start + HANDSHAKE_MARKER.len()..].split_whitespace();

        let ws_endpoint = field(&mut tokens, "ws", is_addr_char)?;
        let web_endpoint = field(&mut tokens, "web", is_addr_char)?;
        let version = field(&mut tokens, "version", is_version_char)?;
        let build_time_raw = field(&mut tokens, "buildtime", |c| c.is_ascii_digit())?;
        let build_time = build_time_raw.parse::<u64>().map_err(|_| {
            ProtocolError::InvalidField { field: "buildtime", value: build_time_raw.to_string() }
        })?;

        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() {
            return Err(ProtocolError::TrailingInput(rest.join(" ")));
        }

        Ok(Self {
            ws_endpoint: ws_endpoint.to_string(),
            web_endpoint: web_endpoint.to_string(),
            version: version.to_string(),
            build_time,
        })
    }
}

fn field<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
    valid: impl Fn(char) -> bool,
) -> Result<&'a str, ProtocolError> {
    let token = tokens.next().ok_or(ProtocolError::MissingField(name))?;
    let value = token
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or(ProtocolError::MissingField(name))?;
    if value.is_empty() || !value.chars().all(valid) {
        return Err(ProtocolError::InvalidField { field: name, value: value.to_string() });
    }
    Ok(value)
}

fn is_addr_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == ':'
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

/// Classification of one backend stderr line.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendLine<'a> {
    Handshake(Result<Handshake, ProtocolError>),
    Event(Result<Value, ProtocolError>),
    LockConflict(&'a str),
    Log(&'a str),
}

impl<'a> BackendLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.contains(HANDSHAKE_MARKER) {
            return BackendLine::Handshake(Handshake::parse(line));
        }
        if let Some(payload) = line.strip_prefix(EVENT_PREFIX) {
            return BackendLine::Event(parse_event(payload));
        }
        if LOCK_CONFLICT_MARKERS.iter().any(|m| line.contains(m)) {
            return BackendLine::LockConflict(line);
        }
        BackendLine::Log(line)
    }
}

fn parse_event(payload: &str) -> Result<Value, ProtocolError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| ProtocolError::InvalidEvent(e.to_string()))?;
    if !value.is_object() {
        return Err(ProtocolError::EventNotObject);
    }
    Ok(value)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
