// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn format_or_json_text_runs_closure() {
    let mut called = false;
    format_or_json(OutputFormat::Text, &serde_json::json!({}), || called = true).unwrap();
    assert!(called);
}

#[test]
fn format_or_json_json_skips_closure() {
    let mut called = false;
    format_or_json(OutputFormat::Json, &serde_json::json!({"a": 1}), || called = true).unwrap();
    assert!(!called);
}

#[yare::parameterized(
    yes = { true, "yes" },
    no  = { false, "no" },
)]
fn yes_no_words(value: bool, expected: &str) {
    assert_eq!(yes_no(value), expected);
}

#[test]
#[serial]
fn field_pads_label() {
    std::env::set_var("NO_COLOR", "1");
    assert_eq!(field("PID", 42, 8), "PID:     42");
    std::env::remove_var("NO_COLOR");
}
