// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup instance` specs

use crate::prelude::*;

fn lock(sandbox: &Sandbox, n: u32, pid: u32) {
    let dir = sandbox.data_dir(n);
    sandbox.json_file(&dir.join("lock-file"), &json!({ "pid": pid, "timestamp": 1_700_000_000_000u64 }));
}

#[test]
fn find_prefers_primary() {
    let sandbox = Sandbox::new();
    let out = sandbox.wsup().args(&["instance", "find"]).passes();
    assert!(out.stdout.trim().ends_with("wave-data"), "{out}");
}

#[test]
fn find_skips_directory_held_by_live_process() {
    let sandbox = Sandbox::new();
    lock(&sandbox, 1, std::process::id());
    lock(&sandbox, 2, std::process::id());

    let out = sandbox.wsup().args(&["instance", "find", "-o", "json"]).passes();
    let json = out.json();
    assert_eq!(json["instanceId"], "3");
    assert!(json["dataDir"].as_str().unwrap().ends_with("wave-data-3"));
}

#[test]
fn find_ignores_dead_lock() {
    let sandbox = Sandbox::new();
    lock(&sandbox, 1, 999_999);
    let out = sandbox.wsup().args(&["instance", "find"]).passes();
    assert!(out.stdout.trim().ends_with("wave-data"), "{out}");
}

#[test]
fn status_reports_locks() {
    let sandbox = Sandbox::new();
    lock(&sandbox, 1, std::process::id());
    sandbox.data_dir(2);

    let out = sandbox.wsup().args(&["instance", "status", "-o", "json"]).passes();
    let entries = out.json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["pid"], std::process::id());
    assert_eq!(entries[0]["alive"], true);
    assert_eq!(entries[1]["pid"], Value::Null);

    sandbox.wsup().args(&["instance", "status"]).passes().stdout_has("DIRECTORY").stdout_has("wave-data-2");
}
