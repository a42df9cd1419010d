// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup crash` specs

use crate::prelude::*;
use std::path::PathBuf;

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_millis() as u64
}

fn stale_heartbeat(sandbox: &Sandbox) {
    let dir = sandbox.data_dir(1);
    sandbox.json_file(
        &dir.join("heartbeat.json"),
        &json!({ "timestamp": now_ms() - 120_000, "pid": 4242, "version": "0.1.0" }),
    );
}

fn dump(sandbox: &Sandbox) -> PathBuf {
    let path = sandbox.data_dir(1).join("Crashpad").join("completed").join("abc.dmp");
    let body = json!({
        "productName": "WaveTerm",
        "companyName": "CommandLine",
        "timestamp": "2023-11-14T22:13:20.000Z",
        "pid": 4242,
        "thread": "main",
        "message": "index out of bounds",
        "location": "src/lib.rs:10:5",
        "backtrace": "",
        "extra": { "version": "0.2.0" },
    });
    let compressed = zstd::encode_all(serde_json::to_vec(&body).unwrap().as_slice(), 3).unwrap();
    sandbox.file(&path, compressed);
    path
}

#[test]
fn check_clean_directory() {
    let sandbox = Sandbox::new();
    sandbox.data_dir(1);
    sandbox.wsup().args(&["crash", "check"]).passes().stdout_has("No crash detected");
}

#[test]
fn clean_exit_heartbeat_is_not_a_crash() {
    let sandbox = Sandbox::new();
    let dir = sandbox.data_dir(1);
    sandbox.json_file(
        &dir.join("heartbeat.json"),
        &json!({ "timestamp": now_ms() - 120_000, "pid": 4242, "cleanExit": true }),
    );
    let json = sandbox.wsup().args(&["crash", "check", "-o", "json"]).passes().json();
    assert_eq!(json["crashed"], false);
}

#[test]
fn check_reports_stale_heartbeat() {
    let sandbox = Sandbox::new();
    stale_heartbeat(&sandbox);
    let json = sandbox.wsup().args(&["crash", "check", "-o", "json"]).passes().json();
    assert_eq!(json["crashed"], true);
    assert_eq!(json["verdict"]["type"], "stale-heartbeat");
    assert_eq!(json["verdict"]["heartbeatData"]["pid"], 4242);
}

#[test]
fn dump_overrides_heartbeat_kind() {
    let sandbox = Sandbox::new();
    stale_heartbeat(&sandbox);
    let path = dump(&sandbox);
    let out = sandbox.wsup().args(&["crash", "check"]).passes();
    let out = out.stdout_has("Previous run crashed").stdout_has("crash-dump");
    assert!(out.stdout.contains(&path.display().to_string()), "{out}");
}

#[test]
fn check_explicit_data_dir() {
    let sandbox = Sandbox::new();
    let dir = sandbox.data_dir(4);
    sandbox.json_file(
        &dir.join("heartbeat.json"),
        &json!({ "timestamp": now_ms() - 120_000, "pid": 1 }),
    );
    let json = sandbox
        .wsup()
        .args(&["crash", "check", "-o", "json", "--data-dir"])
        .arg(&dir)
        .passes()
        .json();
    assert_eq!(json["crashed"], true);
}

#[test]
fn show_decodes_compressed_dump() {
    let sandbox = Sandbox::new();
    let path = dump(&sandbox);
    sandbox
        .wsup()
        .args(&["crash", "show"])
        .arg(&path)
        .passes()
        .stdout_has("index out of bounds")
        .stdout_has("src/lib.rs:10:5");

    let json = sandbox.wsup().args(&["crash", "show", "-o", "json"]).arg(&path).passes().json();
    assert_eq!(json["pid"], 4242);
    assert_eq!(json["extra"]["version"], "0.2.0");
}

#[test]
fn show_rejects_garbage() {
    let sandbox = Sandbox::new();
    let path = sandbox.base().join("bad.dmp");
    sandbox.file(&path, b"not a dump");
    sandbox.wsup().args(&["crash", "show"]).arg(&path).fails_with(1).stderr_has("failed to decode dump");
}

#[test]
fn clear_deletes_dumps_and_breadcrumbs() {
    let sandbox = Sandbox::new();
    let path = dump(&sandbox);
    let crumbs = sandbox.data_dir(1).join("crash-breadcrumbs.json");
    sandbox.json_file(&crumbs, &json!([{ "timestamp": 1, "type": "app-start", "data": {} }]));

    sandbox.wsup().args(&["crash", "clear"]).passes().stdout_has("Deleted 1 crash dump(s)");
    assert!(!path.exists());
    assert!(!crumbs.exists());
    sandbox.wsup().args(&["crash", "check"]).passes().stdout_has("No crash detected");
}
