// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup run` specs. The backend is a `/bin/sh -c` script configured through
//! `supervisor.toml`; `--headless` answers every dialog with its default.

#![cfg(unix)]

use crate::prelude::*;

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn backend_death_exits_nonzero_after_clean_shutdown() {
    let sandbox = Sandbox::new();
    sandbox.backend_script(&format!("{HANDSHAKE}\necho 'WAVESRV-EVENT:{{\"eventtype\":\"tab-open\"}}' >&2\nsleep 0.2\nexit 3"));

    sandbox.wsup().args(&["run", "--headless"]).fails_with(1).stderr_has("backend ready");

    let data = sandbox.base().join("wave-data");
    let heartbeat = read_json(&data.join("heartbeat.json"));
    assert_eq!(heartbeat["cleanExit"], true);
    assert!(!data.join("lock-file").exists());

    let crumbs = read_json(&data.join("crash-breadcrumbs.json"));
    let kinds: Vec<_> = crumbs.as_array().unwrap().iter().map(|c| c["type"].clone()).collect();
    assert!(kinds.contains(&json!("app-start")));
    assert!(kinds.contains(&json!("backend-ready")));
    assert!(kinds.contains(&json!("tab-open")));
    assert_eq!(kinds.last(), Some(&json!("shutdown")));
}

#[test]
fn backend_sees_injected_environment() {
    let sandbox = Sandbox::new();
    sandbox.backend_script(&format!(
        "echo \"$WAVETERM_DATA_HOME\" > env.txt\necho \"$WAVETERM_CONFIG_HOME\" >> env.txt\n{HANDSHAKE}\nexit 0"
    ));

    sandbox.wsup().args(&["run", "--headless"]).fails_with(1);

    let data = sandbox.base().join("wave-data");
    let env = std::fs::read_to_string(data.join("env.txt")).unwrap();
    let lines: Vec<_> = env.lines().collect();
    assert_eq!(lines, vec![data.display().to_string(), sandbox.config().display().to_string()]);
}

#[test]
fn log_file_written_to_data_dir() {
    let sandbox = Sandbox::new();
    sandbox.backend_script(&format!("echo backend-says-hello >&2\n{HANDSHAKE}\nexit 0"));

    sandbox.wsup().args(&["run", "--headless"]).fails_with(1);

    let log = std::fs::read_to_string(sandbox.base().join("wave-data").join("wsup.log")).unwrap();
    assert!(log.contains("backend-says-hello"), "{log}");
    assert!(log.contains("claimed data directory") || log.contains("backend ready"), "{log}");
}

#[test]
fn stale_heartbeat_is_recovered_then_replaced() {
    let sandbox = Sandbox::new();
    let data = sandbox.data_dir(1);
    sandbox.json_file(&data.join("heartbeat.json"), &json!({ "timestamp": 1_000u64, "pid": 4242 }));
    sandbox.backend_script(&format!("{HANDSHAKE}\nexit 0"));

    sandbox.wsup().args(&["run", "--headless"]).fails_with(1).stderr_has("previous run crashed");

    let heartbeat = read_json(&data.join("heartbeat.json"));
    assert_ne!(heartbeat["pid"], 4242);
    assert_eq!(heartbeat["cleanExit"], true);
}

#[test]
fn missing_backend_is_fatal() {
    let sandbox = Sandbox::new();
    let missing = sandbox.base().join("no-such-backend");
    sandbox
        .wsup()
        .args(&["run", "--headless", "--backend"])
        .arg(&missing)
        .fails_with(1)
        .stderr_has("failed to spawn backend")
        .stderr_has("WAVETERM CRASH REPORT");

    assert!(!sandbox.base().join("wave-data").join("lock-file").exists());
}

#[test]
fn invalid_handshake_is_fatal() {
    let sandbox = Sandbox::new();
    sandbox.backend_script("echo 'WAVESRV-ESTART ws:127.0.0.1:1' >&2\nsleep 5");

    sandbox.wsup().args(&["run", "--headless"]).fails_with(1).stderr_has("invalid backend handshake");
}

#[test]
fn second_instance_gets_numbered_directory() {
    let sandbox = Sandbox::new();
    let primary = sandbox.data_dir(1);
    sandbox.json_file(&primary.join("settings.json"), &json!({ "theme": "dark" }));
    sandbox.json_file(
        &primary.join("lock-file"),
        &json!({ "pid": std::process::id(), "timestamp": 1_700_000_000_000u64 }),
    );
    sandbox.backend_script(&format!("{HANDSHAKE}\nexit 0"));

    sandbox.wsup().args(&["run", "--headless"]).fails_with(1);

    let second = sandbox.base().join("wave-data-2");
    assert_eq!(read_json(&second.join("settings.json"))["theme"], "dark");
    assert_eq!(read_json(&second.join("heartbeat.json"))["cleanExit"], true);
    // The primary's lock belongs to this test process and is untouched
    assert!(primary.join("lock-file").exists());
}
