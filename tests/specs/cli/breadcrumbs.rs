// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup breadcrumbs` specs

use crate::prelude::*;

fn crumbs(sandbox: &Sandbox) {
    let dir = sandbox.data_dir(1);
    sandbox.json_file(
        &dir.join("crash-breadcrumbs.json"),
        &json!([
            { "timestamp": 1_700_000_000_000u64, "type": "app-start", "data": {} },
            { "timestamp": 1_700_000_001_000u64, "type": "tab-open", "data": { "id": 7 } },
            { "timestamp": 1_700_000_002_000u64, "type": "shutdown", "data": "bye" },
        ]),
    );
}

#[test]
fn prints_recovered_breadcrumbs() {
    let sandbox = Sandbox::new();
    crumbs(&sandbox);
    sandbox
        .wsup()
        .args(&["breadcrumbs"])
        .passes()
        .stdout_has("[2023-11-14T22:13:20.000Z] app-start: {}")
        .stdout_has("tab-open: {\"id\":7}")
        .stdout_has("shutdown: bye");
}

#[test]
fn limit_keeps_most_recent() {
    let sandbox = Sandbox::new();
    crumbs(&sandbox);
    let out = sandbox.wsup().args(&["breadcrumbs", "-n", "1", "-o", "json"]).passes();
    let json = out.json();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["type"], "shutdown");
}

#[test]
fn missing_file_is_empty() {
    let sandbox = Sandbox::new();
    sandbox.wsup().args(&["breadcrumbs"]).passes().stdout_has("No breadcrumbs recorded");
}
