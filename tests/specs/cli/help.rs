// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("run")
        .stdout_has("crash")
        .stdout_has("instance")
        .stdout_has("breadcrumbs");
}

#[test]
fn crash_help_shows_subcommands() {
    cli().args(&["crash", "--help"]).passes().stdout_has("check").stdout_has("clear").stdout_has("show");
}

#[test]
fn run_help_shows_flags() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--base-dir")
        .stdout_has("--backend")
        .stdout_has("--headless");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("wsup 0.2");
}
