// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers: an isolated base/config directory pair and a fluent
//! wrapper over `assert_cmd`.

use std::path::{Path, PathBuf};

pub use serde_json::{json, Value};

pub const HANDSHAKE: &str =
    "echo 'WAVESRV-ESTART ws:127.0.0.1:1 web:127.0.0.1:2 version:9.9.9 buildtime:1700000000' >&2";

/// Temporary home for one spec: `base/` holds the `wave-data*` directories,
/// `config/` the optional `supervisor.toml`.
pub struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("base")).unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        Self { dir }
    }

    pub fn base(&self) -> PathBuf {
        self.dir.path().join("base")
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    /// `wave-data` or `wave-data-N`, created.
    pub fn data_dir(&self, n: u32) -> PathBuf {
        let name = if n <= 1 { "wave-data".to_string() } else { format!("wave-data-{n}") };
        let dir = self.base().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn file(&self, path: &Path, contents: impl AsRef<[u8]>) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn json_file(&self, path: &Path, value: &Value) {
        self.file(path, serde_json::to_vec_pretty(value).unwrap());
    }

    /// Backend launched as `/bin/sh -c <script>` through `supervisor.toml`.
    pub fn backend_script(&self, script: &str) {
        let toml = format!(
            "backend_path = \"/bin/sh\"\nbackend_args = [\"-c\", {}]\n",
            toml_string(script)
        );
        self.file(&self.config().join("supervisor.toml"), toml);
    }

    pub fn wsup(&self) -> Cli {
        let mut cmd = assert_cmd::Command::cargo_bin("wsup").unwrap();
        cmd.env("WSUP_BASE_DIR", self.base())
            .env("WSUP_CONFIG_DIR", self.config())
            .env("WSUP_HANDSHAKE_TIMEOUT_MS", "10000")
            .env("NO_COLOR", "1")
            .env_remove("WSUP_LOG")
            .env_remove("RUST_LOG")
            .timeout(std::time::Duration::from_secs(30));
        Cli { cmd }
    }
}

fn toml_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
}

/// `wsup` without a sandbox; fine for help and version output.
pub fn cli() -> Cli {
    Sandbox::new().wsup()
}

pub struct Cli {
    cmd: assert_cmd::Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn passes(mut self) -> Output {
        let out = self.cmd.output().unwrap();
        let out = Output::from(out);
        assert_eq!(out.code, Some(0), "expected success\n{out}");
        out
    }

    pub fn fails_with(mut self, code: i32) -> Output {
        let out = Output::from(self.cmd.output().unwrap());
        assert_eq!(out.code, Some(code), "expected exit code {code}\n{out}");
        out
    }
}

pub struct Output {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for Output {
    fn from(out: std::process::Output) -> Self {
        Self {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "--- stdout ---\n{}\n--- stderr ---\n{}", self.stdout, self.stderr)
    }
}

impl Output {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}\n{self}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}\n{self}");
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|e| panic!("invalid JSON ({e})\n{self}"))
    }
}
