// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn sample_dump() -> CrashDump {
    CrashDump {
        product_name: "WaveTerm".to_string(),
        company_name: "CommandLine".to_string(),
        timestamp: "2023-11-14T22:13:20.000Z".to_string(),
        pid: 42,
        thread: Some("main".to_string()),
        message: "boom".to_string(),
        location: Some("src/main.rs:1:1".to_string()),
        backtrace: String::new(),
        extra: BTreeMap::from([("version".to_string(), "0.2.0".to_string())]),
    }
}

#[yare::parameterized(
    compressed = { true },
    plain      = { false },
)]
fn dumps_decode(compress: bool) {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_dump(tmp.path(), &sample_dump(), compress).unwrap();

    assert_eq!(path.parent().unwrap(), tmp.path().join("completed"));
    assert_eq!(path.extension().unwrap(), DUMP_EXTENSION);
    let raw = std::fs::read(&path).unwrap();
    assert_eq!(raw.starts_with(&ZSTD_MAGIC), compress);
    assert_eq!(read_dump(&path).unwrap(), sample_dump());
}

#[test]
fn read_dump_rejects_foreign_files() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("minidump.dmp");
    std::fs::write(&path, b"MDMP\x93\xa7").unwrap();
    assert!(matches!(read_dump(&path), Err(CrashReportError::Decode { .. })));
    assert!(matches!(
        read_dump(&tmp.path().join("absent.dmp")),
        Err(CrashReportError::Read { .. })
    ));
}

#[test]
fn uninitialized_reporter_uses_fallback() {
    let reporter = CrashReporter::new(PathBuf::from("/data/Crashpad"));
    assert_eq!(reporter.crashes_directory(), PathBuf::from("/data/Crashpad"));
    let status = reporter.status();
    assert!(!status.enabled);
    assert!(!status.uploads_enabled);
}

#[test]
fn init_failure_keeps_fallback() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let reporter = CrashReporter::new(tmp.path().join("Crashpad"));

    assert!(!reporter.init(blocker.join("Crashpad"), CrashReporterOptions::default()));
    assert_eq!(reporter.crashes_directory(), tmp.path().join("Crashpad"));
}

#[test]
#[serial]
fn panic_is_captured_as_dump() {
    let tmp = tempfile::tempdir().unwrap();
    let crashes = tmp.path().join("Crashpad");
    let reporter = CrashReporter::new(crashes.clone());
    let options = CrashReporterOptions {
        extra: BTreeMap::from([("platform".to_string(), "testos".to_string())]),
        ..CrashReporterOptions::default()
    };
    assert!(reporter.init(crashes.clone(), options));
    assert!(reporter.status().enabled);

    let result = std::thread::Builder::new()
        .name("crasher".to_string())
        .spawn(|| panic!("deliberate test panic"))
        .unwrap()
        .join();
    assert!(result.is_err());

    let dumps: Vec<_> = std::fs::read_dir(crashes.join("completed"))
        .unwrap()
        .flatten()
        .map(|e| e.path())
        .collect();
    assert_eq!(dumps.len(), 1);
    let dump = read_dump(&dumps[0]).unwrap();
    assert_eq!(dump.message, "deliberate test panic");
    assert_eq!(dump.thread.as_deref(), Some("crasher"));
    assert_eq!(dump.pid, std::process::id());
    assert_eq!(dump.extra.get("platform").map(String::as_str), Some("testos"));
    assert!(dump.location.unwrap().contains("crash_reporter_tests.rs"));
}
