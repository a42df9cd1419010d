// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wsup_core::FakeClock;

fn write_lock(dir: &Path, pid: u32) {
    std::fs::create_dir_all(dir).unwrap();
    let lock = InstanceLock { pid, timestamp: 1_700_000_000_000 };
    std::fs::write(lock_path(dir), serde_json::to_string(&lock).unwrap()).unwrap();
}

fn lock_own(dir: &Path) {
    write_lock(dir, std::process::id());
}

#[test]
fn no_lock_file_is_unlocked() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(!is_locked(tmp.path()));
}

#[test]
fn dead_pid_is_unlocked() {
    let tmp = tempfile::tempdir().unwrap();
    write_lock(tmp.path(), 999_999);
    assert!(!is_locked(tmp.path()));
}

#[test]
fn own_pid_is_locked() {
    let tmp = tempfile::tempdir().unwrap();
    lock_own(tmp.path());
    assert!(is_locked(tmp.path()));
}

#[yare::parameterized(
    garbage      = { "not json" },
    negative_pid = { r#"{"pid": -5, "timestamp": 1}"# },
    missing_pid  = { r#"{"timestamp": 1}"# },
    empty        = { "" },
)]
fn unparsable_lock_is_unlocked(contents: &str) {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(lock_path(tmp.path()), contents).unwrap();
    assert!(!is_locked(tmp.path()));
}

#[test]
fn empty_base_creates_primary() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = find_available_data_directory(tmp.path()).unwrap();
    assert_eq!(dir, tmp.path().join("wave-data"));
    assert!(dir.is_dir());
}

#[test]
fn unlocked_primary_is_preferred_over_free_numbered() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("wave-data-2")).unwrap();
    write_lock(&tmp.path().join("wave-data"), 999_999);

    let dir = find_available_data_directory(tmp.path()).unwrap();
    assert_eq!(dir, tmp.path().join("wave-data"));
}

#[test]
fn locked_primary_is_copied_into_second_slot() {
    let tmp = tempfile::tempdir().unwrap();
    let primary = tmp.path().join("wave-data");
    lock_own(&primary);
    std::fs::write(primary.join("settings.json"), r#"{"theme":"dark"}"#).unwrap();
    std::fs::create_dir_all(primary.join("db/nested")).unwrap();
    std::fs::write(primary.join("db/nested/state.db"), b"\x00\x01").unwrap();

    let dir = find_available_data_directory(tmp.path()).unwrap();

    assert_eq!(dir, tmp.path().join("wave-data-2"));
    assert_eq!(std::fs::read_to_string(dir.join("settings.json")).unwrap(), r#"{"theme":"dark"}"#);
    assert_eq!(std::fs::read(dir.join("db/nested/state.db")).unwrap(), b"\x00\x01");
    // The primary is untouched
    assert!(primary.join("settings.json").exists());
}

#[test]
fn existing_numbered_dir_is_reused_without_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    let primary = tmp.path().join("wave-data");
    lock_own(&primary);
    std::fs::write(primary.join("settings.json"), "primary").unwrap();
    let second = tmp.path().join("wave-data-2");
    std::fs::create_dir_all(&second).unwrap();
    std::fs::write(second.join("settings.json"), "second").unwrap();

    let dir = find_available_data_directory(tmp.path()).unwrap();

    assert_eq!(dir, second);
    assert_eq!(std::fs::read_to_string(second.join("settings.json")).unwrap(), "second");
}

#[test]
fn third_slot_when_first_two_locked() {
    let tmp = tempfile::tempdir().unwrap();
    lock_own(&tmp.path().join("wave-data"));
    lock_own(&tmp.path().join("wave-data-2"));

    let dir = find_available_data_directory(tmp.path()).unwrap();
    assert_eq!(dir, tmp.path().join("wave-data-3"));
}

#[test]
fn new_slots_copy_from_primary_not_siblings() {
    let tmp = tempfile::tempdir().unwrap();
    let primary = tmp.path().join("wave-data");
    lock_own(&primary);
    let second = tmp.path().join("wave-data-2");
    lock_own(&second);
    std::fs::write(second.join("only-in-second"), "x").unwrap();

    let dir = find_available_data_directory(tmp.path()).unwrap();

    assert!(!dir.join("only-in-second").exists());
}

#[test]
fn all_slots_locked_is_exhaustion() {
    let tmp = tempfile::tempdir().unwrap();
    for n in 1..=MAX_INSTANCES {
        lock_own(&candidate_dir(tmp.path(), n));
    }

    let err = find_available_data_directory(tmp.path()).unwrap_err();

    assert!(matches!(err, InstanceError::Exhausted));
    assert_eq!(err.to_string(), "too many instances running (max 100)");
    assert!(!tmp.path().join("wave-data-101").exists());
}

#[test]
fn acquire_then_release() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();

    let lock = acquire_lock(tmp.path(), &clock).unwrap();

    assert_eq!(lock, InstanceLock { pid: std::process::id(), timestamp: 1_700_000_000_000 });
    assert_eq!(read_lock(tmp.path()), Some(lock));
    assert!(is_locked(tmp.path()));

    release_lock(tmp.path());
    assert!(!lock_path(tmp.path()).exists());
}

#[test]
fn release_leaves_foreign_lock() {
    let tmp = tempfile::tempdir().unwrap();
    write_lock(tmp.path(), 999_999);
    release_lock(tmp.path());
    assert!(lock_path(tmp.path()).exists());
}
