// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::breadcrumbs::BreadcrumbRecorder;
use crate::heartbeat::HeartbeatMonitor;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use wsup_adapters::FakeDialogAdapter;
use wsup_core::{Breadcrumb, CrashKind, FakeClock, HeartbeatDetail};

fn verdict_with_dump(dump: PathBuf) -> CrashVerdict {
    CrashVerdict {
        kind: CrashKind::CrashDump,
        timestamp: Some("2023-11-14T22:13:20.000Z".to_string()),
        crash_dumps: vec![dump],
        breadcrumbs: vec![Breadcrumb::new(1_700_000_000_000, "app-start", json!({}))],
        heartbeat_data: None,
    }
}

struct Parts {
    heartbeat: HeartbeatMonitor<FakeClock>,
    breadcrumbs: BreadcrumbRecorder<FakeClock>,
}

fn parts(dir: &Path) -> Parts {
    let clock = FakeClock::new();
    Parts {
        heartbeat: HeartbeatMonitor::new(
            dir.join("heartbeat.json"),
            clock.clone(),
            Duration::from_secs(5),
            Duration::from_secs(30),
            "0.2.0",
        ),
        breadcrumbs: BreadcrumbRecorder::new(dir.join("crash-breadcrumbs.json"), clock),
    }
}

#[test]
fn prompt_defaults_to_continue() {
    let prompt = recovery_prompt(&verdict_with_dump("/c/completed/a.dmp".into()));
    assert_eq!(prompt.title, RECOVERY_TITLE);
    assert_eq!(prompt.options, vec!["Copy Crash Info", "Clear Crashes", "Continue"]);
    assert_eq!(prompt.default, 2);
    assert!(prompt.message.ends_with("Application crashed (native crash detected)"));
    assert!(prompt.detail.contains("Crash dumps found: 1"));
    assert!(prompt.detail.contains("Recent actions: 1 events"));
}

#[tokio::test]
async fn copy_writes_report_and_confirms() {
    let tmp = tempfile::tempdir().unwrap();
    let p = parts(tmp.path());
    let detector = CrashDetector::new(&p.heartbeat, &p.breadcrumbs, tmp.path().join("Crashpad"));
    let dialog = FakeDialogAdapter::with_answers([0]);
    let report_path = tmp.path().join("crash-report.txt");
    let verdict = verdict_with_dump(tmp.path().join("a.dmp"));

    let action = RecoveryPrompt::new(dialog.clone(), report_path.clone())
        .present(&verdict, &detector)
        .await;

    assert_eq!(action, RecoveryAction::Copied(report_path.clone()));
    assert_eq!(std::fs::read_to_string(&report_path).unwrap(), format_recovery_report(&verdict));
    assert_eq!(dialog.titles(), vec![RECOVERY_TITLE, "Copied"]);
}

#[tokio::test]
async fn clear_deletes_evidence() {
    let tmp = tempfile::tempdir().unwrap();
    let p = parts(tmp.path());
    p.breadcrumbs.track("app-start");
    let dump = tmp.path().join("a.dmp");
    std::fs::write(&dump, "x").unwrap();
    let detector = CrashDetector::new(&p.heartbeat, &p.breadcrumbs, tmp.path().join("Crashpad"));
    let dialog = FakeDialogAdapter::with_answers([1]);

    let action = RecoveryPrompt::new(dialog.clone(), tmp.path().join("r.txt"))
        .present(&verdict_with_dump(dump.clone()), &detector)
        .await;

    let RecoveryAction::Cleared(summary) = action else {
        panic!("expected Cleared, got {action:?}");
    };
    assert_eq!(summary.deleted, vec![dump.clone()]);
    assert!(!dump.exists());
    assert!(!p.breadcrumbs.path().exists());
    assert_eq!(dialog.titles(), vec![RECOVERY_TITLE, "Cleared"]);
}

async fn assert_evidence_kept(dialog: FakeDialogAdapter) {
    let tmp = tempfile::tempdir().unwrap();
    let p = parts(tmp.path());
    let dump = tmp.path().join("a.dmp");
    std::fs::write(&dump, "x").unwrap();
    let detector = CrashDetector::new(&p.heartbeat, &p.breadcrumbs, tmp.path().join("Crashpad"));
    let report_path = tmp.path().join("r.txt");

    let action = RecoveryPrompt::new(dialog, report_path.clone())
        .present(&verdict_with_dump(dump.clone()), &detector)
        .await;

    assert_eq!(action, RecoveryAction::Continued);
    assert!(dump.exists());
    assert!(!report_path.exists());
}

#[tokio::test]
async fn continue_leaves_evidence() {
    assert_evidence_kept(FakeDialogAdapter::with_answers([2])).await;
}

#[tokio::test]
async fn dismissal_leaves_evidence() {
    assert_evidence_kept(FakeDialogAdapter::new()).await;
}

#[tokio::test]
async fn dialog_failure_leaves_evidence() {
    assert_evidence_kept(FakeDialogAdapter::failing()).await;
}

#[test]
fn report_for_stale_heartbeat() {
    let verdict = CrashVerdict {
        kind: CrashKind::StaleHeartbeat,
        timestamp: Some("2023-11-14T22:13:20.000Z".to_string()),
        crash_dumps: vec![],
        breadcrumbs: vec![],
        heartbeat_data: Some(HeartbeatDetail {
            last_heartbeat: "2023-11-14T22:13:20.000Z".to_string(),
            age_seconds: 60,
            age_ms: Some(60_000),
            pid: 999,
            version: Some("0.1.0".to_string()),
        }),
    };

    let report = format_recovery_report(&verdict);

    let expected_head = "\
━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
WAVETERM CRASH RECOVERY REPORT
━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

Crash Type: stale-heartbeat
Timestamp: 2023-11-14T22:13:20.000Z

━━━ HEARTBEAT DATA ━━━

Last Heartbeat: 2023-11-14T22:13:20.000Z
Age: 60s
Process ID: 999
Version: 0.1.0

━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
";
    similar_asserts::assert_eq!(&report[..expected_head.len()], expected_head);
    assert!(!report.contains("CRASH DUMPS"));
    assert!(!report.contains("RECENT EVENTS"));
    assert!(report.contains(ISSUES_URL));
}

#[test]
fn report_limits_breadcrumbs_to_twenty() {
    let mut verdict = verdict_with_dump("/c/completed/a.dmp".into());
    verdict.breadcrumbs =
        (0..30).map(|i| Breadcrumb::new(1_700_000_000_000 + i, format!("e{i}"), json!(i))).collect();

    let report = format_recovery_report(&verdict);

    assert!(report.contains("━━━ RECENT EVENTS (Last 20) ━━━"));
    assert!(report.contains("  - /c/completed/a.dmp"));
    assert!(report.contains("] e29: 29"));
    assert!(report.contains("] e10: 10"));
    assert!(!report.contains("] e9: 9"));
}
