//! Integration tests for the sync workflow.
//!
//! Runs `SyncEngine` over in-memory and file-backed stores: write-back,
//! dry runs, partial write failure, load failure, and convergence after a
//! clean pass.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::redundant_clone)]

use std::path::PathBuf;

use tasksync::reconcile::Side;
use tasksync::store::{FileStore, InMemoryStore, TaskStore};
use tasksync::sync::{SyncEngine, SyncError, SyncMode, WriteOp};
use tasksync_proto::task::{Task, TaskId, TaskPriority, TaskStatus, Timestamp};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Creates a task with a fixed id, title and modification time.
fn make_task(id: &str, title: &str, updated: u64) -> Task {
    let mut task = Task::new(title, Timestamp::from_millis(1_000));
    task.id = TaskId::from(id);
    task.updated_at = Timestamp::from_millis(updated);
    task
}

/// A fresh directory under the system temp dir.
fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("tasksync-sync-{}", Uuid::now_v7()))
}

// ===========================================================================
// In-memory stores
// ===========================================================================

#[tokio::test]
async fn sync_converges_both_stores() {
    let mut shared_local = make_task("shared", "Draft report", 2_000);
    shared_local.tags.insert("work");
    let mut shared_remote = shared_local.clone();
    shared_remote.priority = TaskPriority::Urgent;
    shared_remote.updated_at = Timestamp::from_millis(4_000);
    shared_remote.tags = ["review"].into_iter().collect();

    let local = InMemoryStore::with_tasks([shared_local, make_task("l", "Local", 1_500)]);
    let remote = InMemoryStore::with_tasks([shared_remote, make_task("r", "Remote", 1_500)]);
    let engine = SyncEngine::new(local, remote);

    let report = engine.run(SyncMode::Apply).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.summary.merged, 3);
    assert_eq!(report.applied, report.summary.writes());

    let local = engine.local().snapshot();
    let remote = engine.remote().snapshot();
    assert_eq!(local, remote);
    let shared = &local[&TaskId::from("shared")];
    assert_eq!(shared.priority, TaskPriority::Urgent);
    assert!(shared.tags.contains("work") && shared.tags.contains("review"));

    let second = engine.run(SyncMode::Apply).await.unwrap();
    assert_eq!(second.summary.writes(), 0);
    assert_eq!(second.applied, 0);
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let engine = SyncEngine::new(
        InMemoryStore::with_tasks([make_task("a", "Only here", 1_000)]),
        InMemoryStore::with_tasks([make_task("b", "Only there", 1_000)]),
    );

    let report = engine.run(SyncMode::DryRun).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.summary.create_remote, 1);
    assert_eq!(report.summary.create_local, 1);
    assert_eq!(report.applied, 0);
    assert_eq!(engine.local().len(), 1);
    assert_eq!(engine.remote().len(), 1);
}

#[tokio::test]
async fn read_only_remote_fails_its_writes_only() {
    let mut done_remote = make_task("x", "Shared", 1_000);
    done_remote.mark_done(Timestamp::from_millis(3_000));
    let local_edit = make_task("x", "Shared", 2_000);

    let engine = SyncEngine::new(
        InMemoryStore::with_tasks([local_edit, make_task("new", "Local only", 1_000)]),
        InMemoryStore::with_tasks([done_remote]).read_only(),
    );

    let report = engine.run(SyncMode::Apply).await.unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].side, Side::Remote);
    assert_eq!(report.failures[0].op, WriteOp::Create);
    assert_eq!(report.failures[0].task_id, TaskId::from("new"));
    assert_eq!(report.applied, 1);
    assert_eq!(
        engine.local().snapshot()[&TaskId::from("x")].status,
        TaskStatus::Done
    );
}

// ===========================================================================
// File-backed stores
// ===========================================================================

#[tokio::test]
async fn json_and_binary_files_sync() {
    let dir = scratch_dir();
    let local_path = dir.join("local.json");
    let remote_path = dir.join("remote.bin");

    let local = FileStore::new(&local_path);
    let remote = FileStore::new(&remote_path);
    local.create(&make_task("a", "From laptop", 1_000)).await.unwrap();
    remote.create(&make_task("b", "From phone", 1_000)).await.unwrap();

    let engine = SyncEngine::new(local, remote);
    let report = engine.run(SyncMode::Apply).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.applied, 2);

    let reloaded_local = FileStore::new(&local_path).load_all().await.unwrap();
    let reloaded_remote = FileStore::new(&remote_path).load_all().await.unwrap();
    assert_eq!(reloaded_local, reloaded_remote);
    assert_eq!(reloaded_local.len(), 2);

    let again = engine.run(SyncMode::Apply).await.unwrap();
    assert_eq!(again.summary.writes(), 0);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn many_creates_land_in_one_snapshot() {
    let dir = scratch_dir();
    let remote_path = dir.join("remote.json");
    let tasks: Vec<Task> = (0..50)
        .map(|n| make_task(&format!("t{n:02}"), &format!("Task {n}"), 1_000))
        .collect();

    let engine = SyncEngine::new(
        InMemoryStore::with_tasks(tasks.clone()),
        FileStore::new(&remote_path),
    );
    let report = engine.run(SyncMode::Apply).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.applied, 50);
    let reloaded = FileStore::new(&remote_path).load_all().await.unwrap();
    assert_eq!(reloaded.len(), 50);
    for task in &tasks {
        assert_eq!(reloaded[&task.id], *task);
    }
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn missing_files_sync_as_empty() {
    let dir = scratch_dir();
    let engine = SyncEngine::new(
        FileStore::new(dir.join("local.json")),
        FileStore::new(dir.join("remote.json")),
    );

    let report = engine.run(SyncMode::Apply).await.unwrap();

    assert_eq!(report.summary.merged, 0);
    assert!(!dir.exists());
}

#[tokio::test]
async fn corrupt_store_aborts_with_load_error() {
    let dir = scratch_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let remote_path = dir.join("remote.bin");
    std::fs::write(&remote_path, [0xFF, 0x00, 0x01]).unwrap();

    let engine = SyncEngine::new(
        InMemoryStore::with_tasks([make_task("a", "Safe", 1_000)]),
        FileStore::new(&remote_path),
    );

    let err = engine.run(SyncMode::Apply).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Load {
            side: Side::Remote,
            ..
        }
    ));
    assert_eq!(std::fs::read(&remote_path).unwrap(), [0xFF, 0x00, 0x01]);
    let _ = std::fs::remove_dir_all(dir);
}
