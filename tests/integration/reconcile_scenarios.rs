//! Integration tests for two-way task reconciliation.
//!
//! Exercises `reconcile` end to end on realistic collections: one-sided
//! tasks, freshness conflicts, completion precedence, tag union, and the
//! fail-fast handling of malformed input.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::similar_names,
    clippy::redundant_clone
)]

use std::collections::HashMap;

use tasksync::reconcile::{ReconcileError, Side, reconcile};
use tasksync_proto::task::{Task, TaskId, TaskPriority, TaskStatus, Timestamp};

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

/// Builds an id-keyed collection from a list of tasks.
fn collection(tasks: &[Task]) -> HashMap<TaskId, Task> {
    tasks.iter().map(|t| (t.id.clone(), t.clone())).collect()
}

/// Shorthand for building a `TaskId`.
fn id(s: &str) -> TaskId {
    TaskId::from(s)
}

// ===========================================================================
// One-sided tasks
// ===========================================================================

#[test]
fn empty_inputs_give_empty_result() {
    let result = reconcile(&HashMap::new(), &HashMap::new()).unwrap();
    assert!(result.merged().is_empty());
    assert!(result.create_remote().is_empty());
    assert!(result.update_remote().is_empty());
    assert!(result.create_local().is_empty());
    assert!(result.update_local().is_empty());
}

#[test]
fn local_only_task_is_created_remotely() {
    let task = make_task("a", "Write tests", 2_000);
    let local = collection(&[task.clone()]);

    let result = reconcile(&local, &HashMap::new()).unwrap();

    assert_eq!(result.merged(), &local);
    assert_eq!(result.create_remote(), &local);
    assert!(result.update_remote().is_empty());
    assert!(result.create_local().is_empty());
    assert!(result.update_local().is_empty());
}

#[test]
fn remote_only_task_is_created_locally() {
    let task = make_task("b", "Review PR", 2_000);
    let remote = collection(&[task.clone()]);

    let result = reconcile(&HashMap::new(), &remote).unwrap();

    assert_eq!(result.merged(), &remote);
    assert_eq!(result.create_local(), &remote);
    assert!(result.create_remote().is_empty());
    assert!(result.update_local().is_empty());
    assert!(result.update_remote().is_empty());
}

#[test]
fn mixed_collections_cover_every_id() {
    let shared_local = make_task("shared", "Plan sprint", 2_000);
    let mut shared_remote = shared_local.clone();
    shared_remote.title = "Plan sprint 12".to_string();
    shared_remote.updated_at = Timestamp::from_millis(3_000);

    let local = collection(&[shared_local, make_task("l1", "Local one", 1_500)]);
    let remote = collection(&[
        shared_remote.clone(),
        make_task("r1", "Remote one", 1_500),
        make_task("r2", "Remote two", 1_500),
    ]);

    let result = reconcile(&local, &remote).unwrap();

    let mut ids: Vec<&str> = result.merged().keys().map(TaskId::as_str).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["l1", "r1", "r2", "shared"]);
    assert!(result.create_remote().contains_key(&id("l1")));
    assert_eq!(result.create_local().len(), 2);
    assert_eq!(result.update_local()[&id("shared")], shared_remote);
    assert!(result.update_remote().is_empty());

    let summary = result.summary();
    assert_eq!(summary.merged, 4);
    assert_eq!(summary.writes(), 4);
}

// ===========================================================================
// Conflicts
// ===========================================================================

#[test]
fn newer_remote_content_wins() {
    let local = make_task("x", "Old title", 2_000);
    let mut remote = local.clone();
    remote.title = "New title".to_string();
    remote.description = "details".to_string();
    remote.priority = TaskPriority::High;
    remote.due_date = Some(Timestamp::from_millis(9_000));
    remote.updated_at = Timestamp::from_millis(5_000);

    let result = reconcile(&collection(&[local]), &collection(&[remote.clone()])).unwrap();

    let merged = &result.merged()[&id("x")];
    assert_eq!(merged.title, "New title");
    assert_eq!(merged.description, "details");
    assert_eq!(merged.priority, TaskPriority::High);
    assert_eq!(merged.due_date, Some(Timestamp::from_millis(9_000)));
    assert_eq!(merged.updated_at, Timestamp::from_millis(5_000));
    assert!(result.update_local().contains_key(&id("x")));
    assert!(!result.update_remote().contains_key(&id("x")));
}

#[test]
fn newer_local_content_is_pushed() {
    let remote = make_task("x", "Old title", 2_000);
    let mut local = remote.clone();
    local.title = "Edited offline".to_string();
    local.updated_at = Timestamp::from_millis(4_000);

    let result = reconcile(&collection(&[local.clone()]), &collection(&[remote])).unwrap();

    assert_eq!(result.update_remote()[&id("x")], local);
    assert!(result.update_local().is_empty());
}

#[test]
fn remote_done_beats_newer_local_progress() {
    let mut local = make_task("x", "Local title", 5_000);
    local.status = TaskStatus::InProgress;
    let mut remote = make_task("x", "Remote title", 2_000);
    remote.mark_done(Timestamp::from_millis(3_000));

    let result = reconcile(&collection(&[local]), &collection(&[remote])).unwrap();

    let merged = &result.merged()[&id("x")];
    assert_eq!(merged.status, TaskStatus::Done);
    assert_eq!(merged.completed_at, Some(Timestamp::from_millis(3_000)));
    assert_eq!(merged.title, "Local title");
    assert_eq!(merged.updated_at, Timestamp::from_millis(5_000));
    assert!(result.update_local().contains_key(&id("x")));
    assert!(result.update_remote().contains_key(&id("x")));
}

#[test]
fn local_done_beats_newer_remote_status() {
    let mut local = make_task("x", "Ship it", 2_000);
    local.mark_done(Timestamp::from_millis(2_500));
    let mut remote = make_task("x", "Ship it", 6_000);
    remote.status = TaskStatus::Review;

    let result = reconcile(&collection(&[local]), &collection(&[remote])).unwrap();

    let merged = &result.merged()[&id("x")];
    assert_eq!(merged.status, TaskStatus::Done);
    assert_eq!(merged.completed_at, Some(Timestamp::from_millis(2_500)));
    assert!(result.update_remote().contains_key(&id("x")));
}

#[test]
fn differing_open_statuses_follow_freshness() {
    let mut local = make_task("x", "Task", 2_000);
    local.status = TaskStatus::InProgress;
    let mut remote = make_task("x", "Task", 3_000);
    remote.status = TaskStatus::Review;

    let result = reconcile(&collection(&[local]), &collection(&[remote])).unwrap();

    assert_eq!(result.merged()[&id("x")].status, TaskStatus::Review);
    assert!(result.update_local().contains_key(&id("x")));
    assert!(result.update_remote().is_empty());
}

#[test]
fn both_done_keeps_local_completion_time() {
    let mut local = make_task("x", "Ship it", 1_000);
    local.mark_done(Timestamp::from_millis(500));
    local.updated_at = Timestamp::from_millis(1_000);
    let mut remote = make_task("x", "Ship it", 2_000);
    remote.mark_done(Timestamp::from_millis(1_900));
    remote.updated_at = Timestamp::from_millis(2_000);

    let result = reconcile(&collection(&[local]), &collection(&[remote])).unwrap();

    let merged = &result.merged()[&id("x")];
    assert_eq!(merged.status, TaskStatus::Done);
    assert_eq!(merged.completed_at, Some(Timestamp::from_millis(500)));
    assert_eq!(merged.updated_at, Timestamp::from_millis(2_000));
    assert_eq!(result.update_remote()[&id("x")].completed_at, merged.completed_at);
}

#[test]
fn newer_open_status_does_not_clear_completion_time() {
    let mut local = make_task("x", "Reopened", 1_000);
    local.status = TaskStatus::InProgress;
    local.completed_at = Some(Timestamp::from_millis(500));
    let mut remote = make_task("x", "Reopened", 2_000);
    remote.status = TaskStatus::Review;

    let result = reconcile(&collection(&[local]), &collection(&[remote])).unwrap();

    let merged = &result.merged()[&id("x")];
    assert_eq!(merged.status, TaskStatus::Review);
    assert_eq!(merged.completed_at, Some(Timestamp::from_millis(500)));
}

#[test]
fn tag_union_updates_both_sides_on_tie() {
    let mut local = make_task("y", "Tagged", 2_000);
    local.tags = ["a", "b"].into_iter().collect();
    let mut remote = local.clone();
    remote.tags = ["b", "c"].into_iter().collect();

    let result = reconcile(&collection(&[local]), &collection(&[remote])).unwrap();

    let tags: Vec<&str> = result.merged()[&id("y")].tags.iter().collect();
    assert_eq!(tags, ["a", "b", "c"]);
    assert!(result.update_local().contains_key(&id("y")));
    assert!(result.update_remote().contains_key(&id("y")));
}

#[test]
fn identical_tie_needs_no_writes() {
    let task = make_task("z", "Same everywhere", 2_000);

    let result = reconcile(&collection(&[task.clone()]), &collection(&[task.clone()])).unwrap();

    assert_eq!(result.merged()[&id("z")], task);
    assert!(!result.has_writes());
}

#[test]
fn reconciling_a_collection_with_itself_is_a_no_op() {
    let mut done = make_task("d", "Finished", 4_000);
    done.mark_done(Timestamp::from_millis(4_000));
    let mut tagged = make_task("t", "Tagged", 3_000);
    tagged.tags.insert("home");
    let tasks = collection(&[done, tagged, make_task("p", "Plain", 1_000)]);

    let result = reconcile(&tasks, &tasks).unwrap();

    assert_eq!(result.merged(), &tasks);
    assert!(!result.has_writes());
}

#[test]
fn merged_tasks_do_not_alias_inputs() {
    let mut local = make_task("x", "Tagged", 2_000);
    local.tags.insert("a");
    let local_map = collection(&[local]);

    let result = reconcile(&local_map, &HashMap::new()).unwrap();
    let mut parts = result.into_parts();
    if let Some(task) = parts.merged.get_mut(&id("x")) {
        task.tags.insert("mutated");
    }

    assert!(!local_map[&id("x")].tags.contains("mutated"));
    assert!(!parts.create_remote[&id("x")].tags.contains("mutated"));
}

// ===========================================================================
// Malformed input
// ===========================================================================

#[test]
fn key_mismatch_fails_whole_call() {
    let good = make_task("ok", "Fine", 1_000);
    let mut remote = collection(&[good]);
    remote.insert(id("wrong-key"), make_task("real-id", "Misfiled", 1_000));

    let err = reconcile(&HashMap::new(), &remote).unwrap_err();

    assert_eq!(
        err,
        ReconcileError::KeyMismatch {
            side: Side::Remote,
            key: id("wrong-key"),
            task_id: id("real-id"),
        }
    );
}

#[test]
fn empty_id_is_rejected() {
    let task = make_task("", "No id", 1_000);
    let local = HashMap::from([(id(""), task)]);

    let err = reconcile(&local, &HashMap::new()).unwrap_err();

    assert_eq!(err, ReconcileError::EmptyId { side: Side::Local });
}
