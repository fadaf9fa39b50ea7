//! Conflict resolution for task collections edited on two sides.
//!
//! Resolution rules for a task present on both sides (in order):
//! 1. Freshness: the side with the strictly later `updated_at` supplies
//!    title, description, priority and due date. Ties keep local.
//! 2. Completion precedence: a `Done` status beats any other status
//!    regardless of freshness. Otherwise status follows rule 1.
//!    `completed_at` is taken from remote only when remote alone is done;
//!    every other case keeps local's.
//! 3. Tags are the union of both sides.
//! 4. `updated_at` is the later of the two.
//!
//! Each rule may flag either side as needing a write-back. Flags only ever
//! get set, never cleared.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tasksync_proto::task::{TagSet, Task, TaskId};

use super::result::MergeResult;
use super::{ReconcileError, Side};

/// Which side each field group of a merged task is taken from.
///
/// `id` and `created_at` always come from local; `tags` and `updated_at`
/// are combined from both and have no single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSources {
    /// Source of `title`, `description`, `priority` and `due_date`.
    pub content: Side,
    /// Source of `status`.
    pub status: Side,
    /// Source of `completed_at`.
    pub completion: Side,
}

impl FieldSources {
    /// Builds the merged task from this table in a single construction.
    fn build(self, local: &Task, remote: &Task, tags: TagSet) -> Task {
        let content = pick(self.content, local, remote);
        let status = pick(self.status, local, remote);
        Task {
            id: local.id.clone(),
            title: content.title.clone(),
            description: content.description.clone(),
            priority: content.priority,
            status: status.status,
            created_at: local.created_at,
            updated_at: local.updated_at.max(remote.updated_at),
            due_date: content.due_date,
            completed_at: pick(self.completion, local, remote).completed_at,
            tags,
        }
    }
}

/// Outcome of resolving one task present on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The merged task.
    pub merged: Task,
    /// Where each field group of `merged` came from.
    pub sources: FieldSources,
    /// The local store must be updated with `merged`.
    pub update_local: bool,
    /// The remote store must be updated with `merged`.
    pub update_remote: bool,
}

const fn pick<'a>(side: Side, local: &'a Task, remote: &'a Task) -> &'a Task {
    match side {
        Side::Local => local,
        Side::Remote => remote,
    }
}

/// Returns `true` if the freshness-governed fields are identical.
fn same_content(a: &Task, b: &Task) -> bool {
    a.title == b.title
        && a.description == b.description
        && a.priority == b.priority
        && a.due_date == b.due_date
}

/// Resolves two versions of the same task into one.
///
/// Both arguments must carry the same id; the merged task takes local's.
#[must_use]
pub fn resolve_conflict(local: &Task, remote: &Task) -> Resolution {
    let remote_newer = remote.updated_at > local.updated_at;
    let local_newer = local.updated_at > remote.updated_at;
    let mut update_local = false;
    let mut update_remote = false;

    // Equal timestamps keep local; remote only needs the write when
    // something it would receive actually differs.
    let content = if remote_newer {
        update_local = true;
        Side::Remote
    } else {
        update_remote = local_newer || !same_content(local, remote);
        Side::Local
    };

    let mut completion = Side::Local;
    let status = match (local.status.is_done(), remote.status.is_done()) {
        (false, true) => {
            update_local = true;
            completion = Side::Remote;
            Side::Remote
        }
        (true, false) => {
            update_remote = true;
            Side::Local
        }
        _ if local.status != remote.status => {
            if remote_newer {
                update_local = true;
                Side::Remote
            } else {
                update_remote = true;
                Side::Local
            }
        }
        _ => Side::Local,
    };

    // Remote must end up holding the merged (local) completion time.
    if completion == Side::Local && local.completed_at != remote.completed_at {
        update_remote = true;
    }

    let tags = local.tags.union(&remote.tags);
    update_local |= tags != local.tags;
    update_remote |= tags != remote.tags;

    let sources = FieldSources {
        content,
        status,
        completion,
    };
    Resolution {
        merged: sources.build(local, remote, tags),
        sources,
        update_local,
        update_remote,
    }
}

/// Checks that every task is stored under its own, non-empty id.
fn validate<S: BuildHasher>(
    side: Side,
    tasks: &HashMap<TaskId, Task, S>,
) -> Result<(), ReconcileError> {
    for (key, task) in tasks {
        if task.id.is_empty() {
            return Err(ReconcileError::EmptyId { side });
        }
        if *key != task.id {
            return Err(ReconcileError::KeyMismatch {
                side,
                key: key.clone(),
                task_id: task.id.clone(),
            });
        }
    }
    Ok(())
}

/// Reconciles two task collections.
///
/// Every id present in either input lands in the merged view exactly once:
/// - local only: kept verbatim and scheduled for creation on remote;
/// - remote only: kept verbatim and scheduled for creation on local;
/// - both: resolved with [`resolve_conflict`] and scheduled for update on
///   whichever sides it flags.
///
/// Both inputs are validated before anything is merged.
///
/// # Errors
///
/// Returns [`ReconcileError`] if any task is stored under a key other than
/// its own id, or has an empty id.
pub fn reconcile<S: BuildHasher>(
    local: &HashMap<TaskId, Task, S>,
    remote: &HashMap<TaskId, Task, S>,
) -> Result<MergeResult, ReconcileError> {
    validate(Side::Local, local)?;
    validate(Side::Remote, remote)?;

    let mut merged = HashMap::with_capacity(local.len().max(remote.len()));
    let mut create_remote = HashMap::new();
    let mut update_remote = HashMap::new();
    let mut create_local = HashMap::new();
    let mut update_local = HashMap::new();

    for (id, local_task) in local {
        let Some(remote_task) = remote.get(id) else {
            merged.insert(id.clone(), local_task.clone());
            create_remote.insert(id.clone(), local_task.clone());
            continue;
        };

        let resolution = resolve_conflict(local_task, remote_task);
        tracing::debug!(
            task_id = %id,
            update_local = resolution.update_local,
            update_remote = resolution.update_remote,
            "resolved task present on both sides"
        );
        if resolution.update_local {
            update_local.insert(id.clone(), resolution.merged.clone());
        }
        if resolution.update_remote {
            update_remote.insert(id.clone(), resolution.merged.clone());
        }
        merged.insert(id.clone(), resolution.merged);
    }

    for (id, remote_task) in remote {
        if !local.contains_key(id) {
            merged.insert(id.clone(), remote_task.clone());
            create_local.insert(id.clone(), remote_task.clone());
        }
    }

    let result = MergeResult::new(
        merged,
        create_remote,
        update_remote,
        create_local,
        update_local,
    );
    let summary = result.summary();
    tracing::info!(
        merged = summary.merged,
        create_remote = summary.create_remote,
        update_remote = summary.update_remote,
        create_local = summary.create_local,
        update_local = summary.update_local,
        "reconciled task lists"
    );
    Ok(result)
}
