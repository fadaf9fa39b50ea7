//! The value produced by one reconciliation pass.

use std::collections::HashMap;

use serde::Serialize;
use tasksync_proto::task::{Task, TaskId};

use super::Side;

/// Merged view plus the write-backs each side needs.
///
/// Built once by [`reconcile`](super::reconcile) and never mutated
/// afterwards. An id appears in at most one of the create/update sets for a
/// given side, and never in a create set for a side it already exists on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    merged: HashMap<TaskId, Task>,
    create_remote: HashMap<TaskId, Task>,
    update_remote: HashMap<TaskId, Task>,
    create_local: HashMap<TaskId, Task>,
    update_local: HashMap<TaskId, Task>,
}

/// Owned fields of a [`MergeResult`], for callers that consume it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeParts {
    /// One entry per distinct id across both inputs.
    pub merged: HashMap<TaskId, Task>,
    /// Tasks to create on the remote side.
    pub create_remote: HashMap<TaskId, Task>,
    /// Tasks to overwrite on the remote side.
    pub update_remote: HashMap<TaskId, Task>,
    /// Tasks to create on the local side.
    pub create_local: HashMap<TaskId, Task>,
    /// Tasks to overwrite on the local side.
    pub update_local: HashMap<TaskId, Task>,
}

/// Entry counts of a [`MergeResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Size of the merged view.
    pub merged: usize,
    /// Tasks to create on remote.
    pub create_remote: usize,
    /// Tasks to update on remote.
    pub update_remote: usize,
    /// Tasks to create on local.
    pub create_local: usize,
    /// Tasks to update on local.
    pub update_local: usize,
}

impl MergeSummary {
    /// Total number of write-backs across both sides.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.create_remote + self.update_remote + self.create_local + self.update_local
    }
}

impl std::fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tasks merged; remote: {} to create, {} to update; local: {} to create, {} to update",
            self.merged, self.create_remote, self.update_remote, self.create_local, self.update_local
        )
    }
}

impl MergeResult {
    pub(crate) fn new(
        merged: HashMap<TaskId, Task>,
        create_remote: HashMap<TaskId, Task>,
        update_remote: HashMap<TaskId, Task>,
        create_local: HashMap<TaskId, Task>,
        update_local: HashMap<TaskId, Task>,
    ) -> Self {
        Self {
            merged,
            create_remote,
            update_remote,
            create_local,
            update_local,
        }
    }

    /// The merged view, one entry per distinct id.
    #[must_use]
    pub const fn merged(&self) -> &HashMap<TaskId, Task> {
        &self.merged
    }

    /// Tasks that exist only locally and must be created on remote.
    #[must_use]
    pub const fn create_remote(&self) -> &HashMap<TaskId, Task> {
        &self.create_remote
    }

    /// Tasks on both sides whose remote copy must be overwritten.
    #[must_use]
    pub const fn update_remote(&self) -> &HashMap<TaskId, Task> {
        &self.update_remote
    }

    /// Tasks that exist only remotely and must be created locally.
    #[must_use]
    pub const fn create_local(&self) -> &HashMap<TaskId, Task> {
        &self.create_local
    }

    /// Tasks on both sides whose local copy must be overwritten.
    #[must_use]
    pub const fn update_local(&self) -> &HashMap<TaskId, Task> {
        &self.update_local
    }

    /// The create set for the given side.
    #[must_use]
    pub const fn creates_for(&self, side: Side) -> &HashMap<TaskId, Task> {
        match side {
            Side::Local => &self.create_local,
            Side::Remote => &self.create_remote,
        }
    }

    /// The update set for the given side.
    #[must_use]
    pub const fn updates_for(&self, side: Side) -> &HashMap<TaskId, Task> {
        match side {
            Side::Local => &self.update_local,
            Side::Remote => &self.update_remote,
        }
    }

    /// Returns `true` if either side needs any write.
    #[must_use]
    pub fn has_writes(&self) -> bool {
        !(self.create_remote.is_empty()
            && self.update_remote.is_empty()
            && self.create_local.is_empty()
            && self.update_local.is_empty())
    }

    /// Counts per set.
    #[must_use]
    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            merged: self.merged.len(),
            create_remote: self.create_remote.len(),
            update_remote: self.update_remote.len(),
            create_local: self.create_local.len(),
            update_local: self.update_local.len(),
        }
    }

    /// Consumes the result, handing over ownership of every set.
    #[must_use]
    pub fn into_parts(self) -> MergeParts {
        MergeParts {
            merged: self.merged,
            create_remote: self.create_remote,
            update_remote: self.update_remote,
            create_local: self.create_local,
            update_local: self.update_local,
        }
    }
}
