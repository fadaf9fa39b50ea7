//! Two-way reconciliation of task collections.
//!
//! Given the task maps held by a "local" and a "remote" store, produces a
//! merged view plus the create/update sets each side needs to converge.
//! The reconciler is a pure function of its inputs: it never mutates them
//! and never touches storage.

pub mod merge;
pub mod result;

pub use merge::{FieldSources, Resolution, reconcile, resolve_conflict};
pub use result::{MergeParts, MergeResult, MergeSummary};

use serde::Serialize;
use tasksync_proto::task::TaskId;
use thiserror::Error;

/// One of the two task collections being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The collection owned by this client.
    Local,
    /// The collection it is being synchronised with.
    Remote,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Precondition violations found in a reconciler input.
///
/// Any violation fails the whole call; no partial result is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// A task is stored under a key that differs from its own id.
    #[error("{side} task stored under key {key} has id {task_id}")]
    KeyMismatch {
        /// Which input held the task.
        side: Side,
        /// The map key.
        key: TaskId,
        /// The id recorded in the task itself.
        task_id: TaskId,
    },
    /// A task has an empty id.
    #[error("{side} task has an empty id")]
    EmptyId {
        /// Which input held the task.
        side: Side,
    },
}
