//! Task stores that can be reconciled against each other.
//!
//! A store only has to list its tasks, create a task, and overwrite a task
//! by id. Implementations include:
//! - [`InMemoryStore`]: process-local store for tests and dry runs
//! - [`FileStore`]: a single JSON or binary snapshot file on disk

pub mod file;
pub mod memory;

pub use file::{FileStore, SnapshotFormat};
pub use memory::InMemoryStore;

use std::collections::HashMap;

use serde::Serialize;
use tasksync_proto::task::{Task, TaskId};

/// Errors that can occur during task store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be decoded.
    #[error("could not decode stored tasks: {0}")]
    Decode(String),

    /// Tasks could not be encoded for storage.
    #[error("could not encode tasks: {0}")]
    Encode(String),

    /// The task to update does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task to create already exists.
    #[error("task already exists: {0}")]
    AlreadyExists(TaskId),

    /// The store refused the write.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Kind of write a store is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    /// Add a task the store does not hold yet.
    Create,
    /// Overwrite a task the store already holds.
    Update,
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// One entry of a batch passed to [`TaskStore::apply_batch`].
///
/// An update targets the task stored under `task.id`.
#[derive(Debug, Clone, Copy)]
pub struct PendingWrite<'a> {
    pub op: WriteOp,
    pub task: &'a Task,
}

impl<'a> PendingWrite<'a> {
    #[must_use]
    pub const fn create(task: &'a Task) -> Self {
        Self {
            op: WriteOp::Create,
            task,
        }
    }

    #[must_use]
    pub const fn update(task: &'a Task) -> Self {
        Self {
            op: WriteOp::Update,
            task,
        }
    }
}

/// Trait for a collection of tasks keyed by id.
pub trait TaskStore: Send + Sync {
    /// Load every task, keyed by its id.
    fn load_all(
        &self,
    ) -> impl std::future::Future<Output = Result<HashMap<TaskId, Task>, StoreError>> + Send;

    /// Fetch one task by id.
    fn get(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<Option<Task>, StoreError>> + Send;

    /// Add a task that does not exist yet.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the id is taken.
    fn create(&self, task: &Task) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Replace the task stored under `id` with `task`.
    ///
    /// Fails with [`StoreError::NotFound`] if there is no such task.
    fn update(
        &self,
        id: &TaskId,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Apply `writes` in order, returning one result per write.
    ///
    /// A failed write does not stop the ones after it. The default runs
    /// each write through [`create`](Self::create) or
    /// [`update`](Self::update); stores with a costly commit step should
    /// override it to commit once per batch.
    fn apply_batch(
        &self,
        writes: &[PendingWrite<'_>],
    ) -> impl std::future::Future<Output = Vec<Result<(), StoreError>>> + Send {
        async move {
            let mut results = Vec::with_capacity(writes.len());
            for write in writes {
                let outcome = match write.op {
                    WriteOp::Create => self.create(write.task).await,
                    WriteOp::Update => self.update(&write.task.id, write.task).await,
                };
                results.push(outcome);
            }
            results
        }
    }
}
