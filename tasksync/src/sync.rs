//! One sync pass between two task stores.
//!
//! [`SyncEngine::run`] loads both stores, reconciles them, and (unless in
//! dry-run mode) writes the resulting create/update sets back. Load and
//! reconcile failures abort the pass; individual write failures are
//! collected in the [`SyncReport`] and never stop the remaining writes.

use std::collections::HashMap;

use serde::Serialize;
use tasksync_proto::task::{Task, TaskId};
use thiserror::Error;

use crate::reconcile::{self, MergeSummary, ReconcileError, Side};
use crate::store::{PendingWrite, StoreError, TaskStore};

/// Whether a sync pass writes its results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Apply every write-back to the stores.
    #[default]
    Apply,
    /// Reconcile and report, write nothing.
    DryRun,
}

pub use crate::store::WriteOp;

/// A write-back that the target store rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    /// Store the write was aimed at.
    pub side: Side,
    /// Task the write carried.
    pub task_id: TaskId,
    /// Whether it was a create or an update.
    pub op: WriteOp,
    /// The store's error, rendered for display.
    pub reason: String,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Counts from the reconciliation.
    pub summary: MergeSummary,
    /// Number of writes that succeeded.
    pub applied: usize,
    /// Writes that failed, in the order they were attempted per side.
    pub failures: Vec<WriteFailure>,
    /// `true` if nothing was written because of [`SyncMode::DryRun`].
    pub dry_run: bool,
}

impl SyncReport {
    /// Returns `true` if no write-back failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary)?;
        if self.dry_run {
            write!(f, " (dry run, nothing written)")
        } else {
            write!(f, "; {} applied, {} failed", self.applied, self.failures.len())
        }
    }
}

/// Errors that abort a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// One of the stores could not be read.
    #[error("failed to load {side} store: {source}")]
    Load {
        side: Side,
        #[source]
        source: StoreError,
    },

    /// The loaded collections violate a reconciler precondition.
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),
}

/// Reconciles a local and a remote [`TaskStore`].
#[derive(Debug)]
pub struct SyncEngine<L, R> {
    local: L,
    remote: R,
}

impl<L: TaskStore, R: TaskStore> SyncEngine<L, R> {
    /// Create an engine over a local and a remote store.
    pub const fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }

    /// The local store.
    pub const fn local(&self) -> &L {
        &self.local
    }

    /// The remote store.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Run one sync pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Load`] if either store cannot be loaded, or
    /// [`SyncError::Reconcile`] if the loaded data is malformed. Failed
    /// write-backs are reported in [`SyncReport::failures`] instead.
    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport, SyncError> {
        let (local, remote) = tokio::join!(self.local.load_all(), self.remote.load_all());
        let local = local.map_err(|source| SyncError::Load {
            side: Side::Local,
            source,
        })?;
        let remote = remote.map_err(|source| SyncError::Load {
            side: Side::Remote,
            source,
        })?;

        let result = reconcile::reconcile(&local, &remote)?;
        let summary = result.summary();

        if mode == SyncMode::DryRun {
            tracing::info!(%summary, "dry run, skipping write-back");
            return Ok(SyncReport {
                summary,
                applied: 0,
                failures: Vec::new(),
                dry_run: true,
            });
        }

        let ((local_applied, mut failures), (remote_applied, remote_failures)) = tokio::join!(
            apply_side(
                &self.local,
                Side::Local,
                result.creates_for(Side::Local),
                result.updates_for(Side::Local),
            ),
            apply_side(
                &self.remote,
                Side::Remote,
                result.creates_for(Side::Remote),
                result.updates_for(Side::Remote),
            ),
        );
        failures.extend(remote_failures);

        let report = SyncReport {
            summary,
            applied: local_applied + remote_applied,
            failures,
            dry_run: false,
        };
        if report.is_clean() {
            tracing::info!(applied = report.applied, "sync complete");
        } else {
            tracing::warn!(
                applied = report.applied,
                failed = report.failures.len(),
                "sync finished with failed writes"
            );
        }
        Ok(report)
    }
}

/// Apply one side's creates, then its updates, in id order, as one batch.
async fn apply_side<S: TaskStore>(
    store: &S,
    side: Side,
    creates: &HashMap<TaskId, Task>,
    updates: &HashMap<TaskId, Task>,
) -> (usize, Vec<WriteFailure>) {
    let mut writes = Vec::with_capacity(creates.len() + updates.len());
    for (op, set) in [(WriteOp::Create, creates), (WriteOp::Update, updates)] {
        let mut tasks: Vec<&Task> = set.values().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        writes.extend(tasks.into_iter().map(|task| PendingWrite { op, task }));
    }

    let results = store.apply_batch(&writes).await;

    let mut applied = 0;
    let mut failures = Vec::new();
    for (write, outcome) in writes.iter().zip(results) {
        let (op, id) = (write.op, &write.task.id);
        match outcome {
            Ok(()) => {
                applied += 1;
                tracing::debug!(%side, %op, task_id = %id, "write applied");
            }
            Err(e) => {
                tracing::warn!(%side, %op, task_id = %id, error = %e, "write failed");
                failures.push(WriteFailure {
                    side,
                    task_id: id.clone(),
                    op,
                    reason: e.to_string(),
                });
            }
        }
    }

    (applied, failures)
}
