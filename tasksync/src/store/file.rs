//! Task store persisted as a single snapshot file.
//!
//! Every commit rewrites the whole collection: the snapshot goes to a
//! sibling temp file that is then renamed over the target, so readers
//! never observe a half-written file. A missing file is an empty store.
//!
//! Single `create`/`update` calls each cost one full read and rewrite.
//! [`TaskStore::apply_batch`] reads once, applies every write in memory
//! and commits once, which is what a sync pass uses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tasksync_proto::codec;
use tasksync_proto::task::{Task, TaskId};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{PendingWrite, StoreError, TaskStore, WriteOp};

/// On-disk encoding of a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Pretty-printed JSON array of tasks.
    Json,
    /// Versioned postcard snapshot (see [`tasksync_proto::codec`]).
    Binary,
}

impl SnapshotFormat {
    /// Picks `Json` for a `.json` extension and `Binary` for anything else.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Binary,
        }
    }

    fn encode(self, tasks: &[Task]) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::Json => {
                serde_json::to_vec_pretty(tasks).map_err(|e| StoreError::Encode(e.to_string()))
            }
            Self::Binary => {
                codec::encode_snapshot(tasks).map_err(|e| StoreError::Encode(e.to_string()))
            }
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<Vec<Task>, StoreError> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
            }
            Self::Binary => {
                codec::decode_snapshot(bytes).map_err(|e| StoreError::Decode(e.to_string()))
            }
        }
    }
}

/// A [`TaskStore`] backed by one snapshot file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    format: SnapshotFormat,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at `path`, choosing the format from its extension.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SnapshotFormat::from_path(&path);
        Self::with_format(path, format)
    }

    /// Open a store at `path` with an explicit format.
    #[must_use]
    pub fn with_format(path: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            path: path.into(),
            format,
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding used for the snapshot file.
    #[must_use]
    pub const fn format(&self) -> SnapshotFormat {
        self.format
    }

    async fn read_tasks(&self) -> Result<HashMap<TaskId, Task>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        let tasks = self.format.decode(&bytes)?;
        Ok(tasks.into_iter().map(|t| (t.id.clone(), t)).collect())
    }

    async fn write_tasks(&self, tasks: HashMap<TaskId, Task>) -> Result<(), StoreError> {
        let mut ordered: Vec<Task> = tasks.into_values().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes = self.format.encode(&ordered)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("tasks");
        let tmp = self
            .path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::now_v7()));
        let written = match tokio::fs::write(&tmp, &bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), tasks = ordered.len(), "wrote task snapshot");
        Ok(())
    }
}

/// Applies one write to an in-memory copy of the collection.
fn apply_one(tasks: &mut HashMap<TaskId, Task>, write: PendingWrite<'_>) -> Result<(), StoreError> {
    let id = &write.task.id;
    match write.op {
        WriteOp::Create => {
            if tasks.contains_key(id) {
                return Err(StoreError::AlreadyExists(id.clone()));
            }
            tasks.insert(id.clone(), write.task.clone());
        }
        WriteOp::Update => match tasks.get_mut(id) {
            Some(entry) => *entry = write.task.clone(),
            None => return Err(StoreError::NotFound(id.clone())),
        },
    }
    Ok(())
}

impl TaskStore for FileStore {
    async fn load_all(&self) -> Result<HashMap<TaskId, Task>, StoreError> {
        self.read_tasks().await
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.read_tasks().await?.remove(id))
    }

    async fn create(&self, task: &Task) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks().await?;
        apply_one(&mut tasks, PendingWrite::create(task))?;
        self.write_tasks(tasks).await
    }

    async fn update(&self, id: &TaskId, task: &Task) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.read_tasks().await?;
        match tasks.get_mut(id) {
            Some(entry) => *entry = task.clone(),
            None => return Err(StoreError::NotFound(id.clone())),
        }
        self.write_tasks(tasks).await
    }

    async fn apply_batch(&self, writes: &[PendingWrite<'_>]) -> Vec<Result<(), StoreError>> {
        if writes.is_empty() {
            return Vec::new();
        }
        let _guard = self.write_lock.lock().await;
        let mut tasks = match self.read_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                let reason = e.to_string();
                return writes
                    .iter()
                    .map(|_| Err(StoreError::WriteFailed(reason.clone())))
                    .collect();
            }
        };

        let mut results: Vec<Result<(), StoreError>> =
            writes.iter().map(|w| apply_one(&mut tasks, *w)).collect();
        if !results.iter().any(Result::is_ok) {
            return results;
        }

        if let Err(e) = self.write_tasks(tasks).await {
            tracing::warn!(path = %self.path.display(), error = %e, "snapshot commit failed");
            let reason = e.to_string();
            for result in results.iter_mut().filter(|r| r.is_ok()) {
                *result = Err(StoreError::WriteFailed(reason.clone()));
            }
        }
        results
    }
}
