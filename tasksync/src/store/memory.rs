//! In-memory task store.

use std::collections::HashMap;

use parking_lot::Mutex;
use tasksync_proto::task::{Task, TaskId};

use super::{StoreError, TaskStore};

/// Process-local store backed by a `HashMap`.
///
/// A read-only store accepts reads but fails every write with
/// [`StoreError::WriteFailed`], which lets callers exercise partial
/// write-back failure.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    read_only: bool,
}

impl InMemoryStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given tasks.
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
            read_only: false,
        }
    }

    /// Turn this store into one that rejects every write.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<TaskId, Task> {
        self.tasks.lock().clone()
    }

    /// Number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns `true` if the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    fn check_writable(&self, id: &TaskId) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::WriteFailed(format!("store is read-only ({id})")));
        }
        Ok(())
    }
}

impl TaskStore for InMemoryStore {
    async fn load_all(&self) -> Result<HashMap<TaskId, Task>, StoreError> {
        Ok(self.snapshot())
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().get(id).cloned())
    }

    async fn create(&self, task: &Task) -> Result<(), StoreError> {
        self.check_writable(&task.id)?;
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&task.id) {
            return Err(StoreError::AlreadyExists(task.id.clone()));
        }
        tasks.insert(task.id.clone(), task.clone());
        drop(tasks);
        Ok(())
    }

    async fn update(&self, id: &TaskId, task: &Task) -> Result<(), StoreError> {
        self.check_writable(id)?;
        match self.tasks.lock().get_mut(id) {
            Some(entry) => {
                *entry = task.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.clone())),
        }
    }
}
