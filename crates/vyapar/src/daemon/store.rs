use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::types::QueuedTask;
use crate::error::Error;

/// Trait for persisting queued task state.
pub trait TaskStore: Send + Sync {
    /// Insert a new task. Returns an error if the task ID already exists.
    fn insert(&self, task: QueuedTask) -> Result<(), Error>;

    /// Get a task by ID.
    fn get(&self, id: Uuid) -> Result<Option<QueuedTask>, Error>;

    /// List tasks newest first. Returns `(tasks, total_count)`.
    fn list(&self, limit: usize, offset: usize) -> Result<(Vec<QueuedTask>, usize), Error>;

    /// Update a task via a closure. Returns an error if the task is not found.
    fn update(&self, id: Uuid, f: &dyn Fn(&mut QueuedTask)) -> Result<(), Error>;
}

/// In-memory task store backed by `std::sync::RwLock`.
///
/// Uses `std::sync::RwLock` (not tokio) because locks are never held across
/// `.await` boundaries. A separate `Vec<Uuid>` tracks insertion order.
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, QueuedTask>>,
    order: RwLock<Vec<Uuid>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn insert(&self, task: QueuedTask) -> Result<(), Error> {
        let id = task.id;
        let mut tasks = self.tasks.write().map_err(|e| Error::Daemon(e.to_string()))?;
        if tasks.contains_key(&id) {
            return Err(Error::Daemon(format!("task {id} already exists")));
        }
        tasks.insert(id, task);
        drop(tasks);
        let mut order = self.order.write().map_err(|e| Error::Daemon(e.to_string()))?;
        order.push(id);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<QueuedTask>, Error> {
        let tasks = self.tasks.read().map_err(|e| Error::Daemon(e.to_string()))?;
        Ok(tasks.get(&id).cloned())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<(Vec<QueuedTask>, usize), Error> {
        let tasks = self.tasks.read().map_err(|e| Error::Daemon(e.to_string()))?;
        let order = self.order.read().map_err(|e| Error::Daemon(e.to_string()))?;
        let total = order.len();
        let result: Vec<QueuedTask> = order
            .iter()
            .rev() // newest first
            .skip(offset)
            .take(limit)
            .filter_map(|id| tasks.get(id).cloned())
            .collect();
        Ok((result, total))
    }

    fn update(&self, id: Uuid, f: &dyn Fn(&mut QueuedTask)) -> Result<(), Error> {
        let mut tasks = self.tasks.write().map_err(|e| Error::Daemon(e.to_string()))?;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| Error::Daemon(format!("task {id} not found")))?;
        f(task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::types::TaskState;
    use crate::request::AutomationRequest;

    fn task(id: Uuid, description: &str) -> QueuedTask {
        QueuedTask::new(id, AutomationRequest::from_description(description), "test")
    }

    #[test]
    fn insert_and_get() {
        let store = InMemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.insert(task(id, "build website")).unwrap();

        let fetched = store.get(id).unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.request.description, "build website");
        assert_eq!(fetched.state, TaskState::Pending);
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = InMemoryTaskStore::new();
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn insert_duplicate_rejected() {
        let store = InMemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.insert(task(id, "first")).unwrap();
        let err = store.insert(task(id, "second")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn list_newest_first_with_pagination() {
        let store = InMemoryTaskStore::new();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for (i, &id) in ids.iter().enumerate() {
            store.insert(task(id, &format!("task {i}"))).unwrap();
        }

        let (tasks, total) = store.list(2, 1).unwrap();
        assert_eq!(total, 5);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, ids[3]);
        assert_eq!(tasks[1].id, ids[2]);
    }

    #[test]
    fn list_empty_store() {
        let store = InMemoryTaskStore::new();
        let (tasks, total) = store.list(10, 0).unwrap();
        assert_eq!(total, 0);
        assert!(tasks.is_empty());
    }

    #[test]
    fn update_modifies_task() {
        let store = InMemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.insert(task(id, "x")).unwrap();

        store
            .update(id, &|t| {
                t.state = TaskState::Running;
                t.started_at = Some(chrono::Utc::now());
            })
            .unwrap();

        let fetched = store.get(id).unwrap().unwrap();
        assert_eq!(fetched.state, TaskState::Running);
        assert!(fetched.started_at.is_some());
    }

    #[test]
    fn update_nonexistent_returns_error() {
        let store = InMemoryTaskStore::new();
        let err = store.update(Uuid::new_v4(), &|_| {}).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn concurrent_insert_and_read() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryTaskStore::new());
        let mut handles = Vec::new();

        for i in 0..10 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let id = Uuid::new_v4();
                store.insert(task(id, &format!("task {i}"))).unwrap();
                id
            }));
        }

        let ids: Vec<Uuid> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for id in &ids {
            assert!(store.get(*id).unwrap().is_some());
        }
        let (_, total) = store.list(100, 0).unwrap();
        assert_eq!(total, 10);
    }
}
