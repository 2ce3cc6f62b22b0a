/// In-memory task store for tests and demos
///
/// Implements the full [`TaskStore`] contract - owner scoping, full-snapshot
/// subscriptions, normalizer-enforced writes - against a process-local map.
/// Useful for exercising the interaction core without PostgreSQL or Redis,
/// and for deterministic failure injection: `set_fail_mutations(true)` makes
/// every mutation fail without touching state, the way a rejected remote
/// write would.
///
/// # Example
///
/// ```
/// use driftboard_client::store::{memory::MemoryStore, TaskStore};
/// use driftboard_shared::models::{NewTask, Priority, TaskStatus};
/// use uuid::Uuid;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), driftboard_shared::error::StoreError> {
/// let store = MemoryStore::new();
/// let owner = Uuid::new_v4();
///
/// let task = store.create(owner, NewTask {
///     id: Uuid::new_v4(),
///     title: "Try the memory store".to_string(),
///     description: String::new(),
///     status: TaskStatus::Todo,
///     priority: Priority::Low,
///     assignee: None,
/// }).await?;
///
/// assert_eq!(task.column_id, "todo");
/// # Ok(())
/// # }
/// ```

use crate::store::{
    ensure_owner, ensure_task_id, validate_new_task, BoardSubscription, Snapshot, TaskStore,
};
use async_trait::async_trait;
use chrono::Utc;
use driftboard_shared::error::{StoreError, StoreResult};
use driftboard_shared::models::{Board, NewTask, Task, TaskPatch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Watcher {
    owner: Uuid,
    tx: mpsc::UnboundedSender<Snapshot>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<Uuid, Task>,
    watchers: Vec<Watcher>,
}

/// Process-local [`TaskStore`] with live subscriptions
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_mutations: Arc<AtomicBool>,
    mutations: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent mutation fail without touching state
    ///
    /// Simulates a store-side rejection (permission, network) for failure
    /// path tests.
    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Number of mutations actually applied (not counting rejected ones)
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(StoreError::Mutation(
                "store rejected the write".to_string(),
            ));
        }
        Ok(())
    }

    fn board_for(tasks: &HashMap<Uuid, Task>, owner: Uuid) -> Board {
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|task| task.user_id == owner)
            .cloned()
            .collect();
        // Arrival order, matching the live store's query ordering.
        owned.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Board::project(&owned)
    }

    fn broadcast(inner: &mut Inner, owner: Uuid) {
        inner
            .watchers
            .retain(|w| !w.cancel.is_cancelled() && !w.tx.is_closed());

        let board = Self::board_for(&inner.tasks, owner);
        for watcher in inner.watchers.iter().filter(|w| w.owner == owner) {
            let _ = watcher.tx.send(Ok(board.clone()));
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn subscribe(&self, owner: Uuid) -> BoardSubscription {
        if let Err(e) = ensure_owner(owner) {
            return BoardSubscription::failed(e);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = BoardSubscription::new(rx, CancellationToken::new());

        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let _ = tx.send(Ok(Self::board_for(&inner.tasks, owner)));
        inner.watchers.push(Watcher {
            owner,
            tx,
            cancel: subscription.cancel_token(),
        });

        subscription
    }

    async fn create(&self, owner: Uuid, task: NewTask) -> StoreResult<Task> {
        validate_new_task(owner, &task)?;
        self.check_available()?;

        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        if inner.tasks.contains_key(&task.id) {
            return Err(StoreError::Mutation(format!(
                "task {} already exists",
                task.id
            )));
        }

        let now = Utc::now();
        let stored = Task {
            id: task.id,
            user_id: owner,
            title: task.title,
            description: task.description,
            status: task.status,
            column_id: task.status.as_str().to_string(),
            priority: task.priority,
            assignee: task.assignee,
            created_at: now,
            updated_at: now,
        };

        inner.tasks.insert(stored.id, stored.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Self::broadcast(&mut inner, owner);

        Ok(stored)
    }

    async fn update(&self, owner: Uuid, task_id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        ensure_owner(owner)?;
        ensure_task_id(task_id)?;
        self.check_available()?;

        let patch = patch.normalize();

        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        let task = match inner.tasks.get_mut(&task_id) {
            Some(task) if task.user_id == owner => task,
            _ => {
                return Err(StoreError::Mutation(format!("task {} not found", task_id)));
            }
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(column_id) = patch.column_id {
            task.column_id = column_id;
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = Some(assignee);
        }
        task.updated_at = patch.updated_at.unwrap_or_else(Utc::now);

        let updated = task.clone();
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Self::broadcast(&mut inner, owner);

        Ok(updated)
    }

    async fn delete(&self, task_id: Uuid) -> StoreResult<()> {
        ensure_task_id(task_id)?;
        self.check_available()?;

        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        if let Some(task) = inner.tasks.remove(&task_id) {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            Self::broadcast(&mut inner, task.user_id);
        }

        Ok(())
    }
}
