/// Task store adapter contract
///
/// [`TaskStore`] is the narrow interface the interaction core talks to the
/// document store through: an owner-scoped live query plus three mutations.
/// Implementations must honor the same contract:
///
/// 1. Subscriptions deliver **complete** board snapshots, never deltas. One
///    snapshot arrives immediately on subscribe, then one per change to the
///    owner's task set. Zero tasks is a valid snapshot (three empty
///    columns).
/// 2. Invalid local input (`nil` owner/id, empty title) is rejected with
///    [`StoreError::InvalidInput`] before any I/O.
/// 3. Mutations are not retried; a failed mutation leaves the store - and
///    therefore every subsequent snapshot - unchanged.
///
/// Two implementations ship:
///
/// - [`MemoryStore`](crate::store::memory::MemoryStore) - in-process, for
///   tests and demos
/// - [`LiveStore`](crate::store::live::LiveStore) - PostgreSQL rows with a
///   Redis Streams change feed
///
/// # Example
///
/// ```no_run
/// use driftboard_client::store::{memory::MemoryStore, TaskStore};
/// use driftboard_shared::models::{NewTask, Priority, TaskStatus};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), driftboard_shared::error::StoreError> {
/// let store = MemoryStore::new();
/// let owner = Uuid::new_v4();
///
/// let mut subscription = store.subscribe(owner).await;
/// let board = subscription.recv().await.unwrap()?;
/// assert_eq!(board.task_count(), 0);
///
/// store.create(owner, NewTask {
///     id: Uuid::new_v4(),
///     title: "Write spec".to_string(),
///     description: String::new(),
///     status: TaskStatus::Todo,
///     priority: Priority::High,
///     assignee: None,
/// }).await?;
///
/// let board = subscription.recv().await.unwrap()?;
/// assert_eq!(board.columns[0].tasks.len(), 1);
///
/// subscription.dispose();
/// # Ok(())
/// # }
/// ```

pub mod live;
pub mod memory;

pub use live::LiveStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use driftboard_shared::error::{StoreError, StoreResult};
use driftboard_shared::models::{Board, NewTask, Task, TaskPatch};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One delivery on a board subscription: a fresh snapshot or a feed error
pub type Snapshot = Result<Board, StoreError>;

/// The store contract consumed by the interaction core
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Opens a live query over the owner's board
    ///
    /// Never fails synchronously: a nil owner yields a subscription that
    /// delivers exactly one `InvalidInput` error and no snapshots, with a
    /// no-op canceler.
    async fn subscribe(&self, owner: Uuid) -> BoardSubscription;

    /// Creates a task with its caller-assigned id
    ///
    /// # Errors
    ///
    /// `InvalidInput` before any I/O for a nil owner/id or empty title;
    /// `Mutation` if the store rejects the insert.
    async fn create(&self, owner: Uuid, task: NewTask) -> StoreResult<Task>;

    /// Applies a partial update to one of the owner's tasks
    ///
    /// The patch is normalized before I/O, so the status/column pair can
    /// never be written skewed. Untouched fields are preserved.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for nil ids; `Mutation` if the task does not exist for
    /// this owner or the store rejects the write.
    async fn update(&self, owner: Uuid, task_id: Uuid, patch: TaskPatch) -> StoreResult<Task>;

    /// Deletes a task; deleting an already-absent task is a no-op
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a nil id; `Mutation` if the store rejects the
    /// delete.
    async fn delete(&self, task_id: Uuid) -> StoreResult<()>;
}

/// A live board query: a sequence of snapshots plus an explicit canceler
///
/// Dropping the subscription cancels it too. After [`dispose`], `recv`
/// returns `None` - buffered snapshots are discarded, so a logged-out
/// owner's stale boards never surface.
///
/// [`dispose`]: BoardSubscription::dispose
pub struct BoardSubscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    cancel: CancellationToken,
}

impl BoardSubscription {
    /// Wires a subscription from its channel and cancellation token
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Snapshot>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Builds an already-failed subscription delivering one error
    pub(crate) fn failed(err: StoreError) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Err(err));
        // Dropping tx closes the channel after the single error.
        Self {
            rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Receives the next snapshot; `None` once disposed or closed
    pub async fn recv(&mut self) -> Option<Snapshot> {
        if self.cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    /// Cancels the live query; idempotent and safe after owner changes
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    /// True once the subscription has been disposed
    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token the producing task watches to know when to stop
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for BoardSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Rejects a nil owner id before any I/O
pub(crate) fn ensure_owner(owner: Uuid) -> StoreResult<()> {
    if owner.is_nil() {
        return Err(StoreError::invalid_input("owner id must not be nil"));
    }
    Ok(())
}

/// Rejects a nil task id before any I/O
pub(crate) fn ensure_task_id(task_id: Uuid) -> StoreResult<()> {
    if task_id.is_nil() {
        return Err(StoreError::invalid_input("task id must not be nil"));
    }
    Ok(())
}

/// Validates a create call: owner, caller-assigned id, and non-empty title
pub(crate) fn validate_new_task(owner: Uuid, task: &NewTask) -> StoreResult<()> {
    ensure_owner(owner)?;
    ensure_task_id(task.id)?;
    if task.title.trim().is_empty() {
        return Err(StoreError::invalid_input("task title must not be empty"));
    }
    Ok(())
}
