/// PostgreSQL + Redis Streams task store
///
/// The production [`TaskStore`]: rows live in PostgreSQL, and every mutation
/// appends a change notification to the owner's Redis board stream. A
/// subscription runs one tokio task that resolves the stream tail, sends an
/// initial full snapshot, then blocks on the stream - re-querying the
/// complete owner task set and projecting a fresh board on every wake-up.
/// Snapshots are always whole, so a lost notification costs at most one
/// refresh, never a skewed view.
///
/// ```text
/// create/update/delete ──▶ PostgreSQL row ──▶ XADD board:{owner}
///                                                   │
///                    subscription task ◀── XREAD BLOCK
///                          │
///                          ├─ SELECT * FROM tasks WHERE user_id = owner
///                          ├─ Board::project(...)
///                          ▼
///                    BoardSubscription::recv()
/// ```
///
/// # Example
///
/// ```no_run
/// use driftboard_client::store::{live::LiveStore, TaskStore};
/// use driftboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use driftboard_shared::redis::client::{RedisClient, RedisConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }).await?;
/// let redis = RedisClient::new(RedisConfig::from_env()?).await?;
///
/// let store = LiveStore::new(pool, redis);
/// let mut subscription = store.subscribe(Uuid::new_v4()).await;
/// let board = subscription.recv().await.unwrap()?;
/// println!("{} tasks on the board", board.task_count());
/// # Ok(())
/// # }
/// ```

use crate::store::{
    ensure_owner, ensure_task_id, validate_new_task, BoardSubscription, Snapshot, TaskStore,
};
use async_trait::async_trait;
use driftboard_shared::error::{StoreError, StoreResult};
use driftboard_shared::events::{BoardChange, ChangeKind};
use driftboard_shared::models::{Board, NewTask, Task, TaskPatch};
use driftboard_shared::redis::{ChangeListener, ChangePublisher, RedisClient};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How long one XREAD BLOCK waits before re-arming (milliseconds)
const BLOCK_MS: usize = 5000;

/// How long the subscription task backs off after a feed error
const ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(1);

/// Task store over PostgreSQL rows and a Redis change feed
#[derive(Clone)]
pub struct LiveStore {
    pool: PgPool,
    publisher: ChangePublisher,
    listener: ChangeListener,
}

impl LiveStore {
    /// Creates a store over an existing pool and Redis client
    pub fn new(pool: PgPool, redis: RedisClient) -> Self {
        Self {
            pool,
            publisher: ChangePublisher::new(redis.clone()),
            listener: ChangeListener::new(redis),
        }
    }

    /// Publishes a change notification for an already-committed write
    ///
    /// The row is already persisted at this point, so a publish failure is
    /// logged rather than surfaced: subscribers refresh fully on the next
    /// notification anyway.
    async fn notify(&self, owner: Uuid, task_id: Uuid, kind: ChangeKind) {
        let change = BoardChange::now(owner, task_id, kind);
        if let Err(e) = self.publisher.publish(&change).await {
            tracing::warn!(
                owner_id = %owner,
                task_id = %task_id,
                error = %e,
                "Failed to publish board change; subscribers will catch up on the next one"
            );
        }
    }

    async fn load_board(pool: &PgPool, owner: Uuid) -> Result<Board, StoreError> {
        let tasks = Task::list_by_owner(pool, owner)
            .await
            .map_err(|e| StoreError::Subscription(format!("failed to load board: {}", e)))?;
        Ok(Board::project(&tasks))
    }

    /// Body of one subscription's tokio task
    async fn run_subscription(
        pool: PgPool,
        listener: ChangeListener,
        owner: Uuid,
        tx: mpsc::UnboundedSender<Snapshot>,
        cancel: CancellationToken,
    ) {
        // Resolve the tail before the initial load so a change landing
        // between the two is picked up by the first XREAD.
        let mut last_id = match listener.current_tail(owner).await {
            Ok(id) => id,
            Err(e) => {
                let _ = tx.send(Err(StoreError::Subscription(format!(
                    "failed to open change feed: {}",
                    e
                ))));
                return;
            }
        };

        if tx.send(Self::load_board(&pool, owner).await).is_err() {
            return;
        }

        loop {
            let changes = tokio::select! {
                _ = cancel.cancelled() => break,
                result = listener.wait_for_changes(owner, &last_id, BLOCK_MS) => match result {
                    Ok(changes) => changes,
                    Err(e) => {
                        if tx
                            .send(Err(StoreError::Subscription(format!(
                                "change feed read failed: {}",
                                e
                            ))))
                            .is_err()
                        {
                            break;
                        }
                        tokio::time::sleep(ERROR_BACKOFF).await;
                        continue;
                    }
                },
            };

            if changes.is_empty() {
                continue;
            }
            if let Some((stream_id, _)) = changes.last() {
                last_id = stream_id.clone();
            }

            if tx.send(Self::load_board(&pool, owner).await).is_err() {
                break;
            }
        }

        tracing::debug!(owner_id = %owner, "Board subscription closed");
    }
}

#[async_trait]
impl TaskStore for LiveStore {
    async fn subscribe(&self, owner: Uuid) -> BoardSubscription {
        if let Err(e) = ensure_owner(owner) {
            return BoardSubscription::failed(e);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = BoardSubscription::new(rx, CancellationToken::new());

        tokio::spawn(Self::run_subscription(
            self.pool.clone(),
            self.listener.clone(),
            owner,
            tx,
            subscription.cancel_token(),
        ));

        subscription
    }

    async fn create(&self, owner: Uuid, task: NewTask) -> StoreResult<Task> {
        validate_new_task(owner, &task)?;

        let task = Task::insert(&self.pool, owner, task)
            .await
            .map_err(|e| StoreError::Mutation(format!("create failed: {}", e)))?;

        self.notify(owner, task.id, ChangeKind::Created).await;
        Ok(task)
    }

    async fn update(&self, owner: Uuid, task_id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        ensure_owner(owner)?;
        ensure_task_id(task_id)?;

        let patch = patch.normalize();
        let task = Task::apply_patch(&self.pool, task_id, owner, patch)
            .await
            .map_err(|e| StoreError::Mutation(format!("update failed: {}", e)))?
            .ok_or_else(|| StoreError::Mutation(format!("task {} not found", task_id)))?;

        self.notify(owner, task.id, ChangeKind::Updated).await;
        Ok(task)
    }

    async fn delete(&self, task_id: Uuid) -> StoreResult<()> {
        ensure_task_id(task_id)?;

        // The owner is needed for the change stream; an absent task means
        // there is nothing to delete and nothing to notify.
        let Some(task) = Task::find_by_id(&self.pool, task_id)
            .await
            .map_err(|e| StoreError::Mutation(format!("delete lookup failed: {}", e)))?
        else {
            return Ok(());
        };

        Task::delete(&self.pool, task_id)
            .await
            .map_err(|e| StoreError::Mutation(format!("delete failed: {}", e)))?;

        self.notify(task.user_id, task_id, ChangeKind::Deleted).await;
        Ok(())
    }
}
