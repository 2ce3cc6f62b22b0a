/// Task model, mutation normalizer, and database operations
///
/// Tasks are the core entity of the board: each one lives in exactly one of
/// the three fixed columns, determined by its `status`. The wire format keeps
/// a denormalized `column_id` string alongside `status` for compatibility
/// with pre-existing records; the pair is kept coherent by
/// [`TaskPatch::normalize`], which every mutation path runs before
/// persistence, plus a weaker mirror-sync applied again at the SQL layer.
///
/// # Columns
///
/// ```text
/// todo ──▶ in-progress ──▶ done
///   ▲            │           │
///   └────────────┴───────────┘   (drag-drop moves are unrestricted)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in-progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     column_id VARCHAR(32) NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Task ids are client-generated (`Uuid::new_v4()` at the caller), so a task
/// can be referenced before the insert round-trip completes.
///
/// # Example
///
/// ```no_run
/// use driftboard_shared::models::task::{NewTask, Priority, Task, TaskStatus};
/// use driftboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let owner = Uuid::new_v4();
///
/// let task = Task::insert(&pool, owner, NewTask {
///     id: Uuid::new_v4(),
///     title: "Write the launch notes".to_string(),
///     description: String::new(),
///     status: TaskStatus::Todo,
///     priority: Priority::High,
///     assignee: None,
/// }).await?;
///
/// assert_eq!(task.column_id, "todo");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task status - doubles as the id of the column the task lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet
    Todo,

    /// Currently being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Wire/database string form ("todo", "in-progress", "done")
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    /// Strict parse of the wire form; `None` for anything unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in-progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Lossy parse of a column id, falling back to `Todo` for unknown ids
    ///
    /// The fixed column set makes the fallback unreachable in practice; it
    /// exists so a malformed `column_id` can never poison the status field.
    pub fn from_column_id(column_id: &str) -> Self {
        Self::parse(column_id).unwrap_or(TaskStatus::Todo)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Wire/database string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Task model representing one card on the board
///
/// Serializes in camelCase to match the persisted document layout
/// (`columnId`, `createdAt`, `userId`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID (client-generated UUID v4)
    pub id: Uuid,

    /// Owner of the task; immutable after creation
    pub user_id: Uuid,

    /// Title (non-empty)
    pub title: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// Current status; canonical source of the task's column
    pub status: TaskStatus,

    /// Denormalized mirror of `status` kept for wire compatibility
    ///
    /// Must equal `status.as_str()` for every record this system writes.
    /// Legacy records may be skewed; the board projector resolves the skew
    /// with status taking precedence.
    pub column_id: String,

    /// Priority level
    pub priority: Priority,

    /// Optional assignee display name
    pub assignee: Option<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// True if the denormalized pair is coherent
    pub fn is_coherent(&self) -> bool {
        self.column_id == self.status.as_str()
    }
}

/// Input for creating a new task
///
/// Carries the caller-assigned id; `column_id` is not accepted here - it is
/// derived from `status` at insert time, so a freshly created task can never
/// be skewed. Timestamps are set by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Client-generated task ID
    pub id: Uuid,

    /// Title (non-empty)
    pub title: String,

    /// Description (may be empty)
    #[serde(default)]
    pub description: String,

    /// Initial status / column
    pub status: TaskStatus,

    /// Priority level
    pub priority: Priority,

    /// Optional assignee
    #[serde(default)]
    pub assignee: Option<String>,
}

/// Partial update for an existing task
///
/// All fields are optional; only present fields are written. Run
/// [`TaskPatch::normalize`] before handing a patch to a store - it is the
/// single point that enforces the `status == column_id` invariant on writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// New status; wins over `column_id` when both are supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    /// New column id; propagates to `status` when supplied alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,

    /// New assignee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Modification timestamp, stamped by [`TaskPatch::normalize`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Canonicalizes the `status`/`column_id` pair and stamps `updated_at`
    ///
    /// Whichever of the two fields the caller supplied drives the other:
    ///
    /// - both supplied: `status` wins, `column_id` is rewritten to match
    /// - only `status`: `column_id` is filled in from it
    /// - only `column_id`: `status` is parsed from it (unknown ids fall back
    ///   to todo) and `column_id` is rewritten to the canonical form
    /// - neither: the pair is left untouched - the invariant is only at risk
    ///   when one of the two fields moves
    ///
    /// Applying `normalize` twice yields the same patch as applying it once,
    /// apart from `updated_at` advancing.
    pub fn normalize(mut self) -> Self {
        let canonical = match (self.status, self.column_id.as_deref()) {
            (Some(status), _) => Some(status),
            (None, Some(column_id)) => Some(TaskStatus::from_column_id(column_id)),
            (None, None) => None,
        };

        if let Some(status) = canonical {
            self.status = Some(status);
            self.column_id = Some(status.as_str().to_string());
        }

        self.updated_at = Some(Utc::now());
        self
    }

    /// True if no field is set (ignoring the timestamp)
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.column_id.is_none()
            && self.assignee.is_none()
    }

    /// Convenience constructor for the drag path: move a task to a column
    pub fn move_to(status: TaskStatus) -> Self {
        TaskPatch {
            status: Some(status),
            column_id: Some(status.as_str().to_string()),
            ..TaskPatch::default()
        }
    }
}

const TASK_COLUMNS: &str = "id, user_id, title, description, status, column_id, \
                            priority, assignee, created_at, updated_at";

impl Task {
    /// Inserts a new task for `owner`
    ///
    /// The caller supplies the id; `column_id` is derived from the status so
    /// the pair starts out coherent. Timestamps are set by the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (duplicate id, missing owner,
    /// connection loss).
    pub async fn insert(pool: &PgPool, owner: Uuid, data: NewTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, user_id, title, description, status, column_id, priority, assignee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.id)
        .bind(owner)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.status.as_str())
        .bind(data.priority)
        .bind(data.assignee)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID scoped to its owner
    ///
    /// Preferred for API handlers: a task belonging to someone else is
    /// indistinguishable from a missing one.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2",
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all tasks for an owner in arrival (creation) order
    ///
    /// This is the flat set every board snapshot is projected from; it must
    /// return the complete current set, never a page.
    pub async fn list_by_owner(pool: &PgPool, owner: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        ))
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update to a task scoped to its owner
    ///
    /// Only fields present in the patch are written; `updated_at` is always
    /// refreshed. If exactly one of `status`/`column_id` is present the
    /// mirror field is written too, a weaker second layer under the
    /// normalizer - callers are still expected to normalize first.
    ///
    /// Returns `None` if no task with this id belongs to `owner`.
    pub async fn apply_patch(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Mirror-sync the denormalized pair when only one side moved.
        let (status, column_id) = match (patch.status, patch.column_id) {
            (Some(status), _) => (Some(status), Some(status.as_str().to_string())),
            (None, Some(column_id)) => {
                (Some(TaskStatus::from_column_id(&column_id)), Some(column_id))
            }
            (None, None) => (None, None),
        };

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if patch.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if column_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", column_id = ${}", bind_count));
        }
        if patch.assignee.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(title) = patch.title {
            q = q.bind(title);
        }
        if let Some(description) = patch.description {
            q = q.bind(description);
        }
        if let Some(priority) = patch.priority {
            q = q.bind(priority);
        }
        if let Some(status) = status {
            q = q.bind(status);
        }
        if let Some(column_id) = column_id {
            q = q.bind(column_id);
        }
        if let Some(assignee) = patch.assignee {
            q = q.bind(assignee);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks for an owner
    pub async fn count_by_owner(pool: &PgPool, owner: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(owner)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
