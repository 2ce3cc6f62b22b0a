/// Task CRUD endpoints
///
/// All routes require a bearer access token and scope every query by the
/// authenticated owner - a task belonging to someone else is
/// indistinguishable from a missing one. Every successful mutation appends
/// a change notification to the owner's board stream, which is what drives
/// live board subscriptions.
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List the caller's tasks (arrival order)
/// - `POST   /v1/tasks` - Create a task (client-supplied id)
/// - `PATCH  /v1/tasks/:id` - Partially update a task
/// - `DELETE /v1/tasks/:id` - Delete a task

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use driftboard_shared::{
    auth::AuthContext,
    events::{BoardChange, ChangeKind},
    models::{NewTask, Priority, Task, TaskPatch, TaskStatus},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create task request
///
/// The id is client-generated so the caller can reference the task before
/// the round-trip completes. `status` and `column_id` follow the normalizer
/// precedence: status wins, either propagates to the other, neither means
/// todo.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Client-generated task ID
    pub id: Uuid,

    /// Title (non-empty)
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Description (may be empty)
    #[serde(default)]
    pub description: String,

    /// Initial status
    #[serde(default)]
    pub status: Option<TaskStatus>,

    /// Initial column id (used only when status is absent)
    #[serde(default)]
    pub column_id: Option<String>,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: Option<Priority>,

    /// Optional assignee
    #[serde(default)]
    #[validate(length(max = 255, message = "Assignee must be at most 255 characters"))]
    pub assignee: Option<String>,
}

impl CreateTaskRequest {
    /// Resolves the status/column pair with status precedence
    fn resolved_status(&self) -> TaskStatus {
        self.status
            .or_else(|| {
                self.column_id
                    .as_deref()
                    .map(TaskStatus::from_column_id)
            })
            .unwrap_or(TaskStatus::Todo)
    }
}

/// Publishes a change notification for a committed write
///
/// The row is already persisted; a publish failure costs subscribers one
/// refresh, so it is logged rather than failing the request.
async fn notify(state: &AppState, owner: Uuid, task_id: Uuid, kind: ChangeKind) {
    let change = BoardChange::now(owner, task_id, kind);
    if let Err(e) = state.publisher.publish(&change).await {
        tracing::warn!(
            owner_id = %owner,
            task_id = %task_id,
            error = %e,
            "Failed to publish board change"
        );
    }
}

/// Lists the caller's tasks in arrival order
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_owner(&state.db, auth.user_id).await?;
    Ok(Json(tasks))
}

/// Creates a task with its client-supplied id
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation failed
/// - `400 Bad Request`: nil task id
/// - `409 Conflict`: id already exists
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_errors)?;

    if req.id.is_nil() {
        return Err(ApiError::BadRequest("Task id must not be nil".to_string()));
    }

    let status = req.resolved_status();
    let task = Task::insert(
        &state.db,
        auth.user_id,
        NewTask {
            id: req.id,
            title: req.title.trim().to_string(),
            description: req.description,
            status,
            priority: req.priority.unwrap_or(Priority::Medium),
            assignee: req.assignee,
        },
    )
    .await?;

    notify(&state, auth.user_id, task.id, ChangeKind::Created).await;

    tracing::info!(task_id = %task.id, owner_id = %auth.user_id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially updates one of the caller's tasks
///
/// The patch runs through the normalizer before persistence, so the
/// status/column pair can never be written skewed. Untouched fields are
/// preserved.
///
/// # Errors
///
/// - `404 Not Found`: no such task for this owner
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    if let Some(title) = patch.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
    }

    let patch = patch.normalize();
    let task = Task::apply_patch(&state.db, task_id, auth.user_id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    notify(&state, auth.user_id, task.id, ChangeKind::Updated).await;

    tracing::info!(task_id = %task.id, owner_id = %auth.user_id, "Task updated");
    Ok(Json(task))
}

/// Deletes one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: no such task for this owner
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id_and_owner(&state.db, task_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Task::delete(&state.db, task.id).await?;
    notify(&state, auth.user_id, task.id, ChangeKind::Deleted).await;

    tracing::info!(task_id = %task.id, owner_id = %auth.user_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
