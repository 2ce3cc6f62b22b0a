/// Board endpoints: snapshot and SSE live query
///
/// The live query is a full-snapshot feed: the stream opens with the
/// current board, then emits a complete fresh board after every change
/// notification on the owner's stream - never a delta. The projector
/// therefore always works from a consistent whole, and a dropped SSE
/// connection costs nothing but a reconnect.
///
/// # Endpoints
///
/// - `GET /v1/board` - Current projected board snapshot
/// - `GET /v1/board/stream` - SSE live query
///
/// # SSE Event Format
///
/// ```text
/// event: board
/// data: {"columns":[{"id":"todo","title":"To Do","tasks":[...]}, ...]}
///
/// event: heartbeat
/// data: {"alive":true}
/// ```
///
/// # Example
///
/// ```bash
/// curl -N -H "Authorization: Bearer <token>" \
///   "http://localhost:8080/v1/board/stream"
/// ```

use crate::{app::AppState, error::ApiError, error::ApiResult};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use driftboard_shared::auth::AuthContext;
use driftboard_shared::models::{Board, Task};
use driftboard_shared::redis::ChangeListener;
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use sqlx::PgPool;
use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;

/// How long one XREAD BLOCK waits before emitting a heartbeat (ms)
const BLOCK_MS: usize = 5000;

/// SSE heartbeat payload
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatData {
    pub alive: bool,
}

/// Returns the current projected board snapshot
pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Board>> {
    let tasks = Task::list_by_owner(&state.db, auth.user_id).await?;
    Ok(Json(Board::project(&tasks)))
}

/// Streams full board snapshots over SSE
///
/// # Flow
///
/// 1. Resolve the change stream's current tail (before the initial load,
///    so a write landing in between is still picked up)
/// 2. Emit the initial full snapshot
/// 3. Block on the change stream; on wake-up, re-query the complete task
///    set, project, and emit the fresh board
/// 4. Emit heartbeats while the stream is quiet
///
/// The stream ends on a feed or query error; SSE clients reconnect and get
/// a fresh initial snapshot, which is always complete.
///
/// # Errors
///
/// - `503 Service Unavailable`: the change feed cannot be opened
pub async fn stream_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let owner = auth.user_id;

    tracing::info!(owner_id = %owner, "Opening board stream");

    let tail = state.listener.current_tail(owner).await.map_err(|e| {
        ApiError::ServiceUnavailable(format!("Failed to open board change feed: {}", e))
    })?;

    let tasks = Task::list_by_owner(&state.db, owner).await?;
    let initial = board_event(&Board::project(&tasks));

    let live = live_snapshots(state.db.clone(), state.listener.clone(), owner, tail);
    let combined = stream::iter(vec![Ok::<_, Infallible>(initial)]).chain(live);

    Ok(Sse::new(combined).keep_alive(KeepAlive::new().interval(Duration::from_secs(25))))
}

/// The live tail: one fresh full snapshot per change, heartbeats in between
fn live_snapshots(
    db: PgPool,
    listener: ChangeListener,
    owner: Uuid,
    tail: String,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        (db, listener, tail),
        move |(db, listener, last_id)| async move {
            match listener.wait_for_changes(owner, &last_id, BLOCK_MS).await {
                Ok(changes) if changes.is_empty() => {
                    // Quiet stream; let the client know we are alive.
                    Some((Ok(heartbeat_event()), (db, listener, last_id)))
                }
                Ok(changes) => {
                    let next_id = changes
                        .last()
                        .map(|(stream_id, _)| stream_id.clone())
                        .unwrap_or(last_id);

                    match Task::list_by_owner(&db, owner).await {
                        Ok(tasks) => Some((
                            Ok(board_event(&Board::project(&tasks))),
                            (db, listener, next_id),
                        )),
                        Err(e) => {
                            tracing::error!(
                                owner_id = %owner,
                                error = %e,
                                "Board re-query failed, closing stream"
                            );
                            None
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        owner_id = %owner,
                        error = %e,
                        "Change feed read failed, closing stream"
                    );
                    None
                }
            }
        },
    )
}

fn board_event(board: &Board) -> Event {
    Event::default().event("board").json_data(board).unwrap()
}

fn heartbeat_event() -> Event {
    Event::default()
        .event("heartbeat")
        .json_data(HeartbeatData { alive: true })
        .unwrap()
}
