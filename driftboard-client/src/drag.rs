/// Drag interaction controller
///
/// State machine over one drag gesture, from picking a card up to releasing
/// it. Gesture recognition is single-pointer, so at most one task is active
/// at a time; the controller owns that one piece of interaction state and
/// nothing else - the board itself is always re-derived from store
/// snapshots, never mutated locally.
///
/// ```text
///            begin_drag(board, id)
///   Idle ──────────────────────────▶ Dragging(task)
///    ▲                                   │
///    │   complete_drag(target)           │ drag_over(column)
///    │   cancel_drag()                   │   (visual feedback only,
///    └───────────────────────────────────┘    never a mutation)
/// ```
///
/// On drop, at most **one** store update is issued, and only when the
/// target column differs from the task's current column. The active-task
/// copy (used for overlay rendering) is cleared unconditionally - on
/// commit, on no-op, on cancellation, and on a failed update alike. A
/// failed update changes nothing remotely, so the next snapshot simply
/// shows the card where it always was.
///
/// # Example
///
/// ```no_run
/// use driftboard_client::drag::{DragController, DragOutcome};
/// use driftboard_client::store::{memory::MemoryStore, TaskStore};
/// use driftboard_shared::models::ColumnId;
/// use uuid::Uuid;
///
/// # async fn example(
/// #     store: MemoryStore,
/// #     owner: Uuid,
/// #     task_id: Uuid,
/// # ) -> Result<(), driftboard_shared::error::StoreError> {
/// let mut sub = store.subscribe(owner).await;
/// let board = sub.recv().await.unwrap()?;
///
/// let mut drag = DragController::new();
/// drag.begin_drag(&board, task_id);
/// drag.drag_over(Some(ColumnId::Done));
///
/// let outcome = drag.complete_drag(&store, owner, Some(ColumnId::Done)).await?;
/// assert!(matches!(outcome, DragOutcome::Moved(_)));
/// # Ok(())
/// # }
/// ```

use crate::store::TaskStore;
use driftboard_shared::error::StoreResult;
use driftboard_shared::models::{Board, ColumnId, Task, TaskPatch};
use uuid::Uuid;

/// What a completed drop did
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The task moved columns; carries the updated task from the store
    Moved(Task),

    /// Dropped back onto its current column - no mutation issued
    SameColumn,

    /// Released outside any column - no mutation issued
    NoTarget,

    /// No drag was in progress
    NotDragging,
}

struct ActiveDrag {
    task: Task,
    hover: Option<ColumnId>,
}

/// Tracks the single in-flight drag gesture
#[derive(Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

impl DragController {
    /// Creates an idle controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a task up from the current board
    ///
    /// Retains a copy of the task for overlay rendering. Returns false (and
    /// stays idle) if the id is not on the board - a drop event for a card
    /// that vanished under the pointer.
    pub fn begin_drag(&mut self, board: &Board, task_id: Uuid) -> bool {
        match board.find_task(task_id) {
            Some(task) => {
                self.active = Some(ActiveDrag {
                    task: task.clone(),
                    hover: None,
                });
                true
            }
            None => {
                tracing::debug!(task_id = %task_id, "Drag start for unknown task ignored");
                false
            }
        }
    }

    /// Records the column currently under the pointer
    ///
    /// Purely visual: crossing column boundaries mid-drag never mutates
    /// anything. `None` means the pointer left all columns. Ignored while
    /// idle.
    pub fn drag_over(&mut self, column: Option<ColumnId>) {
        if let Some(active) = self.active.as_mut() {
            active.hover = column;
        }
    }

    /// The task being dragged, for overlay rendering
    pub fn active_task(&self) -> Option<&Task> {
        self.active.as_ref().map(|a| &a.task)
    }

    /// The column currently highlighted as a drop target
    pub fn hover_target(&self) -> Option<ColumnId> {
        self.active.as_ref().and_then(|a| a.hover)
    }

    /// True while a gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Drops the task, issuing at most one store update
    ///
    /// The update carries the canonical `{status, column_id}` pair for the
    /// target column and goes through the store's normalizer. Interaction
    /// state is cleared before the store call, so the overlay disappears
    /// whether or not the write succeeds.
    ///
    /// # Errors
    ///
    /// Propagates the store error from a failed update; the board is left to
    /// the next snapshot, which the failed write did not affect.
    pub async fn complete_drag<S>(
        &mut self,
        store: &S,
        owner: Uuid,
        target: Option<ColumnId>,
    ) -> StoreResult<DragOutcome>
    where
        S: TaskStore + ?Sized,
    {
        let Some(active) = self.active.take() else {
            return Ok(DragOutcome::NotDragging);
        };

        let Some(target) = target else {
            return Ok(DragOutcome::NoTarget);
        };

        let current = ColumnId::from_status(active.task.status);
        if target == current {
            return Ok(DragOutcome::SameColumn);
        }

        let patch = TaskPatch::move_to(target.status());
        let updated = store.update(owner, active.task.id, patch).await?;

        tracing::debug!(
            task_id = %updated.id,
            from = current.as_str(),
            to = target.as_str(),
            "Task moved between columns"
        );

        Ok(DragOutcome::Moved(updated))
    }

    /// Abandons the gesture (escape key) without any mutation
    pub fn cancel_drag(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use driftboard_shared::models::{NewTask, Priority, TaskStatus};

    async fn seeded_store() -> (MemoryStore, Uuid, Task, Board) {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let task = store
            .create(
                owner,
                NewTask {
                    id: Uuid::new_v4(),
                    title: "Draggable".to_string(),
                    description: String::new(),
                    status: TaskStatus::Todo,
                    priority: Priority::Medium,
                    assignee: None,
                },
            )
            .await
            .unwrap();

        let mut sub = store.subscribe(owner).await;
        let board = sub.recv().await.unwrap().unwrap();
        (store, owner, task, board)
    }

    #[tokio::test]
    async fn test_begin_drag_retains_overlay_copy() {
        let (_store, _owner, task, board) = seeded_store().await;
        let mut drag = DragController::new();

        assert!(drag.begin_drag(&board, task.id));
        assert!(drag.is_dragging());
        assert_eq!(drag.active_task().map(|t| t.id), Some(task.id));
    }

    #[tokio::test]
    async fn test_begin_drag_unknown_task_stays_idle() {
        let (_store, _owner, _task, board) = seeded_store().await;
        let mut drag = DragController::new();

        assert!(!drag.begin_drag(&board, Uuid::new_v4()));
        assert!(!drag.is_dragging());
    }

    #[tokio::test]
    async fn test_drag_over_is_visual_only() {
        let (store, _owner, task, board) = seeded_store().await;
        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);

        let before = store.mutation_count();
        drag.drag_over(Some(ColumnId::Done));
        drag.drag_over(Some(ColumnId::InProgress));
        drag.drag_over(None);
        drag.drag_over(Some(ColumnId::Done));

        assert_eq!(drag.hover_target(), Some(ColumnId::Done));
        assert_eq!(store.mutation_count(), before, "hovering never mutates");
    }

    #[tokio::test]
    async fn test_drop_on_new_column_issues_exactly_one_update() {
        let (store, owner, task, board) = seeded_store().await;
        let mut sub = store.subscribe(owner).await;
        let _ = sub.recv().await.unwrap().unwrap();

        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);

        let before = store.mutation_count();
        let outcome = drag
            .complete_drag(&store, owner, Some(ColumnId::Done))
            .await
            .unwrap();

        match outcome {
            DragOutcome::Moved(updated) => {
                assert_eq!(updated.status, TaskStatus::Done);
                assert_eq!(updated.column_id, "done");
            }
            other => panic!("expected Moved, got {:?}", other),
        }
        assert_eq!(store.mutation_count(), before + 1);
        assert!(!drag.is_dragging());

        // The next snapshot places the task in the done column.
        let board = sub.recv().await.unwrap().unwrap();
        assert_eq!(board.column_of(task.id), Some(ColumnId::Done));
        assert_eq!(board.columns[2].tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_on_same_column_is_a_no_op() {
        let (store, owner, task, board) = seeded_store().await;
        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);

        let before = store.mutation_count();
        let outcome = drag
            .complete_drag(&store, owner, Some(ColumnId::Todo))
            .await
            .unwrap();

        assert_eq!(outcome, DragOutcome::SameColumn);
        assert_eq!(store.mutation_count(), before, "zero mutations issued");
        assert!(!drag.is_dragging(), "overlay cleared regardless");
    }

    #[tokio::test]
    async fn test_drop_outside_any_column_is_a_no_op() {
        let (store, owner, task, board) = seeded_store().await;
        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);

        let before = store.mutation_count();
        let outcome = drag.complete_drag(&store, owner, None).await.unwrap();

        assert_eq!(outcome, DragOutcome::NoTarget);
        assert_eq!(store.mutation_count(), before);
        assert!(!drag.is_dragging());
    }

    #[tokio::test]
    async fn test_drop_without_active_drag() {
        let (store, owner, _task, _board) = seeded_store().await;
        let mut drag = DragController::new();

        let outcome = drag
            .complete_drag(&store, owner, Some(ColumnId::Done))
            .await
            .unwrap();
        assert_eq!(outcome, DragOutcome::NotDragging);
    }

    #[tokio::test]
    async fn test_cancel_clears_without_mutation() {
        let (store, _owner, task, board) = seeded_store().await;
        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);
        drag.drag_over(Some(ColumnId::Done));

        let before = store.mutation_count();
        drag.cancel_drag();

        assert!(!drag.is_dragging());
        assert_eq!(drag.hover_target(), None);
        assert_eq!(store.mutation_count(), before);
    }

    #[tokio::test]
    async fn test_failed_update_clears_overlay_and_leaves_board() {
        let (store, owner, task, board) = seeded_store().await;
        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);

        store.set_fail_mutations(true);
        let result = drag.complete_drag(&store, owner, Some(ColumnId::Done)).await;
        store.set_fail_mutations(false);

        assert!(result.is_err(), "the store error surfaces to the caller");
        assert!(!drag.is_dragging(), "overlay cleared even on failure");

        // The write never committed: a fresh snapshot still shows todo.
        let mut sub = store.subscribe(owner).await;
        let board = sub.recv().await.unwrap().unwrap();
        assert_eq!(board.column_of(task.id), Some(ColumnId::Todo));
    }

    #[tokio::test]
    async fn test_skewed_task_drag_uses_status_column_as_current() {
        // A legacy-skewed task (status done, column_id todo) renders in the
        // done column, so dropping it on done must be a no-op.
        let (store, owner, task, _board) = seeded_store().await;
        store
            .update(owner, task.id, TaskPatch::move_to(TaskStatus::Done))
            .await
            .unwrap();

        let mut sub = store.subscribe(owner).await;
        let board = sub.recv().await.unwrap().unwrap();

        let mut drag = DragController::new();
        drag.begin_drag(&board, task.id);
        let outcome = drag
            .complete_drag(&store, owner, Some(ColumnId::Done))
            .await
            .unwrap();
        assert_eq!(outcome, DragOutcome::SameColumn);
    }
}
