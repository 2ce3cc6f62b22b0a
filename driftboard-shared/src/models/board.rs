/// Board projection
///
/// A board is never stored: it is a pure view derived from the flat,
/// owner-scoped task collection on every snapshot. The projection partitions
/// tasks into the three fixed columns in a single pass, preserving arrival
/// order within each column.
///
/// Column membership is a dual check: `status` decides first, and only a
/// task whose status somehow matches no column is classified by its
/// `column_id` string. This resolves legacy records where a write updated
/// only one of the two fields - a task with `status: done` but
/// `column_id: todo` lands in the Done column, never in both.
///
/// # Example
///
/// ```
/// use driftboard_shared::models::board::{Board, ColumnId};
///
/// let board = Board::empty();
/// assert_eq!(board.columns.len(), 3);
/// assert_eq!(board.columns[0].id, ColumnId::Todo);
/// assert!(board.columns.iter().all(|c| c.tasks.is_empty()));
/// ```

use crate::models::task::{Task, TaskStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one of the three fixed board columns
///
/// Columns are not user-creatable; this enumeration is the whole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnId {
    Todo,
    InProgress,
    Done,
}

impl ColumnId {
    /// The fixed column order of every board
    pub const ALL: [ColumnId; 3] = [ColumnId::Todo, ColumnId::InProgress, ColumnId::Done];

    /// Wire string form ("todo", "in-progress", "done")
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnId::Todo => "todo",
            ColumnId::InProgress => "in-progress",
            ColumnId::Done => "done",
        }
    }

    /// Display label shown as the column header
    pub fn title(&self) -> &'static str {
        match self {
            ColumnId::Todo => "To Do",
            ColumnId::InProgress => "In Progress",
            ColumnId::Done => "Done",
        }
    }

    /// The status a task dropped on this column receives
    ///
    /// The identity mapping restricted to the three valid ids.
    pub fn status(&self) -> TaskStatus {
        match self {
            ColumnId::Todo => TaskStatus::Todo,
            ColumnId::InProgress => TaskStatus::InProgress,
            ColumnId::Done => TaskStatus::Done,
        }
    }

    /// The column a task with this status belongs to
    pub fn from_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => ColumnId::Todo,
            TaskStatus::InProgress => ColumnId::InProgress,
            TaskStatus::Done => ColumnId::Done,
        }
    }

    /// Parses a column id string, falling back to `Todo` for unknown ids
    pub fn parse_or_todo(s: &str) -> Self {
        match s {
            "in-progress" => ColumnId::InProgress,
            "done" => ColumnId::Done,
            _ => ColumnId::Todo,
        }
    }
}

/// One bucket of the board view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Fixed column identifier
    pub id: ColumnId,

    /// Display label
    pub title: String,

    /// Member tasks in arrival order
    pub tasks: Vec<Task>,
}

impl Column {
    fn empty(id: ColumnId) -> Self {
        Column {
            id,
            title: id.title().to_string(),
            tasks: Vec::new(),
        }
    }
}

/// Derived three-column view of one owner's tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Always exactly three columns, in [todo, in-progress, done] order
    pub columns: Vec<Column>,
}

impl Board {
    /// The board with three empty columns - what a subscriber with zero
    /// tasks sees
    pub fn empty() -> Self {
        Board {
            columns: ColumnId::ALL.iter().map(|&id| Column::empty(id)).collect(),
        }
    }

    /// Projects a flat task set into the three-column view
    ///
    /// Pure and total: the same input always yields the same board. Each
    /// task lands in exactly one column - `status` decides, `column_id` is
    /// the fallback for records whose status matches no column. A task
    /// matching neither is dropped from the view (cannot happen for records
    /// written through the normalizer).
    pub fn project(tasks: &[Task]) -> Self {
        let mut board = Board::empty();

        for task in tasks {
            if let Some(column_id) = Self::classify(task) {
                let slot = column_id as usize;
                board.columns[slot].tasks.push(task.clone());
            }
        }

        board
    }

    /// Dual-check membership: status first, column_id as fallback
    fn classify(task: &Task) -> Option<ColumnId> {
        for &column in ColumnId::ALL.iter() {
            if task.status == column.status() {
                return Some(column);
            }
        }
        for &column in ColumnId::ALL.iter() {
            if task.column_id == column.as_str() {
                return Some(column);
            }
        }
        None
    }

    /// Looks a task up across all columns (used when a drag starts)
    pub fn find_task(&self, id: Uuid) -> Option<&Task> {
        self.columns
            .iter()
            .flat_map(|column| column.tasks.iter())
            .find(|task| task.id == id)
    }

    /// The column currently holding the given task
    pub fn column_of(&self, id: Uuid) -> Option<ColumnId> {
        self.columns
            .iter()
            .find(|column| column.tasks.iter().any(|task| task.id == id))
            .map(|column| column.id)
    }

    /// Total number of tasks across all columns
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|column| column.tasks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::Priority;
    use chrono::Utc;

    fn task(title: &str, status: TaskStatus, column_id: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            status,
            column_id: column_id.to_string(),
            priority: Priority::Medium,
            assignee: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_board_shape() {
        let board = Board::empty();

        assert_eq!(board.columns.len(), 3);
        assert_eq!(board.columns[0].id, ColumnId::Todo);
        assert_eq!(board.columns[0].title, "To Do");
        assert_eq!(board.columns[1].id, ColumnId::InProgress);
        assert_eq!(board.columns[1].title, "In Progress");
        assert_eq!(board.columns[2].id, ColumnId::Done);
        assert_eq!(board.columns[2].title, "Done");
        assert!(board.columns.iter().all(|c| c.tasks.is_empty()));
    }

    #[test]
    fn test_projection_partitions_without_loss_or_duplication() {
        let tasks = vec![
            task("a", TaskStatus::Todo, "todo"),
            task("b", TaskStatus::InProgress, "in-progress"),
            task("c", TaskStatus::Done, "done"),
            task("d", TaskStatus::Todo, "todo"),
        ];

        let board = Board::project(&tasks);

        assert_eq!(board.task_count(), tasks.len());
        for t in &tasks {
            let holders = board
                .columns
                .iter()
                .filter(|c| c.tasks.iter().any(|m| m.id == t.id))
                .count();
            assert_eq!(holders, 1, "task {} must live in exactly one column", t.title);
        }
        assert_eq!(board.columns[0].tasks.len(), 2);
        assert_eq!(board.columns[1].tasks.len(), 1);
        assert_eq!(board.columns[2].tasks.len(), 1);
    }

    #[test]
    fn test_projection_preserves_arrival_order() {
        let tasks = vec![
            task("first", TaskStatus::Todo, "todo"),
            task("second", TaskStatus::Todo, "todo"),
            task("third", TaskStatus::Todo, "todo"),
        ];

        let board = Board::project(&tasks);
        let titles: Vec<&str> = board.columns[0]
            .tasks
            .iter()
            .map(|t| t.title.as_str())
            .collect();

        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_skewed_legacy_record_classified_by_status() {
        // Pre-existing data skew: a write updated status but not column_id.
        let skewed = task("legacy", TaskStatus::Done, "todo");
        let board = Board::project(&[skewed]);

        assert_eq!(board.columns[2].tasks.len(), 1, "status takes precedence");
        assert!(board.columns[0].tasks.is_empty(), "must not also appear in todo");
    }

    #[test]
    fn test_projection_is_deterministic() {
        let tasks = vec![
            task("a", TaskStatus::Todo, "todo"),
            task("b", TaskStatus::Done, "done"),
        ];

        assert_eq!(Board::project(&tasks), Board::project(&tasks));
    }

    #[test]
    fn test_find_task_and_column_of() {
        let t = task("find-me", TaskStatus::InProgress, "in-progress");
        let id = t.id;
        let board = Board::project(&[t]);

        assert_eq!(board.find_task(id).map(|t| t.title.as_str()), Some("find-me"));
        assert_eq!(board.column_of(id), Some(ColumnId::InProgress));
        assert_eq!(board.find_task(Uuid::new_v4()), None);
        assert_eq!(board.column_of(Uuid::new_v4()), None);
    }

    #[test]
    fn test_column_id_status_identity_mapping() {
        for column in ColumnId::ALL {
            assert_eq!(ColumnId::from_status(column.status()), column);
            assert_eq!(column.status().as_str(), column.as_str());
        }
    }

    #[test]
    fn test_parse_or_todo_fallback() {
        assert_eq!(ColumnId::parse_or_todo("done"), ColumnId::Done);
        assert_eq!(ColumnId::parse_or_todo("in-progress"), ColumnId::InProgress);
        assert_eq!(ColumnId::parse_or_todo("swimlane-7"), ColumnId::Todo);
    }
}
