/// Task dialog form state
///
/// The local edit buffer behind the create/edit dialog. It accumulates
/// field edits while the dialog is open and, on save, turns into either a
/// [`NewTask`] (with a freshly generated client-side id) or a [`TaskPatch`]
/// for the task being edited. Nothing here talks to the store; the buffer
/// only shapes input for it.
///
/// # Example
///
/// ```
/// use driftboard_client::dialog::TaskForm;
/// use driftboard_shared::models::{Priority, TaskStatus};
///
/// let mut form = TaskForm::blank();
/// form.title = "Ship the feature".to_string();
/// form.priority = Priority::High;
///
/// let new_task = form.submit_new().unwrap();
/// assert_eq!(new_task.title, "Ship the feature");
/// assert!(!new_task.id.is_nil());
/// ```

use driftboard_shared::error::{StoreError, StoreResult};
use driftboard_shared::models::{NewTask, Priority, Task, TaskPatch, TaskStatus};
use uuid::Uuid;

/// Edit buffer for the task create/edit dialog
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    /// Task title; must be non-empty (after trimming) to submit
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Selected priority
    pub priority: Priority,

    /// Selected status/column
    pub status: TaskStatus,

    /// Assignee field; empty means unassigned
    pub assignee: String,

    /// The task being edited, if the dialog was opened on an existing card
    editing: Option<Uuid>,
}

impl TaskForm {
    /// Fresh buffer for the "New Task" dialog
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            assignee: String::new(),
            editing: None,
        }
    }

    /// Buffer seeded from an existing task for the edit dialog
    pub fn edit(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            assignee: task.assignee.clone().unwrap_or_default(),
            editing: Some(task.id),
        }
    }

    /// True when the dialog is editing rather than creating
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Checks the buffer is submittable
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidInput` for an empty (or whitespace-only) title.
    pub fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::invalid_input("task title must not be empty"));
        }
        Ok(())
    }

    /// Finalizes a create: validates and assigns the client-side id
    ///
    /// # Errors
    ///
    /// Propagates validation failures; also rejects a buffer opened in edit
    /// mode.
    pub fn submit_new(self) -> StoreResult<NewTask> {
        if self.editing.is_some() {
            return Err(StoreError::invalid_input(
                "edit buffer cannot create a new task",
            ));
        }
        self.validate()?;

        Ok(NewTask {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            status: self.status,
            priority: self.priority,
            assignee: normalize_assignee(self.assignee),
        })
    }

    /// Finalizes an edit into the target id and its patch
    ///
    /// The dialog saves every field it shows, the status among them - the
    /// store's normalizer mirrors it onto `column_id`.
    ///
    /// # Errors
    ///
    /// Propagates validation failures; also rejects a buffer opened in
    /// create mode.
    pub fn submit_edit(self) -> StoreResult<(Uuid, TaskPatch)> {
        let Some(task_id) = self.editing else {
            return Err(StoreError::invalid_input("no task is being edited"));
        };
        self.validate()?;

        let patch = TaskPatch {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description),
            priority: Some(self.priority),
            status: Some(self.status),
            assignee: normalize_assignee(self.assignee),
            ..TaskPatch::default()
        };

        Ok((task_id, patch))
    }
}

fn normalize_assignee(assignee: String) -> Option<String> {
    let trimmed = assignee.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
