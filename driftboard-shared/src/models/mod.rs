/// Data models
///
/// - `task`: tasks, the status/column pair, and the mutation normalizer
/// - `board`: the derived three-column board view and its projector
/// - `user`: user accounts owning the tasks

pub mod board;
pub mod task;
pub mod user;

pub use board::{Board, Column, ColumnId};
pub use task::{NewTask, Priority, Task, TaskPatch, TaskStatus};
pub use user::{AuthProvider, CreateUser, User};
