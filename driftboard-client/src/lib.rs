//! # Driftboard Client Core
//!
//! The interaction core of the task board: the store adapter contract with
//! its in-memory and live implementations, the drag-and-drop controller,
//! the task dialog form buffer, and the auth session gateway.
//!
//! ## Module Organization
//!
//! - `store`: the `TaskStore` contract, board subscriptions, and the
//!   memory/live implementations
//! - `drag`: the single-gesture drag state machine
//! - `dialog`: the create/edit form buffer
//! - `session`: the consumed authentication collaborator
//!
//! The board itself is never mutated locally: every view is re-derived from
//! the latest store snapshot, so local state can never diverge from the
//! store for longer than one refresh.

pub mod dialog;
pub mod drag;
pub mod session;
pub mod store;

pub use dialog::TaskForm;
pub use drag::{DragController, DragOutcome};
pub use session::{AuthGateway, CurrentUser, HttpAuthGateway};
pub use store::{BoardSubscription, LiveStore, MemoryStore, TaskStore};

/// Current version of the Driftboard client core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
