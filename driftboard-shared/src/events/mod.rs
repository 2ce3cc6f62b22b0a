/// Board change events
///
/// Every task mutation publishes a [`BoardChange`] to the owner's board
/// stream. Changes are notifications, not deltas: a subscriber reacts to one
/// by re-querying the complete task set and projecting a fresh board, so a
/// missed or reordered notification can never leave a stale partial view:
/// the next snapshot is always whole.
///
/// # Example
///
/// ```
/// use driftboard_shared::events::{board_stream_key, BoardChange, ChangeKind};
/// use uuid::Uuid;
///
/// let change = BoardChange::now(Uuid::new_v4(), Uuid::new_v4(), ChangeKind::Updated);
/// let key = board_stream_key(change.owner_id);
/// assert!(key.starts_with("board:"));
/// ```

pub mod serialization;

pub use serialization::{
    board_stream_key, deserialize_change, serialize_change, SerializationError,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A task was inserted
    Created,

    /// A task's fields were patched
    Updated,

    /// A task was removed
    Deleted,
}

impl ChangeKind {
    /// Stream field string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }

    /// Parses the stream field string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(ChangeKind::Created),
            "updated" => Some(ChangeKind::Updated),
            "deleted" => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}

/// One change notification on an owner's board stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardChange {
    /// Whose board changed
    pub owner_id: Uuid,

    /// Which task changed
    pub task_id: Uuid,

    /// What happened
    pub kind: ChangeKind,

    /// When the change was published
    pub ts: DateTime<Utc>,
}

impl BoardChange {
    /// Builds a change stamped with the current time
    pub fn now(owner_id: Uuid, task_id: Uuid, kind: ChangeKind) -> Self {
        BoardChange {
            owner_id,
            task_id,
            kind,
            ts: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_roundtrip() {
        for kind in [ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted] {
            assert_eq!(ChangeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ChangeKind::parse("renamed"), None);
    }
}
