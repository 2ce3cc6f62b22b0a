/// Change serialization for Redis Streams
///
/// Redis Streams store entries as flat field-value string pairs, so a
/// [`BoardChange`](crate::events::BoardChange) is flattened into named
/// string fields for XADD and reassembled on read.
///
/// # Format
///
/// ```text
/// owner_id: "7b6f...-uuid"
/// task_id:  "550e...-uuid"
/// kind:     "updated"
/// ts:       "2026-08-07T12:00:00+00:00"
/// ```
///
/// # Stream Naming
///
/// One stream per owner: `board:{owner_id}`. Everything that mutates an
/// owner's tasks appends here; every live board subscription tails it.

use crate::events::{BoardChange, ChangeKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid field value
    #[error("Invalid field value for {field}: {error}")]
    InvalidValue { field: String, error: String },

    /// UUID parsing error
    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    /// Timestamp parsing error
    #[error("Timestamp error: {0}")]
    TimestampError(String),
}

/// Generates the Redis Stream key for an owner's board changes
///
/// # Example
///
/// ```
/// use driftboard_shared::events::serialization::board_stream_key;
/// use uuid::Uuid;
///
/// let key = board_stream_key(Uuid::nil());
/// assert_eq!(key, "board:00000000-0000-0000-0000-000000000000");
/// ```
pub fn board_stream_key(owner_id: Uuid) -> String {
    format!("board:{}", owner_id)
}

/// Serializes a change into Redis Stream field-value pairs (for XADD)
pub fn serialize_change(change: &BoardChange) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert("owner_id".to_string(), change.owner_id.to_string());
    fields.insert("task_id".to_string(), change.task_id.to_string());
    fields.insert("kind".to_string(), change.kind.as_str().to_string());
    fields.insert("ts".to_string(), change.ts.to_rfc3339());
    fields
}

/// Deserializes a change from Redis Stream field-value pairs
///
/// # Errors
///
/// Returns an error if a required field is missing or malformed.
pub fn deserialize_change(
    fields: &HashMap<String, String>,
) -> Result<BoardChange, SerializationError> {
    let owner_id_str = fields
        .get("owner_id")
        .ok_or_else(|| SerializationError::MissingField("owner_id".to_string()))?;
    let owner_id = Uuid::parse_str(owner_id_str)?;

    let task_id_str = fields
        .get("task_id")
        .ok_or_else(|| SerializationError::MissingField("task_id".to_string()))?;
    let task_id = Uuid::parse_str(task_id_str)?;

    let kind_str = fields
        .get("kind")
        .ok_or_else(|| SerializationError::MissingField("kind".to_string()))?;
    let kind = ChangeKind::parse(kind_str).ok_or_else(|| SerializationError::InvalidValue {
        field: "kind".to_string(),
        error: format!("unknown change kind '{}'", kind_str),
    })?;

    let ts_str = fields
        .get("ts")
        .ok_or_else(|| SerializationError::MissingField("ts".to_string()))?;
    let ts = DateTime::parse_from_rfc3339(ts_str)
        .map_err(|e| SerializationError::TimestampError(e.to_string()))?
        .with_timezone(&Utc);

    Ok(BoardChange {
        owner_id,
        task_id,
        kind,
        ts,
    })
}
