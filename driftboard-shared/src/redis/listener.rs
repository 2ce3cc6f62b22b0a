/// Board change listener
///
/// Tails an owner's board stream for live subscriptions. A subscription
/// resolves the stream's current tail once, then blocks on XREAD from that
/// concrete position - so notifications landing between polls are never
/// skipped, without any consumer-group machinery.
///
/// ```text
/// Redis Stream (board:{owner_id})
///     │
///     ├──▶ current_tail():   XREVRANGE board:{owner} + - COUNT 1
///     │                      Returns: position to start tailing from
///     │
///     └──▶ wait_for_changes(): XREAD BLOCK {ms} STREAMS board:{owner} {last_id}
///                              Returns: new notifications, or empty on timeout
/// ```
///
/// # Example
///
/// ```no_run
/// use driftboard_shared::redis::client::{RedisClient, RedisConfig};
/// use driftboard_shared::redis::listener::ChangeListener;
/// use uuid::Uuid;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let listener = ChangeListener::new(client);
/// let owner = Uuid::new_v4();
///
/// let mut last_id = listener.current_tail(owner).await?;
/// loop {
///     let changes = listener.wait_for_changes(owner, &last_id, 5000).await?;
///     for (stream_id, change) in changes {
///         println!("Board changed: {:?}", change.kind);
///         last_id = stream_id;
///     }
/// }
/// # Ok(())
/// # }
/// ```

use crate::events::serialization::{board_stream_key, deserialize_change, SerializationError};
use crate::events::BoardChange;
use crate::redis::client::{RedisClient, RedisClientError};
use redis::streams::{StreamRangeReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Maximum notifications drained per wake-up
const READ_BATCH: usize = 64;

/// Listener errors
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Redis client error
    #[error("Redis error: {0}")]
    RedisError(#[from] RedisClientError),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] SerializationError),

    /// Raw Redis error
    #[error("Redis command error: {0}")]
    RedisCommandError(#[from] redis::RedisError),
}

/// Tails per-owner board change streams
#[derive(Clone)]
pub struct ChangeListener {
    client: RedisClient,
}

impl ChangeListener {
    /// Creates a new listener over an existing client
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Resolves the current tail position of an owner's stream
    ///
    /// Returns "0-0" for an empty or missing stream, otherwise the ID of the
    /// newest entry. Tailing from this position delivers exactly the changes
    /// that happen after the call.
    pub async fn current_tail(&self, owner_id: Uuid) -> Result<String, ListenerError> {
        let stream_key = board_stream_key(owner_id);
        let mut conn = self.client.get_connection();

        let reply: StreamRangeReply = conn.xrevrange_count(&stream_key, "+", "-", 1).await?;

        Ok(reply
            .ids
            .first()
            .map(|entry| entry.id.clone())
            .unwrap_or_else(|| "0-0".to_string()))
    }

    /// Blocks until new changes arrive after `last_id`, or the timeout lapses
    ///
    /// # Returns
    ///
    /// (stream_id, change) pairs in arrival order; empty on timeout. Pass
    /// the last returned stream_id into the next call.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails; malformed entries are skipped
    /// with a log line rather than poisoning the subscription.
    pub async fn wait_for_changes(
        &self,
        owner_id: Uuid,
        last_id: &str,
        block_ms: usize,
    ) -> Result<Vec<(String, BoardChange)>, ListenerError> {
        let stream_key = board_stream_key(owner_id);
        let mut conn = self.client.get_connection();

        let opts = StreamReadOptions::default().count(READ_BATCH).block(block_ms);
        let reply: StreamReadReply = conn
            .xread_options(&[&stream_key], &[last_id], &opts)
            .await?;

        let mut changes = Vec::new();

        for stream_key_result in reply.keys {
            for entry in stream_key_result.ids {
                let stream_id = entry.id;

                let fields: HashMap<String, String> = entry
                    .map
                    .into_iter()
                    .filter_map(|(k, v)| {
                        let value = redis::from_redis_value::<String>(&v).ok()?;
                        Some((k, value))
                    })
                    .collect();

                match deserialize_change(&fields) {
                    Ok(change) => changes.push((stream_id, change)),
                    Err(e) => {
                        tracing::error!(
                            owner_id = %owner_id,
                            stream_id = %stream_id,
                            error = %e,
                            "Failed to deserialize board change, skipping"
                        );
                    }
                }
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BoardChange, ChangeKind};
    use crate::redis::client::RedisConfig;
    use crate::redis::publisher::ChangePublisher;

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_tail_then_receive_published_change() {
        let client = RedisClient::new(RedisConfig::default_for_test())
            .await
            .unwrap();
        let listener = ChangeListener::new(client.clone());
        let publisher = ChangePublisher::new(client);

        let owner = Uuid::new_v4();
        let tail = listener.current_tail(owner).await.unwrap();
        assert_eq!(tail, "0-0", "fresh stream starts empty");

        let change = BoardChange::now(owner, Uuid::new_v4(), ChangeKind::Updated);
        publisher.publish(&change).await.unwrap();

        let received = listener.wait_for_changes(owner, &tail, 1000).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].1, change);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_wait_times_out_empty() {
        let client = RedisClient::new(RedisConfig::default_for_test())
            .await
            .unwrap();
        let listener = ChangeListener::new(client);

        let owner = Uuid::new_v4();
        let changes = listener
            .wait_for_changes(owner, "0-0", 100)
            .await
            .unwrap();
        assert!(changes.is_empty());
    }
}
