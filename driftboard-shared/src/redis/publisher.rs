/// Board change publisher
///
/// Appends [`BoardChange`] notifications to the owner's board stream with
/// XADD. Streams are capped (approximate MAXLEN trim) because changes are
/// only wake-up signals: subscribers re-query the full task set on every
/// notification, so old entries have no replay value.
///
/// # Architecture
///
/// ```text
/// API handler / LiveStore mutation
///     │
///     │ publish()
///     ▼
/// ChangePublisher ── XADD board:{owner_id} ──▶ Redis Stream
///                                                │
///                                                ▼
///                                     board subscriptions (XREAD BLOCK)
/// ```
///
/// # Example
///
/// ```no_run
/// use driftboard_shared::events::{BoardChange, ChangeKind};
/// use driftboard_shared::redis::client::{RedisClient, RedisConfig};
/// use driftboard_shared::redis::publisher::ChangePublisher;
/// use uuid::Uuid;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let publisher = ChangePublisher::new(client);
///
/// let change = BoardChange::now(Uuid::new_v4(), Uuid::new_v4(), ChangeKind::Created);
/// let stream_id = publisher.publish(&change).await?;
/// println!("Published change with stream ID: {}", stream_id);
/// # Ok(())
/// # }
/// ```

use crate::events::serialization::{board_stream_key, serialize_change};
use crate::events::BoardChange;
use crate::redis::client::{RedisClient, RedisClientError};
use redis::{streams::StreamMaxlen, AsyncCommands};
use thiserror::Error;

/// Approximate per-owner stream cap; notifications carry no replay value
const STREAM_MAXLEN: usize = 1024;

/// Publisher errors
#[derive(Error, Debug)]
pub enum PublisherError {
    /// Redis client error
    #[error("Redis error: {0}")]
    RedisError(#[from] RedisClientError),

    /// Raw Redis error
    #[error("Redis command error: {0}")]
    RedisCommandError(#[from] redis::RedisError),
}

/// Publishes board change notifications to per-owner streams
#[derive(Clone)]
pub struct ChangePublisher {
    client: RedisClient,
}

impl ChangePublisher {
    /// Creates a new publisher over an existing client
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Appends a change to the owner's board stream
    ///
    /// # Returns
    ///
    /// The Redis Stream entry ID ("timestamp-sequence").
    ///
    /// # Errors
    ///
    /// Returns an error if the XADD fails. Failures are not retried: the
    /// mutation itself already committed, and the next successful publish
    /// triggers a full re-query that covers the missed one.
    pub async fn publish(&self, change: &BoardChange) -> Result<String, PublisherError> {
        let stream_key = board_stream_key(change.owner_id);
        let fields: Vec<(String, String)> = serialize_change(change).into_iter().collect();

        let mut conn = self.client.get_connection();
        let stream_id: String = conn
            .xadd_maxlen(&stream_key, StreamMaxlen::Approx(STREAM_MAXLEN), "*", &fields)
            .await?;

        tracing::debug!(
            owner_id = %change.owner_id,
            task_id = %change.task_id,
            kind = %change.kind.as_str(),
            stream_id = %stream_id,
            "Published board change"
        );

        Ok(stream_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use crate::redis::client::RedisConfig;
    use uuid::Uuid;

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_publish_returns_stream_id() {
        let client = RedisClient::new(RedisConfig::default_for_test())
            .await
            .unwrap();
        let publisher = ChangePublisher::new(client);

        let change = BoardChange::now(Uuid::new_v4(), Uuid::new_v4(), ChangeKind::Created);
        let stream_id = publisher.publish(&change).await.unwrap();

        assert!(stream_id.contains('-'), "stream ids look like ts-seq");
    }
}
