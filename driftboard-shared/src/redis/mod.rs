/// Redis layer
///
/// - `client`: connection-managed Redis client with health checks
/// - `publisher`: appends board change notifications to per-owner streams
/// - `listener`: tails a per-owner stream for live board subscriptions

pub mod client;
pub mod listener;
pub mod publisher;

pub use client::{RedisClient, RedisConfig};
pub use listener::ChangeListener;
pub use publisher::ChangePublisher;
