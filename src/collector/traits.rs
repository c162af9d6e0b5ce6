//! Core collector trait and errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::point::{Fields, Tags};

/// Errors that can occur while constructing a collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Connection settings could not be resolved.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Client or write path could not be created.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}

/// Sink for time-series points.
///
/// Implementations are shared across threads (`Arc<dyn StatsCollector>`).
///
/// # Error Handling Philosophy
///
/// Neither method returns an error. Delivery is fire-and-forget: a failed write
/// is the write path's concern and is surfaced through its logs and counters,
/// never to the caller recording a point.
pub trait StatsCollector: Send + Sync {
    /// Record one point.
    ///
    /// `namespace` names the measurement; `tags` and `fields` may be empty.
    fn store_point(&self, namespace: &str, tags: Tags, fields: Fields, timestamp: DateTime<Utc>);

    /// Release all resources held by the collector.
    fn close(&self);
}
