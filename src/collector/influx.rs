//! Collector backed by a time-series client.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::client::{InfluxClient, TimeSeriesClient, WriteApi, WriteStats};
use crate::collector::{CollectorError, StatsCollector};
use crate::config::InfluxConfig;
use crate::point::{Fields, Point, Tags};

/// [`StatsCollector`] that forwards every point to a [`WriteApi`].
///
/// Owns exactly one client handle and one write path. Closing flushes the
/// write path before the client is released.
pub struct InfluxCollector<C: TimeSeriesClient = InfluxClient> {
    client: C,
    write_api: C::WriteApi,
    closed: AtomicBool,
}

impl<C: TimeSeriesClient> std::fmt::Debug for InfluxCollector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxCollector")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl InfluxCollector<InfluxClient> {
    /// Create a collector from settings in the process environment.
    ///
    /// See [`InfluxConfig::from_env`] for the variables read.
    ///
    /// # Errors
    /// Returns `CollectorError::Config` if the settings are missing or malformed.
    pub fn from_env() -> Result<Self, CollectorError> {
        let config = InfluxConfig::from_env()?;
        Self::from_config(&config)
    }

    /// Create a collector from explicit configuration.
    pub fn from_config(config: &InfluxConfig) -> Result<Self, CollectorError> {
        config.validate()?;
        let client = InfluxClient::new(config)?;
        tracing::info!(
            url = client.url(),
            org = %config.org,
            bucket = %config.bucket,
            "Stats collector created"
        );
        Self::with_client(client, &config.org, &config.bucket)
    }
}

impl<C: TimeSeriesClient> InfluxCollector<C> {
    /// Create a collector around an existing client, opening its write path for
    /// `org` and `bucket`.
    pub fn with_client(client: C, org: &str, bucket: &str) -> Result<Self, CollectorError> {
        let write_api = client.write_api(org, bucket)?;
        Ok(Self {
            client,
            write_api,
            closed: AtomicBool::new(false),
        })
    }

    /// Request delivery of buffered points without closing.
    pub fn flush(&self) {
        self.write_api.flush();
    }

    /// Write-path counters, if tracked by the client.
    pub fn write_stats(&self) -> Option<WriteStats> {
        self.write_api.stats()
    }

    /// Whether [`StatsCollector::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<C: TimeSeriesClient> StatsCollector for InfluxCollector<C> {
    fn store_point(&self, namespace: &str, tags: Tags, fields: Fields, timestamp: DateTime<Utc>) {
        if self.is_closed() {
            tracing::debug!(namespace, "Collector closed, dropping point");
            return;
        }
        self.write_api
            .write_point(Point::from_parts(namespace, tags, fields, timestamp));
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::warn!("Stats collector already closed");
            return;
        }

        // Write path first: buffered points must reach the client before it goes away.
        self.write_api.close();
        self.client.close();

        tracing::info!(stats = ?self.write_api.stats(), "Stats collector closed");
    }
}
