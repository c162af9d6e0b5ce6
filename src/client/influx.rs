//! InfluxDB v2 HTTP client and write path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::client::actor::{ActorSettings, Command, HttpSink, WriteActor, WriteCounters};
use crate::client::{ClientError, TimeSeriesClient, WriteApi, WriteStats};
use crate::config::{InfluxConfig, Precision};
use crate::point::Point;

// =============================================================================
// Client
// =============================================================================

/// Connection handle to an InfluxDB v2 server.
///
/// Each [`InfluxClient::write_api`] call spawns its own writer thread with its
/// own HTTP connection pool.
pub struct InfluxClient {
    base_url: String,
    token: String,
    settings: ActorSettings,
    timeout: Duration,
    closed: AtomicBool,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl InfluxClient {
    /// Create a client from configuration.
    ///
    /// No connection is made until the first batch is written.
    pub fn new(config: &InfluxConfig) -> Result<Self, ClientError> {
        reqwest::Url::parse(&config.url)
            .map_err(|e| ClientError::Internal(format!("invalid url '{}': {e}", config.url)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            settings: ActorSettings {
                channel_capacity: config.channel_capacity,
                batch_size: config.batch_size,
                flush_interval: config.flush_interval,
                precision: config.precision,
            },
            timeout: config.timeout,
            closed: AtomicBool::new(false),
        })
    }

    /// Server base URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Whether [`TimeSeriesClient::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn write_url(
        &self,
        org: &str,
        bucket: &str,
        precision: Precision,
    ) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&format!("{}/api/v2/write", self.base_url))
            .map_err(|e| ClientError::Internal(format!("invalid url '{}': {e}", self.base_url)))?;
        url.query_pairs_mut()
            .append_pair("org", org)
            .append_pair("bucket", bucket)
            .append_pair("precision", precision.as_ref());
        Ok(url)
    }
}

impl TimeSeriesClient for InfluxClient {
    type WriteApi = InfluxWriteApi;

    fn write_api(&self, org: &str, bucket: &str) -> Result<InfluxWriteApi, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let write_url = self.write_url(org, bucket, self.settings.precision)?;
        let sink = HttpSink::new(write_url, &self.token, self.timeout)?;
        let counters = Arc::new(WriteCounters::default());
        let (handle, tx) = WriteActor::spawn(self.settings, sink, Arc::clone(&counters))?;

        tracing::debug!(org, bucket, "Write path opened");

        Ok(InfluxWriteApi {
            tx,
            handle: Mutex::new(Some(handle)),
            counters,
            closed: AtomicBool::new(false),
        })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!(url = %self.base_url, "InfluxDB client closed");
    }
}

// =============================================================================
// Write path
// =============================================================================

/// Non-blocking write path backed by a writer thread.
///
/// Uses `try_send` - points are dropped if the channel is full.
/// Points are buffered and flushed on size or age thresholds.
pub struct InfluxWriteApi {
    tx: SyncSender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<WriteCounters>,
    closed: AtomicBool,
}

impl std::fmt::Debug for InfluxWriteApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxWriteApi")
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

impl WriteApi for InfluxWriteApi {
    fn write_point(&self, point: Point) {
        if self.closed.load(Ordering::Acquire) {
            tracing::debug!(namespace = %point.namespace, "Write path closed, dropping point");
            self.counters.record_dropped();
            return;
        }

        match self.tx.try_send(Command::Write(point)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Channel full, dropping point");
                self.counters.record_dropped();
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("Writer stopped, dropping point");
                self.counters.record_dropped();
            }
        }
    }

    fn flush(&self) {
        if let Err(e) = self.tx.try_send(Command::Flush) {
            tracing::debug!(error = %e, "Flush request not delivered");
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Blocking send: shutdown queues behind points already accepted.
        if self.tx.send(Command::Shutdown).is_err() {
            tracing::warn!("Writer already stopped");
        }

        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            tracing::error!("Failed to join writer thread");
        }

        tracing::debug!(stats = ?self.counters.snapshot(), "Write path closed");
    }

    fn stats(&self) -> Option<WriteStats> {
        Some(self.counters.snapshot())
    }
}

impl Drop for InfluxWriteApi {
    fn drop(&mut self) {
        // Flush buffered points if close was never called
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InfluxConfig {
        InfluxConfig::new("http://127.0.0.1:1/", "token", "stats").with_org("acme")
    }

    #[test]
    fn test_write_url() {
        let client = InfluxClient::new(&config()).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:1");

        let url = client.write_url("acme", "my bucket", Precision::Ms).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:1/api/v2/write?org=acme&bucket=my+bucket&precision=ms"
        );
    }

    #[test]
    fn test_closed_client_refuses_write_api() {
        let client = InfluxClient::new(&config()).unwrap();
        client.close();
        client.close();
        assert!(client.is_closed());
        assert!(matches!(
            client.write_api("acme", "stats"),
            Err(ClientError::Closed)
        ));
    }

    #[test]
    fn test_write_after_close_is_dropped() {
        let client = InfluxClient::new(&config()).unwrap();
        let write_api = client.write_api("acme", "stats").unwrap();
        write_api.close();

        write_api.write_point(Point::new("cpu", chrono::Utc::now()).with_field("v", 1.0));
        let stats = write_api.stats().unwrap();
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.written, 0);
    }
}
