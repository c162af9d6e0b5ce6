//! Writer actor with dedicated thread and MPSC channel.
//!
//! Single-writer pattern: one thread owns the point buffer and the transport,
//! processes commands via MPSC. Flushes when the buffer reaches `batch_size`
//! points or `flush_interval` has elapsed since the first buffered point.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::client::ClientError;
use crate::client::line_protocol::encode_batch;
use crate::config::Precision;
use crate::point::Point;

/// Idle wait when nothing is buffered.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Commands
// =============================================================================

/// Commands sent to the writer actor.
#[derive(Debug)]
pub(crate) enum Command {
    /// Buffer a point for the next batch.
    Write(Point),
    /// Force flush the buffer.
    Flush,
    /// Flush and stop.
    Shutdown,
}

// =============================================================================
// Counters
// =============================================================================

/// Snapshot of write-path counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Points accepted by the server.
    pub written: u64,
    /// Points lost to rejected requests, transport errors or encoding errors.
    pub failed: u64,
    /// Points never enqueued (channel full or write path closed).
    pub dropped: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WriteCounters {
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl WriteCounters {
    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WriteStats {
        WriteStats {
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination for encoded batches.
pub(crate) trait BatchSink: Send + 'static {
    fn send(&mut self, body: String) -> Result<(), ClientError>;
}

/// HTTP sink posting line protocol to `/api/v2/write`.
///
/// Owns a current-thread runtime so the async client can be driven from the
/// actor thread.
pub(crate) struct HttpSink {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    write_url: reqwest::Url,
    auth_header: String,
}

impl HttpSink {
    pub(crate) fn new(
        write_url: reqwest::Url,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build writer runtime: {e}")))?;

        Ok(Self {
            runtime,
            client,
            write_url,
            auth_header: format!("Token {token}"),
        })
    }
}

impl BatchSink for HttpSink {
    fn send(&mut self, body: String) -> Result<(), ClientError> {
        let request = self
            .client
            .post(self.write_url.clone())
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body);

        self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Status {
                status: status.as_u16(),
                body,
            })
        })
    }
}

// =============================================================================
// Buffer
// =============================================================================

/// Buffer for batch writes with time-based and size-based flushing.
struct BatchBuffer<T> {
    items: Vec<T>,
    capacity: usize,
    first_push: Instant,
}

impl<T> BatchBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            first_push: Instant::now(),
        }
    }

    fn push(&mut self, item: T) {
        // Age is measured from the first buffered item
        if self.items.is_empty() {
            self.first_push = Instant::now();
        }
        self.items.push(item);
    }

    fn should_flush(&self, max_age: Duration) -> bool {
        self.items.len() >= self.capacity
            || (!self.items.is_empty() && self.first_push.elapsed() >= max_age)
    }

    fn take(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity))
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Actor
// =============================================================================

/// Write-path settings consumed by the actor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActorSettings {
    pub channel_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub precision: Precision,
}

/// Writer actor with batch buffering for points.
pub(crate) struct WriteActor<S: BatchSink> {
    rx: Receiver<Command>,
    sink: S,
    buffer: BatchBuffer<Point>,
    flush_interval: Duration,
    precision: Precision,
    counters: Arc<WriteCounters>,
}

impl<S: BatchSink> WriteActor<S> {
    /// Spawn the writer actor thread.
    ///
    /// Returns the thread handle and the command sender.
    pub(crate) fn spawn(
        settings: ActorSettings,
        sink: S,
        counters: Arc<WriteCounters>,
    ) -> Result<(JoinHandle<()>, SyncSender<Command>), ClientError> {
        let (tx, rx) = mpsc::sync_channel(settings.channel_capacity);

        let mut actor = WriteActor {
            rx,
            sink,
            buffer: BatchBuffer::new(settings.batch_size),
            flush_interval: settings.flush_interval,
            precision: settings.precision,
            counters,
        };

        let handle = thread::Builder::new()
            .name("stats-writer".to_string())
            .spawn(move || actor.run())
            .map_err(|e| ClientError::Internal(format!("failed to spawn writer thread: {e}")))?;

        Ok((handle, tx))
    }

    fn run(&mut self) {
        tracing::info!("WriteActor started");

        loop {
            let now = Instant::now();
            let deadline = if self.buffer.is_empty() {
                now + IDLE_TIMEOUT
            } else {
                self.buffer.first_push + self.flush_interval
            };
            let timeout = deadline.saturating_duration_since(now);

            match self.rx.recv_timeout(timeout) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break; // Shutdown requested
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Timeout: flush overdue
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("Channel disconnected, shutting down");
                    self.flush();
                    break;
                }
            }

            if self.buffer.should_flush(self.flush_interval) {
                self.flush();
            }
        }

        tracing::info!("WriteActor stopped");
    }

    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Write(point) => {
                self.buffer.push(point);
            }
            Command::Flush => {
                self.flush();
            }
            Command::Shutdown => {
                tracing::info!("WriteActor shutting down");
                self.flush();
                return true;
            }
        }
        false
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let points = self.buffer.take();
        let (body, errors) = encode_batch(&points, self.precision);

        for e in &errors {
            tracing::warn!(error = %e, "Skipping unencodable point");
        }
        self.counters
            .failed
            .fetch_add(errors.len() as u64, Ordering::Relaxed);

        let encoded = (points.len() - errors.len()) as u64;
        if encoded == 0 {
            return;
        }

        match self.sink.send(body) {
            Ok(()) => {
                self.counters.written.fetch_add(encoded, Ordering::Relaxed);
                tracing::debug!(count = encoded, "Batch written");
            }
            Err(e) => {
                self.counters.failed.fetch_add(encoded, Ordering::Relaxed);
                tracing::error!(error = %e, count = encoded, "Batch write failed");
            }
        }
    }
}
