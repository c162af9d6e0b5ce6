//! Seams between the collector layer and a time-series client.

use crate::client::{ClientError, WriteStats};
use crate::point::Point;

/// Connection handle to a time-series backend.
pub trait TimeSeriesClient: Send + Sync + 'static {
    /// Write path produced by this client.
    type WriteApi: WriteApi;

    /// Open a write path scoped to `org` and `bucket`.
    fn write_api(&self, org: &str, bucket: &str) -> Result<Self::WriteApi, ClientError>;

    /// Release the connection.
    fn close(&self);
}

/// Buffered, fire-and-forget write path.
///
/// Failures are absorbed by the implementation; `write_point` never reports them.
pub trait WriteApi: Send + Sync + 'static {
    /// Enqueue a point for writing.
    fn write_point(&self, point: Point);

    /// Request delivery of buffered points.
    fn flush(&self);

    /// Flush buffered points and stop the write path.
    fn close(&self);

    /// Write-path counters, if the implementation tracks them.
    fn stats(&self) -> Option<WriteStats> {
        None
    }
}
