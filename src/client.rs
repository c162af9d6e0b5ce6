//! Time-series Client Layer
//!
//! InfluxDB v2 client with an asynchronous, batching write path:
//! - **Client**: Connection settings and lifecycle ([`InfluxClient`])
//! - **Write path**: Writer thread fed by a bounded MPSC channel ([`InfluxWriteApi`])
//!
//! # Components
//!
//! - [`TimeSeriesClient`] / [`WriteApi`]: Seams consumed by the collector layer
//! - [`line_protocol`]: Mapping from points to line protocol
//! - [`WriteStats`]: Counters for written, failed and dropped points

mod actor;
mod error;
mod influx;
pub mod line_protocol;
mod traits;

pub use actor::WriteStats;
pub use error::ClientError;
pub use influx::{InfluxClient, InfluxWriteApi};
pub use traits::{TimeSeriesClient, WriteApi};
