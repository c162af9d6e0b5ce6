//! Collector Layer
//!
//! The [`StatsCollector`] contract and its two implementations:
//!
//! - [`InfluxCollector`]: Forwards points to a time-series client's write path
//! - [`MockCollector`]: Records calls in memory for assertions in tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stats_collector::{Fields, InfluxCollector, StatsCollector, Tags};
//! use chrono::Utc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let collector: Arc<dyn StatsCollector> = Arc::new(InfluxCollector::from_env()?);
//!
//! let tags = Tags::from([("host".to_string(), "a".to_string())]);
//! let fields = Fields::from([("usage".to_string(), 42.5.into())]);
//! collector.store_point("cpu", tags, fields, Utc::now());
//!
//! collector.close();
//! # Ok(())
//! # }
//! ```

mod influx;
pub mod mock;
mod traits;

pub use influx::InfluxCollector;
pub use mock::{Expectation, Method, MockCall, MockCollector};
pub use traits::{CollectorError, StatsCollector};
