//! Stats Collector - Time-series Point Sink
//!
//! This crate provides a small abstraction for writing time-series points
//! ("stats") to InfluxDB, together with a recording test double.
//!
//! # Architecture
//!
//! - **Collector**: The [`StatsCollector`] contract, its InfluxDB-backed
//!   implementation and a mock for tests
//! - **Client**: InfluxDB v2 client with a batching, fire-and-forget write path
//! - **Config**: Connection settings from code, environment or YAML
//!
//! # Example
//!
//! ```rust
//! use stats_collector::{Fields, MockCall, MockCollector, StatsCollector, Tags};
//! use chrono::Utc;
//!
//! fn record_request(stats: &dyn StatsCollector) {
//!     let tags = Tags::from([("region".to_string(), "us".to_string())]);
//!     let fields = Fields::from([("count".to_string(), 1.into())]);
//!     stats.store_point("requests", tags, fields, Utc::now());
//! }
//!
//! let mock = MockCollector::new();
//! record_request(&mock);
//! assert!(matches!(
//!     &mock.calls()[0],
//!     MockCall::StorePoint { namespace, .. } if namespace == "requests"
//! ));
//! ```

pub mod client;
pub mod collector;
pub mod config;
pub mod point;

pub use client::{ClientError, InfluxClient, InfluxWriteApi, TimeSeriesClient, WriteApi, WriteStats};
pub use collector::{CollectorError, InfluxCollector, MockCall, MockCollector, StatsCollector};
pub use config::{ConfigError, InfluxConfig, Precision};
pub use point::{FieldValue, Fields, Point, Tags};
