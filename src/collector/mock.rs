//! Recording test double for [`StatsCollector`].
//!
//! [`MockCollector`] performs no I/O. Every call is appended to an ordered call
//! log and dispatched to the most recently registered matching [`Expectation`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use stats_collector::{Fields, MockCall, MockCollector, StatsCollector, Tags};
//! use chrono::Utc;
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let mut mock = MockCollector::new();
//! let counter = Arc::clone(&hits);
//! mock.expect_store_point()
//!     .with_namespace("requests")
//!     .returning(move |_| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     });
//!
//! mock.store_point("requests", Tags::new(), Fields::new(), Utc::now());
//! mock.store_point("other", Tags::new(), Fields::new(), Utc::now());
//! mock.close();
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! assert_eq!(mock.call_count(), 3);
//! assert_eq!(mock.calls().last(), Some(&MockCall::Close));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::collector::StatsCollector;
use crate::point::{Fields, Tags};

type Predicate = Arc<dyn Fn(&MockCall) -> bool + Send + Sync>;
type Action = Arc<dyn Fn(&MockCall) + Send + Sync>;

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `store_point` with its exact arguments.
    StorePoint {
        namespace: String,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    },
    /// `close`.
    Close,
}

impl MockCall {
    /// Build the `StorePoint` record expected for the given arguments.
    pub fn store_point(
        namespace: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::StorePoint {
            namespace: namespace.into(),
            tags,
            fields,
            timestamp,
        }
    }

    /// Method name of the call.
    pub fn method(&self) -> Method {
        match self {
            Self::StorePoint { .. } => Method::StorePoint,
            Self::Close => Method::Close,
        }
    }
}

/// Mocked method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    StorePoint,
    Close,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorePoint => f.write_str("store_point"),
            Self::Close => f.write_str("close"),
        }
    }
}

/// A registered expectation. Configure it with the builder methods.
pub struct Expectation {
    method: Method,
    predicate: Option<Predicate>,
    action: Option<Action>,
    times: Option<usize>,
    matched: usize,
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("method", &self.method)
            .field("times", &self.times)
            .field("matched", &self.matched)
            .finish_non_exhaustive()
    }
}

impl Expectation {
    fn new(method: Method) -> Self {
        Self {
            method,
            predicate: None,
            action: None,
            times: None,
            matched: 0,
        }
    }

    /// Only match calls accepted by `predicate`.
    pub fn with<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&MockCall) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Only match `store_point` calls for `namespace`.
    pub fn with_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        let expected = namespace.into();
        self.with(move |call| {
            matches!(call, MockCall::StorePoint { namespace, .. } if *namespace == expected)
        })
    }

    /// Only match calls equal to `call`.
    pub fn with_call(&mut self, call: MockCall) -> &mut Self {
        self.with(move |actual| *actual == call)
    }

    /// Match at most `n` calls; [`MockCollector::assert_expectations`] requires exactly `n`.
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.times = Some(n);
        self
    }

    /// Run `action` whenever this expectation matches.
    pub fn returning<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&MockCall) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    fn accepts(&self, call: &MockCall) -> bool {
        self.method == call.method()
            && self.times.is_none_or(|n| self.matched < n)
            && self.predicate.as_ref().is_none_or(|p| p(call))
    }
}

/// Test double recording every call.
pub struct MockCollector {
    calls: Mutex<Vec<MockCall>>,
    expectations: Mutex<Vec<Expectation>>,
}

impl fmt::Debug for MockCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCollector")
            .field("calls", &*lock(&self.calls))
            .field("expectations", &*lock(&self.expectations))
            .finish()
    }
}

impl Default for MockCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCollector {
    /// Create a mock accepting any `store_point` and `close` call.
    pub fn new() -> Self {
        let mut mock = Self::strict();
        mock.expect_store_point();
        mock.expect_close();
        mock
    }

    /// Create a mock with no expectations; every call must be expected explicitly.
    pub fn strict() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            expectations: Mutex::new(Vec::new()),
        }
    }

    /// Register an expectation for `store_point`.
    ///
    /// Later registrations take precedence over earlier ones.
    pub fn expect_store_point(&mut self) -> &mut Expectation {
        self.expect(Method::StorePoint)
    }

    /// Register an expectation for `close`.
    pub fn expect_close(&mut self) -> &mut Expectation {
        self.expect(Method::Close)
    }

    fn expect(&mut self, method: Method) -> &mut Expectation {
        let expectations = self
            .expectations
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        expectations.push(Expectation::new(method));
        let last = expectations.len() - 1;
        &mut expectations[last]
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Recorded `store_point` calls, in order.
    pub fn store_point_calls(&self) -> Vec<MockCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method() == Method::StorePoint)
            .cloned()
            .collect()
    }

    /// Total number of recorded calls.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of recorded `close` calls.
    pub fn close_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method() == Method::Close)
            .count()
    }

    /// Panic unless every expectation registered with `times(n)` matched exactly `n` calls.
    pub fn assert_expectations(&self) {
        let unmet: Vec<String> = lock(&self.expectations)
            .iter()
            .filter_map(|e| match e.times {
                Some(n) if e.matched != n => Some(format!(
                    "{}: expected {} call(s), got {}",
                    e.method, n, e.matched
                )),
                _ => None,
            })
            .collect();

        assert!(unmet.is_empty(), "unmet expectations: {}", unmet.join("; "));
    }

    fn dispatch(&self, call: MockCall) {
        lock(&self.calls).push(call.clone());

        let found = {
            let mut expectations = lock(&self.expectations);
            expectations
                .iter_mut()
                .rev()
                .find(|e| e.accepts(&call))
                .map(|e| {
                    e.matched += 1;
                    e.action.clone()
                })
        };

        match found {
            Some(Some(action)) => action(&call),
            Some(None) => {}
            None => panic!("unexpected call to MockCollector::{}: {call:?}", call.method()),
        }
    }
}

impl StatsCollector for MockCollector {
    fn store_point(&self, namespace: &str, tags: Tags, fields: Fields, timestamp: DateTime<Utc>) {
        self.dispatch(MockCall::store_point(namespace, tags, fields, timestamp));
    }

    fn close(&self) {
        self.dispatch(MockCall::Close);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use crate::point::FieldValue;

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn region_us() -> Tags {
        Tags::from([("region".to_string(), "us".to_string())])
    }

    fn count_one() -> Fields {
        Fields::from([("count".to_string(), FieldValue::Integer(1))])
    }

    #[test]
    fn test_default_accepts_arbitrary_store_point() {
        let mock = MockCollector::new();
        mock.store_point("", Tags::new(), Fields::new(), t1());
        mock.store_point("cpu", region_us(), count_one(), Utc::now());
        assert_eq!(mock.store_point_calls().len(), 2);
    }

    #[test]
    fn test_records_exact_arguments() {
        let mock = MockCollector::new();
        mock.store_point("requests", region_us(), count_one(), t1());

        assert_eq!(
            mock.calls(),
            vec![MockCall::store_point("requests", region_us(), count_one(), t1())]
        );
    }

    #[test]
    fn test_close_recorded_once() {
        let mock = MockCollector::new();
        mock.close();
        assert_eq!(mock.calls(), vec![MockCall::Close]);
        assert_eq!(mock.close_count(), 1);
    }

    #[test]
    fn test_call_order_scenario() {
        let mock = MockCollector::new();
        mock.store_point("requests", region_us(), count_one(), t1());
        mock.store_point("requests", region_us(), count_one(), t1());
        mock.close();

        let expected_point = MockCall::store_point("requests", region_us(), count_one(), t1());
        assert_eq!(
            mock.calls(),
            vec![expected_point.clone(), expected_point, MockCall::Close]
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_override_runs_action_for_matching_calls() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let mut mock = MockCollector::new();
        mock.expect_store_point()
            .with_namespace("cpu")
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        mock.store_point("cpu", Tags::new(), Fields::new(), t1());
        mock.store_point("mem", Tags::new(), Fields::new(), t1());
        mock.store_point("cpu", Tags::new(), Fields::new(), t1());

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_times_exhausts_then_falls_back() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let mut mock = MockCollector::new();
        mock.expect_store_point().times(1).returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        mock.store_point("a", Tags::new(), Fields::new(), t1());
        mock.store_point("b", Tags::new(), Fields::new(), t1());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        mock.assert_expectations();
    }

    #[test]
    #[should_panic(expected = "unmet expectations")]
    fn test_assert_expectations_reports_unmet() {
        let mut mock = MockCollector::new();
        mock.expect_close().times(1);
        mock.assert_expectations();
    }

    #[test]
    #[should_panic(expected = "unexpected call to MockCollector::store_point")]
    fn test_strict_rejects_unexpected_call() {
        let mock = MockCollector::strict();
        mock.store_point("cpu", Tags::new(), Fields::new(), t1());
    }

    #[test]
    fn test_strict_with_exact_call() {
        let mut mock = MockCollector::strict();
        mock.expect_store_point()
            .with_call(MockCall::store_point("requests", region_us(), count_one(), t1()))
            .times(1);
        mock.expect_close().times(1);

        mock.store_point("requests", region_us(), count_one(), t1());
        mock.close();

        mock.assert_expectations();
    }

    #[test]
    fn test_shared_across_threads() {
        let mock = Arc::new(MockCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mock = Arc::clone(&mock);
                std::thread::spawn(move || {
                    mock.store_point(
                        "worker",
                        Tags::new(),
                        Fields::from([("id".to_string(), FieldValue::from(i))]),
                        Utc::now(),
                    );
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(mock.store_point_calls().len(), 8);
    }
}
