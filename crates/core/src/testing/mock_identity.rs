//! Mock identity resolver for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::identity::{IdentityError, IdentityResolver};

/// Mock implementation of the IdentityResolver trait.
///
/// Provides controllable behavior for testing:
/// - Known users resolve to a configured name
/// - Per-user failures with an HTTP status
/// - Simulated latency
/// - Recorded calls and peak concurrency
///
/// # Example
///
/// ```rust,ignore
/// use opsbatch_core::testing::MockIdentityResolver;
///
/// let resolver = MockIdentityResolver::new();
/// resolver.set_name("user_1", "Ada Lovelace").await;
/// resolver.set_failure("user_2", 500).await;
///
/// assert_eq!(resolver.resolve("user_1").await?, "Ada Lovelace");
/// assert_eq!(resolver.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockIdentityResolver {
    /// Display names by user id.
    names: Arc<RwLock<HashMap<String, String>>>,
    /// Status codes returned for specific user ids.
    failures: Arc<RwLock<HashMap<String, u16>>>,
    /// Recorded user ids, in call order.
    calls: Arc<RwLock<Vec<String>>>,
    /// Simulated latency per call.
    delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl Default for MockIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityResolver {
    /// Create a new mock resolver. Unknown ids fail with status 404.
    pub fn new() -> Self {
        Self {
            names: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the display name returned for a user id.
    pub async fn set_name(&self, user_id: impl Into<String>, name: impl Into<String>) {
        self.names.write().await.insert(user_id.into(), name.into());
    }

    /// Make lookups of a user id fail with an HTTP status.
    pub async fn set_failure(&self, user_id: impl Into<String>, status: u16) {
        self.failures.write().await.insert(user_id.into(), status);
    }

    /// Set the simulated latency per call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Highest number of concurrent calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for MockIdentityResolver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve(&self, user_id: &str) -> Result<String, IdentityError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        self.calls.write().await.push(user_id.to_string());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if let Some(status) = self.failures.read().await.get(user_id) {
            Err(IdentityError::Status { status: *status })
        } else if let Some(name) = self.names.read().await.get(user_id) {
            Ok(name.clone())
        } else {
            Err(IdentityError::Status { status: 404 })
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
