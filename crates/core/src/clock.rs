//! Time source abstraction.
//!
//! The variable store and `time.sleep` read time through a [`Clock`] so that
//! tests can move time forward without waiting on the wall clock.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A source of the current instant that can also suspend the caller.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Current instant as a UTC timestamp, clamped to the representable range.
    fn now(&self) -> DateTime<Utc> {
        let millis = self.now_millis();
        DateTime::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }
}

/// Shared clock handle stored by `Context` and `Time`.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by the system time and tokio timers.
#[derive(Clone, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Manually driven clock for tests.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// `Context` and keep another to advance it. `sleep` advances the clock
/// instead of waiting.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_millis: Arc<AtomicI64>,
}

impl FakeClock {
    pub fn new(start_millis: i64) -> Self {
        Self { current_millis: Arc::new(AtomicI64::new(start_millis)) }
    }

    /// Start at the given instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::new(instant.timestamp_millis())
    }

    pub fn advance(&self, duration: Duration) {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.advance_ms(millis);
    }

    /// Move time by `ms`, saturating at the ends of the `i64` range.
    pub fn advance_ms(&self, ms: i64) {
        let _ = self.current_millis.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            Some(current.saturating_add(ms))
        });
    }

    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> i64 {
        self.current_millis.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.advance(duration);
        Box::pin(async {})
    }
}
