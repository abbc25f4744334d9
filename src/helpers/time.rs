use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of the current UNIX time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        now_u64()
    }
}

/// Clock whose time only moves when told to. Shared through an `Arc` so tests
/// can advance it while the cache holds a reference.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(unix_ts: u64) -> Self {
        Self(AtomicU64::new(unix_ts))
    }

    pub fn set(&self, unix_ts: u64) {
        self.0.store(unix_ts, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn now_u64() -> u64 {
    now_i64().max(0) as u64
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Render a UNIX timestamp as `MM/DD/YYYY HH:MM:SS.mmm` (UTC).
pub fn format_unix(unix_ts: u64) -> String {
    i64::try_from(unix_ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%m/%d/%Y %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| unix_ts.to_string())
}
