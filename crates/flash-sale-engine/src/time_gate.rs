//! Implementation of the time gate

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

/// Holds the single authoritative sale start instant
///
/// Reads never block writers for long; the gate is a plain value behind a
/// [`RwLock`] and only the admin override ever takes the write side.
pub struct TimeGate {
    start: RwLock<Option<SystemTime>>,
}

impl TimeGate {
    /// Create a new [`TimeGate`], optionally scheduled at `start_unix_secs`
    pub fn new(start_unix_secs: Option<u64>) -> Self {
        Self {
            start: RwLock::new(start_unix_secs.map(|secs| UNIX_EPOCH + Duration::from_secs(secs))),
        }
    }

    /// Get the scheduled start instant, if any
    pub fn start_time(&self) -> Option<SystemTime> {
        *self.start.read()
    }

    /// Get the scheduled start instant as unix seconds, if any
    pub fn start_unix_secs(&self) -> Option<u64> {
        self.start_time()
            .and_then(|start| start.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }

    /// Check whether participation is currently open
    ///
    /// An unscheduled sale is treated as "not open" so premature claims are
    /// uniformly rejected rather than crashing.
    pub fn is_open(&self, now: SystemTime) -> bool {
        match *self.start.read() {
            Some(start) => now >= start,
            None => false,
        }
    }

    /// Set or override the start instant (admin only)
    pub fn set_start_time(&self, start_unix_secs: u64) {
        *self.start.write() = Some(UNIX_EPOCH + Duration::from_secs(start_unix_secs));
        tracing::info!(start_unix_secs, "sale start time set");
    }
}
