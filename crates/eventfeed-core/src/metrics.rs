//! Global atomic counters for feed agent observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when a CLI command finishes).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    windows_computed: AtomicU64,
    cold_starts: AtomicU64,
    incremental_fetches: AtomicU64,
    feeds_rendered: AtomicU64,
    unauthorized_requests: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            windows_computed: AtomicU64::new(0),
            cold_starts: AtomicU64::new(0),
            incremental_fetches: AtomicU64::new(0),
            feeds_rendered: AtomicU64::new(0),
            unauthorized_requests: AtomicU64::new(0),
        }
    }

    pub fn inc_windows_computed(&self) {
        self.windows_computed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "windows_computed", "counter incremented");
    }

    pub fn inc_cold_starts(&self) {
        self.cold_starts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cold_starts", "counter incremented");
    }

    pub fn inc_incremental_fetches(&self) {
        self.incremental_fetches.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "incremental_fetches", "counter incremented");
    }

    pub fn inc_feeds_rendered(&self) {
        self.feeds_rendered.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "feeds_rendered", "counter incremented");
    }

    pub fn inc_unauthorized(&self) {
        self.unauthorized_requests.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "unauthorized_requests", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            windows_computed = self.windows_computed(),
            cold_starts = self.cold_starts(),
            incremental_fetches = self.incremental_fetches(),
            feeds_rendered = self.feeds_rendered(),
            unauthorized_requests = self.unauthorized_requests(),
        );
    }

    pub fn windows_computed(&self) -> u64 {
        self.windows_computed.load(Ordering::Relaxed)
    }

    pub fn cold_starts(&self) -> u64 {
        self.cold_starts.load(Ordering::Relaxed)
    }

    pub fn incremental_fetches(&self) -> u64 {
        self.incremental_fetches.load(Ordering::Relaxed)
    }

    pub fn feeds_rendered(&self) -> u64 {
        self.feeds_rendered.load(Ordering::Relaxed)
    }

    pub fn unauthorized_requests(&self) -> u64 {
        self.unauthorized_requests.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.windows_computed.store(0, Ordering::Relaxed);
        self.cold_starts.store(0, Ordering::Relaxed);
        self.incremental_fetches.store(0, Ordering::Relaxed);
        self.feeds_rendered.store(0, Ordering::Relaxed);
        self.unauthorized_requests.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_windows_computed();
        m.inc_windows_computed();
        assert_eq!(m.windows_computed(), 2);

        m.inc_cold_starts();
        m.inc_incremental_fetches();
        m.inc_incremental_fetches();
        assert_eq!(m.cold_starts(), 1);
        assert_eq!(m.incremental_fetches(), 2);

        m.inc_feeds_rendered();
        m.inc_unauthorized();
        assert_eq!(m.feeds_rendered(), 1);
        assert_eq!(m.unauthorized_requests(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_windows_computed();
        m.inc_cold_starts();
        m.inc_unauthorized();
        m.reset();
        assert_eq!(m.windows_computed(), 0);
        assert_eq!(m.cold_starts(), 0);
        assert_eq!(m.unauthorized_requests(), 0);
    }
}
