// src/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-relay counters. Diagnostic only; readers may observe them mid-update.
#[derive(Debug, Default)]
pub struct Metrics {
    pub messages_received: AtomicU64,
    pub messages_forwarded: AtomicU64,
    pub messages_failed: AtomicU64,
    pub bytes_received: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.messages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> String {
        format!(
            "messages_received: {}, messages_forwarded: {}, messages_failed: {}, bytes_received: {}",
            self.messages_received.load(Ordering::Relaxed),
            self.messages_forwarded.load(Ordering::Relaxed),
            self.messages_failed.load(Ordering::Relaxed),
            self.bytes_received.load(Ordering::Relaxed),
        )
    }
}
