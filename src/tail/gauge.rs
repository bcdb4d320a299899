// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Count of currently active sources, for observability only.
///
/// A clone shares the underlying counter, so a caller can hand one handle
/// to the tailer and keep another to export or assert on. Never consulted
/// for control decisions.
#[derive(Clone, Debug, Default)]
pub struct SourceGauge {
    count: Arc<AtomicI64>,
}

impl SourceGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decrement(&self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_counts() {
        let gauge = SourceGauge::new();
        gauge.increment();
        gauge.increment();
        gauge.decrement();
        assert_eq!(gauge.value(), 1);
    }

    #[test]
    fn test_clone_shares_counter() {
        let gauge = SourceGauge::new();
        let shared = gauge.clone();
        gauge.increment();
        assert_eq!(shared.value(), 1);
    }
}
