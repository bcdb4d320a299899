// SPDX-License-Identifier: Apache-2.0

use futures::future::BoxFuture;
use tokio::sync::Notify;

use super::Waker;

/// Manually triggered waker for tests.
///
/// `trigger` stores a permit, so a trigger that races ahead of the waiter
/// is not lost. Intended for a single waiter per instance.
#[derive(Debug, Default)]
pub struct ManualWaker {
    notify: Notify,
}

impl ManualWaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the waiter (or the next call to `wake`).
    pub fn trigger(&self) {
        self.notify.notify_one();
    }
}

impl Waker for ManualWaker {
    fn wake(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.notify.notified())
    }
}
