// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use futures::future::BoxFuture;

use super::Waker;

/// Production waker that fires once per period.
#[derive(Debug, Clone)]
pub struct TimerWaker {
    period: Duration,
}

impl TimerWaker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Waker for TimerWaker {
    fn wake(&self) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(self.period))
    }
}
