// SPDX-License-Identifier: Apache-2.0

//! Wake signals driving the tailer's polling loops.
//!
//! The tailer never sleeps on real time directly; each loop waits on a
//! [`Waker`] so tests can drive polling deterministically with a
//! [`ManualWaker`] while production uses a [`TimerWaker`].

mod manual;
mod timer;

pub use manual::ManualWaker;
pub use timer::TimerWaker;

use futures::future::BoxFuture;

/// A repeating wake signal.
pub trait Waker: Send + Sync {
    /// Resolves on the next wake signal. Call again for the one after.
    fn wake(&self) -> BoxFuture<'_, ()>;
}
