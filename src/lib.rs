// SPDX-License-Identifier: Apache-2.0

//! Log source discovery and multiplexed tailing.
//!
//! The [`Tailer`] watches glob patterns for log files, tails every match
//! into one shared channel of [`LogLine`] events, and coordinates the
//! lifecycle of the streams it spawns: late-arriving matches are picked
//! up by a polling loop, idle streams are expired, and on cancellation
//! the output channel closes exactly once, after every stream has
//! finished. Socket addresses can be registered alongside glob patterns
//! and are tailed once at startup through a custom [`StreamFactory`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tokio_util::task::TaskTracker;
//! use logtail::{bounded_channel, Tailer, TailerOption, TimerWaker};
//!
//! # async fn run() -> logtail::Result<()> {
//! let cancel = CancellationToken::new();
//! let tracker = TaskTracker::new();
//! let (lines_tx, mut lines_rx) = bounded_channel::bounded(64);
//!
//! let tailer = Tailer::new(
//!     cancel.clone(),
//!     &tracker,
//!     lines_tx,
//!     vec![
//!         TailerOption::Patterns(vec!["/var/log/app/*.log".into()]),
//!         TailerOption::DiscoveryWaker(Arc::new(TimerWaker::new(Duration::from_secs(1)))),
//!     ],
//! )
//! .await?;
//!
//! while let Some(line) = lines_rx.next().await {
//!     println!("{}: {}", line.source.display(), line.line);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bounded_channel;
pub mod error;
pub mod logline;
pub mod logstream;
pub mod tail;
pub mod waker;

pub use error::{Error, Result};
pub use logline::LogLine;
pub use logstream::{DefaultStreamFactory, FileLogStream, LogStream, StreamContext, StreamFactory};
pub use tail::{SourceGauge, Tailer, TailerOption, DEFAULT_STALE_AFTER};
pub use waker::{ManualWaker, TimerWaker, Waker};
