// SPDX-License-Identifier: Apache-2.0

//! Log stream seam: one stream per tailed source.
//!
//! The tailer owns streams only through the [`LogStream`] trait; it never
//! sees bytes. Streams are built through a [`StreamFactory`], which is
//! also how tests substitute doubles and how embedders can attach socket
//! protocols (out of scope for the built-in factory).

mod file;

pub use file::FileLogStream;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::bounded_channel::BoundedSender;
use crate::error::{Error, Result};
use crate::logline::LogLine;
use crate::tail::pattern;
use crate::waker::Waker;

/// A running reader for one source.
///
/// The reading task runs on the tailer's task tracker; these methods only
/// observe and steer it.
pub trait LogStream: Send + Sync {
    /// True once the reading task has finished for good. A complete
    /// stream is dropped from the registry on the next completion sweep.
    fn is_complete(&self) -> bool;

    /// Time of the last successful read from the source.
    fn last_read_time(&self) -> Instant;

    /// Ask the stream to finish. The stream completes one full read pass
    /// to EOF before honoring the request, so one-shot reads see the
    /// whole source.
    fn stop(&self);
}

/// Everything a factory needs to wire a new stream into the tailer.
pub struct StreamContext<'a> {
    /// Cancellation fan-out shared with the whole tailer.
    pub cancel: &'a CancellationToken,
    /// Tracker the reading task must run on; shutdown waits on it.
    pub tracker: &'a TaskTracker,
    /// Idle-retry waker propagated to the stream, if configured.
    pub waker: Option<Arc<dyn Waker>>,
    /// Shared output for line events.
    pub lines: BoundedSender<LogLine>,
    /// Read once to completion, then finish.
    pub one_shot: bool,
}

/// Builds a [`LogStream`] for a source path.
pub trait StreamFactory: Send + Sync {
    fn create(&self, ctx: StreamContext<'_>, path: &Path) -> Result<Box<dyn LogStream>>;
}

/// Factory used when none is injected: tails filesystem paths.
///
/// Socket addresses are rejected here; registering them is supported by
/// the tailer, but attaching a protocol requires a custom factory.
#[derive(Debug, Default)]
pub struct DefaultStreamFactory;

impl StreamFactory for DefaultStreamFactory {
    fn create(&self, ctx: StreamContext<'_>, path: &Path) -> Result<Box<dyn LogStream>> {
        let source = path.to_string_lossy();
        if pattern::is_socket_address(&source) {
            return Err(Error::UnsupportedSource(source.into_owned()));
        }
        Ok(Box::new(FileLogStream::spawn(ctx, path)?))
    }
}
