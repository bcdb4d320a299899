// SPDX-License-Identifier: Apache-2.0

//! The tailer: source discovery and stream lifecycle orchestration.
//!
//! Owns the pattern set, the registry of active streams keyed by
//! canonical path, the discovery and expiration loops, and shutdown
//! coordination. At most one non-complete stream exists per path; the
//! output channel closes exactly once, after every spawned task has
//! finished.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::bounded_channel::BoundedSender;
use crate::error::{Error, Result};
use crate::logline::LogLine;
use crate::logstream::{LogStream, StreamContext, StreamFactory};
use crate::waker::Waker;

use super::gauge::SourceGauge;
use super::options::{Settings, TailerOption};
use super::pattern::{self, SourcePattern};

/// Discovers log sources matching registered patterns and tails them into
/// one shared output channel.
///
/// Cloneable handle over shared state; background tasks hold the same
/// state and outlive the handle. Dropping the `Tailer` does not stop
/// anything; stopping is driven by the cancellation token.
#[derive(Clone)]
pub struct Tailer {
    inner: Arc<TailerInner>,
}

impl std::fmt::Debug for Tailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tailer").finish_non_exhaustive()
    }
}

struct TailerInner {
    cancel: CancellationToken,
    /// Released once construction (options + socket pass + first poll)
    /// has completed; every background task waits on this before acting.
    init_done: CancellationToken,
    /// Tracks every spawned stream task and both loops.
    work: TaskTracker,
    /// Retained sender; taken exactly once by the shutdown task.
    lines: StdMutex<Option<BoundedSender<LogLine>>>,

    glob_patterns: RwLock<HashSet<PathBuf>>,
    socket_addrs: StdMutex<Vec<String>>,
    ignore: Option<Regex>,
    one_shot: bool,

    /// Serializes full poll cycles; wake signals arriving during a poll
    /// degrade to the next poll doing equivalent work.
    poll_lock: tokio::sync::Mutex<()>,

    stream_waker: Option<Arc<dyn Waker>>,
    streams: StdMutex<HashMap<PathBuf, Box<dyn LogStream>>>,
    stale_after: Duration,
    factory: Arc<dyn StreamFactory>,
    gauge: SourceGauge,
}

impl Tailer {
    /// Construct a tailer and perform the initial synchronous discovery
    /// pass. Either fully succeeds (possibly with zero sources, closing
    /// the output immediately) or fails before the polling loops start.
    ///
    /// On failure, streams spawned for patterns that preceded the failing
    /// one may still be running; the caller must cancel `cancel` to stop
    /// them. They hold no coordinator, so the output channel closes once
    /// the last of them finishes.
    ///
    /// The shutdown coordinator is spawned on the caller's `tracker`;
    /// waiting on that tracker observes the tailer's full termination.
    pub async fn new(
        cancel: CancellationToken,
        tracker: &TaskTracker,
        lines: BoundedSender<LogLine>,
        options: impl IntoIterator<Item = TailerOption>,
    ) -> Result<Self> {
        let mut settings = Settings::default();
        for option in options {
            option.apply(&mut settings)?;
        }

        let inner = Arc::new(TailerInner {
            cancel,
            init_done: CancellationToken::new(),
            work: TaskTracker::new(),
            lines: StdMutex::new(Some(lines)),
            glob_patterns: RwLock::new(settings.glob_patterns),
            socket_addrs: StdMutex::new(settings.socket_addrs),
            ignore: settings.ignore,
            one_shot: settings.one_shot,
            poll_lock: tokio::sync::Mutex::new(()),
            stream_waker: settings.stream_waker,
            streams: StdMutex::new(HashMap::new()),
            stale_after: settings.stale_after,
            factory: settings.factory,
            gauge: settings.gauge,
        });
        let tailer = Self {
            inner: inner.clone(),
        };

        let sockets = inner.socket_addrs.lock().unwrap().clone();
        if sockets.is_empty() && inner.glob_patterns.read().unwrap().is_empty() {
            info!("no patterns or sockets to tail, tailer done");
            inner.init_done.cancel();
            inner.work.close();
            inner.close_lines();
            return Ok(tailer);
        }

        // Sockets are tailed exactly once, before the first discovery
        // pass; a failure here is fatal to construction.
        for addr in &sockets {
            inner.tail_path(Path::new(addr))?;
        }
        // Guarantee every existing match is tailed before construction
        // returns. In one-shot mode this is the read itself.
        inner.poll_log_patterns()?;

        if let Some(waker) = settings.discovery_waker {
            inner.clone().start_discovery_loop(waker);
        }
        if let Some(waker) = settings.expiration_waker {
            inner.clone().start_expiration_loop(waker);
        }
        inner.work.close();

        // Shutdown coordination. The cancellation wait (skipped in
        // one-shot mode) must come before the spawned-work wait: polls
        // keep growing the task population, and starting the countdown
        // earlier could strand a stream writing to a closed channel.
        let shutdown = inner.clone();
        tracker.spawn(async move {
            shutdown.init_done.cancelled().await;
            if !shutdown.one_shot {
                shutdown.cancel.cancelled().await;
            }
            shutdown.work.wait().await;
            shutdown.close_lines();
        });

        inner.init_done.cancel();
        Ok(tailer)
    }

    /// Register a glob pattern or socket address. Socket addresses
    /// registered after construction are kept but never tailed; the
    /// startup socket pass has already run.
    pub fn add_pattern(&self, pattern: &str) -> Result<()> {
        self.inner.add_pattern(pattern)
    }

    /// True when `path` is excluded from discovery: it cannot be stat'ed,
    /// is a directory, or its base name matches the ignore filter.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.inner.is_ignored(path)
    }

    /// Ensure `path` is being tailed. No-op for a path whose stream is
    /// still active; a completed stream is replaced.
    pub fn tail_path(&self, path: &Path) -> Result<()> {
        self.inner.tail_path(path)
    }

    /// Run one discovery pass followed by a completion sweep. At most one
    /// full cycle runs at a time.
    pub async fn poll(&self) -> Result<()> {
        self.inner.poll().await
    }

    /// Expand every registered pattern and tail the surviving matches.
    pub fn poll_log_patterns(&self) -> Result<()> {
        self.inner.poll_log_patterns()
    }

    /// Drop completed streams from the registry.
    pub fn poll_log_streams_for_completion(&self) {
        self.inner.poll_log_streams_for_completion()
    }

    /// Stop every stream whose last successful read is older than the
    /// retention window.
    pub fn expire_stale_logstreams(&self) {
        self.inner.expire_stale_logstreams()
    }

    /// Currently active source count.
    pub fn active_sources(&self) -> i64 {
        self.inner.gauge.value()
    }

    /// Registered glob patterns, canonical absolute form.
    pub fn patterns(&self) -> Vec<PathBuf> {
        self.inner
            .glob_patterns
            .read()
            .unwrap()
            .iter()
            .cloned()
            .collect()
    }

    /// Registered socket addresses, verbatim.
    pub fn socket_addresses(&self) -> Vec<String> {
        self.inner.socket_addrs.lock().unwrap().clone()
    }
}

impl TailerInner {
    fn add_pattern(&self, pattern: &str) -> Result<()> {
        match pattern::parse(pattern)? {
            SourcePattern::Socket(addr) => {
                info!(addr, "registered socket address");
                self.socket_addrs.lock().unwrap().push(addr);
            }
            SourcePattern::FileGlob(path) => {
                info!(path = ?path, "registered glob pattern");
                self.glob_patterns.write().unwrap().insert(path);
            }
        }
        Ok(())
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let abs = match pattern::absolute(path) {
            Ok(p) => p,
            Err(error) => {
                debug!(path = ?path, %error, "cannot resolve path, excluding");
                return true;
            }
        };
        let meta = match std::fs::metadata(&abs) {
            Ok(m) => m,
            Err(error) => {
                debug!(path = ?abs, %error, "cannot stat path, excluding");
                return true;
            }
        };
        if meta.is_dir() {
            debug!(path = ?abs, "excluding directory");
            return true;
        }
        match (&self.ignore, abs.file_name().and_then(|n| n.to_str())) {
            (Some(regex), Some(name)) => regex.is_match(name),
            _ => false,
        }
    }

    fn tail_path(&self, path: &Path) -> Result<()> {
        let mut streams = self.streams.lock().unwrap();
        if let Some(existing) = streams.get(path) {
            if !existing.is_complete() {
                debug!(path = ?path, "stream already active");
                return Ok(());
            }
            // The completed entry is about to be replaced; the gauge dips
            // here and recovers on successful creation below.
            self.gauge.decrement();
            debug!(path = ?path, "existing stream finished, creating a new one");
        }

        let lines = self
            .lines
            .lock()
            .unwrap()
            .as_ref()
            .cloned()
            .ok_or(Error::ChannelClosed)?;
        let ctx = StreamContext {
            cancel: &self.cancel,
            tracker: &self.work,
            waker: self.stream_waker.clone(),
            lines,
            one_shot: self.one_shot,
        };
        let stream = self.factory.create(ctx, path)?;
        if self.one_shot {
            debug!(path = ?path, "one-shot read at startup");
            stream.stop();
        }
        streams.insert(path.to_path_buf(), stream);
        self.gauge.increment();
        info!(path = ?path, "tailing source");
        Ok(())
    }

    fn poll_log_patterns(&self) -> Result<()> {
        let patterns = self.glob_patterns.read().unwrap();
        for registered in patterns.iter() {
            let Some(glob_pattern) = registered.to_str() else {
                return Err(Error::InvalidGlob(format!(
                    "pattern is not valid UTF-8: {}",
                    registered.display()
                )));
            };
            let matches = glob::glob(glob_pattern)
                .map_err(|e| Error::InvalidGlob(format!("{glob_pattern}: {e}")))?;
            for entry in matches {
                let path = match entry {
                    Ok(p) => p,
                    Err(error) => {
                        debug!(%error, "skipping unreadable glob match");
                        continue;
                    }
                };
                if self.is_ignored(&path) {
                    continue;
                }
                let abs = match pattern::absolute(&path) {
                    Ok(p) => p,
                    Err(error) => {
                        debug!(path = ?path, %error, "skipping unresolvable match");
                        continue;
                    }
                };
                if let Err(error) = self.tail_path(&abs) {
                    warn!(path = ?abs, %error, "failed to tail path");
                }
            }
        }
        Ok(())
    }

    fn poll_log_streams_for_completion(&self) {
        let mut streams = self.streams.lock().unwrap();
        streams.retain(|path, stream| {
            if stream.is_complete() {
                info!(path = ?path, "stream complete, removing");
                self.gauge.decrement();
                false
            } else {
                true
            }
        });
    }

    fn expire_stale_logstreams(&self) {
        let streams = self.streams.lock().unwrap();
        for (path, stream) in streams.iter() {
            let idle = stream.last_read_time().elapsed();
            if idle > self.stale_after {
                info!(path = ?path, idle_secs = idle.as_secs(), "expiring stale stream");
                stream.stop();
            }
        }
    }

    async fn poll(&self) -> Result<()> {
        let _serial = self.poll_lock.lock().await;
        self.poll_log_patterns()?;
        self.poll_log_streams_for_completion();
        Ok(())
    }

    fn start_discovery_loop(self: Arc<Self>, waker: Arc<dyn Waker>) {
        let tracker = self.work.clone();
        tracker.spawn(async move {
            self.init_done.cancelled().await;
            if self.one_shot {
                debug!("no discovery loop in one-shot mode");
                return;
            }
            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => return,
                    _ = waker.wake() => {
                        if let Err(error) = self.poll().await {
                            warn!(%error, "discovery poll failed");
                        }
                    }
                }
            }
        });
    }

    fn start_expiration_loop(self: Arc<Self>, waker: Arc<dyn Waker>) {
        let tracker = self.work.clone();
        tracker.spawn(async move {
            self.init_done.cancelled().await;
            if self.one_shot {
                debug!("no expiration loop in one-shot mode");
                return;
            }
            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => return,
                    _ = waker.wake() => self.expire_stale_logstreams(),
                }
            }
        });
    }

    fn close_lines(&self) {
        if let Some(lines) = self.lines.lock().unwrap().take() {
            debug!("closing lines channel");
            drop(lines);
        }
    }
}
