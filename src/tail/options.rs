// SPDX-License-Identifier: Apache-2.0

//! Construction options for the tailer.
//!
//! Options are applied in order to a mutable [`Settings`] draft; the first
//! validation failure aborts construction before any background task has
//! started.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use crate::error::{Error, Result};
use crate::logstream::{DefaultStreamFactory, StreamFactory};
use crate::waker::Waker;

use super::gauge::SourceGauge;
use super::pattern::{self, SourcePattern};

/// Default retention window before an idle stream is expired.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// A single construction option.
pub enum TailerOption {
    /// Read existing matches once to completion; never poll for new
    /// sources, and let the output close without a cancellation signal.
    OneShot,
    /// Glob patterns and/or socket addresses to register.
    Patterns(Vec<String>),
    /// Regular expression matched against the base name of discovered
    /// files; matches are excluded. An empty string is a no-op.
    IgnoreRegex(String),
    /// Enables the background re-discovery loop.
    DiscoveryWaker(Arc<dyn Waker>),
    /// Enables the background stale-stream expiration loop.
    ExpirationWaker(Arc<dyn Waker>),
    /// Propagated to every spawned stream for idle-retry scheduling.
    StreamWaker(Arc<dyn Waker>),
    /// Retention window for stale-stream expiration.
    StaleAfter(Duration),
    /// Replaces the stream construction seam (test doubles, socket
    /// protocol support).
    StreamFactory(Arc<dyn StreamFactory>),
    /// Injects a shared active-source gauge.
    SourceGauge(SourceGauge),
}

/// Configuration draft the options are folded into.
pub(crate) struct Settings {
    pub one_shot: bool,
    pub glob_patterns: HashSet<PathBuf>,
    pub socket_addrs: Vec<String>,
    pub ignore: Option<Regex>,
    pub discovery_waker: Option<Arc<dyn Waker>>,
    pub expiration_waker: Option<Arc<dyn Waker>>,
    pub stream_waker: Option<Arc<dyn Waker>>,
    pub stale_after: Duration,
    pub factory: Arc<dyn StreamFactory>,
    pub gauge: SourceGauge,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            one_shot: false,
            glob_patterns: HashSet::new(),
            socket_addrs: Vec::new(),
            ignore: None,
            discovery_waker: None,
            expiration_waker: None,
            stream_waker: None,
            stale_after: DEFAULT_STALE_AFTER,
            factory: Arc::new(DefaultStreamFactory),
            gauge: SourceGauge::new(),
        }
    }
}

impl TailerOption {
    pub(crate) fn apply(self, settings: &mut Settings) -> Result<()> {
        match self {
            TailerOption::OneShot => settings.one_shot = true,
            TailerOption::Patterns(patterns) => {
                for p in patterns {
                    match pattern::parse(&p)? {
                        SourcePattern::Socket(addr) => settings.socket_addrs.push(addr),
                        SourcePattern::FileGlob(path) => {
                            settings.glob_patterns.insert(path);
                        }
                    }
                }
            }
            TailerOption::IgnoreRegex(raw) => {
                if !raw.is_empty() {
                    let regex = Regex::new(&raw)
                        .map_err(|e| Error::InvalidIgnorePattern(format!("{raw}: {e}")))?;
                    settings.ignore = Some(regex);
                }
            }
            TailerOption::DiscoveryWaker(waker) => settings.discovery_waker = Some(waker),
            TailerOption::ExpirationWaker(waker) => settings.expiration_waker = Some(waker),
            TailerOption::StreamWaker(waker) => settings.stream_waker = Some(waker),
            TailerOption::StaleAfter(window) => settings.stale_after = window,
            TailerOption::StreamFactory(factory) => settings.factory = factory,
            TailerOption::SourceGauge(gauge) => settings.gauge = gauge,
        }
        Ok(())
    }
}
