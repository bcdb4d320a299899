// SPDX-License-Identifier: Apache-2.0

//! The log-line event emitted by every tailed source.

use std::path::{Path, PathBuf};

/// A single line read from a log source, tagged with the source it came
/// from. Lines from one source arrive in read order; no ordering is
/// promised across sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Canonical path (or socket address) of the source.
    pub source: PathBuf,
    /// Line content, without the trailing newline.
    pub line: String,
}

impl LogLine {
    pub fn new(source: impl AsRef<Path>, line: impl Into<String>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            line: line.into(),
        }
    }
}
