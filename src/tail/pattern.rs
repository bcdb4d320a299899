// SPDX-License-Identifier: Apache-2.0

//! URI-like source pattern classification.
//!
//! Socket schemes are kept verbatim; everything else resolves to an
//! absolute filesystem glob pattern. An unrecognized scheme is not fatal:
//! the whole pattern string is treated as a filesystem path, with a
//! logged warning.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};

/// Schemes that denote a socket source rather than a filesystem pattern.
const SOCKET_SCHEMES: &[&str] = &["unix", "unixgram", "tcp", "udp"];

/// A classified source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SourcePattern {
    /// Socket address, kept verbatim, tailed once at startup.
    Socket(String),
    /// Absolute filesystem glob pattern.
    FileGlob(PathBuf),
}

pub(crate) fn is_socket_address(pattern: &str) -> bool {
    pattern
        .split_once("://")
        .is_some_and(|(scheme, _)| SOCKET_SCHEMES.contains(&scheme))
}

/// Classify a pattern string.
pub(crate) fn parse(pattern: &str) -> Result<SourcePattern> {
    let path = match pattern.split_once("://") {
        Some((scheme, _)) if SOCKET_SCHEMES.contains(&scheme) => {
            return Ok(SourcePattern::Socket(pattern.to_string()));
        }
        Some(("file", rest)) => PathBuf::from(rest),
        Some((scheme, _)) => {
            warn!(scheme, pattern, "unsupported URL scheme, treating as path");
            PathBuf::from(pattern)
        }
        None => PathBuf::from(pattern),
    };
    Ok(SourcePattern::FileGlob(absolute(&path)?))
}

/// Resolve to absolute form without touching the filesystem, so glob
/// metacharacters survive.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| Error::InvalidPattern(format!("{}: {}", path.display(), e)))
}
