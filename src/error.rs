// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid ignore pattern: {0}")]
    InvalidIgnorePattern(String),

    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("lines channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
