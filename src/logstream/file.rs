// SPDX-License-Identifier: Apache-2.0

//! Production file stream: incremental line reads with rotation handling.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bounded_channel::BoundedSender;
use crate::error::Result;
use crate::logline::LogLine;
use crate::waker::Waker;

use super::{LogStream, StreamContext};

/// How long to wait between read passes when no idle waker is configured.
const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(250);

/// State shared between the reading task and the registry handle.
struct StreamState {
    complete: AtomicBool,
    last_read: StdMutex<Instant>,
    stop: CancellationToken,
}

/// Tails one file, emitting complete lines to the shared output.
///
/// The file is read to EOF, then the task waits on (cancel | stop | idle
/// waker) before the next pass. Truncation or an inode change reopens the
/// file from offset zero. A stop or cancel request is honored only after
/// one final read pass, so a one-shot read always sees the whole file.
pub struct FileLogStream {
    state: Arc<StreamState>,
}

impl FileLogStream {
    /// Open `path` and spawn the reading task on the tailer's tracker.
    /// Open failure propagates; nothing is spawned in that case.
    pub(crate) fn spawn(ctx: StreamContext<'_>, path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let inode = inode_of(&file.metadata()?);

        let state = Arc::new(StreamState {
            complete: AtomicBool::new(false),
            last_read: StdMutex::new(Instant::now()),
            stop: CancellationToken::new(),
        });

        let task = StreamTask {
            state: state.clone(),
            cancel: ctx.cancel.clone(),
            waker: ctx.waker,
            lines: ctx.lines,
            path: path.to_path_buf(),
        };
        ctx.tracker.spawn(task.run(file, inode));

        Ok(Self { state })
    }
}

impl LogStream for FileLogStream {
    fn is_complete(&self) -> bool {
        self.state.complete.load(Ordering::Acquire)
    }

    fn last_read_time(&self) -> Instant {
        *self.state.last_read.lock().unwrap()
    }

    fn stop(&self) {
        self.state.stop.cancel();
    }
}

struct StreamTask {
    state: Arc<StreamState>,
    cancel: CancellationToken,
    waker: Option<Arc<dyn Waker>>,
    lines: BoundedSender<LogLine>,
    path: PathBuf,
}

impl StreamTask {
    async fn run(self, file: std::fs::File, mut inode: Option<u64>) {
        debug!(path = ?self.path, "file stream started");

        let mut reader = BufReader::new(tokio::fs::File::from_std(file));
        let mut offset: u64 = 0;
        let mut partial = String::new();

        'tail: loop {
            // One pass: read everything the file has right now.
            loop {
                let mut buf = String::new();
                match reader.read_line(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        offset += n as u64;
                        *self.state.last_read.lock().unwrap() = Instant::now();
                        if buf.ends_with('\n') {
                            buf.pop();
                            if buf.ends_with('\r') {
                                buf.pop();
                            }
                            let text = if partial.is_empty() {
                                buf
                            } else {
                                let mut text = std::mem::take(&mut partial);
                                text.push_str(&buf);
                                text
                            };
                            if self.lines.send(LogLine::new(&self.path, text)).await.is_err() {
                                debug!(path = ?self.path, "lines channel disconnected");
                                break 'tail;
                            }
                        } else {
                            // Unterminated tail of the file; hold it until
                            // the writer finishes the line.
                            partial.push_str(&buf);
                        }
                    }
                    Err(error) => {
                        warn!(path = ?self.path, %error, "read failed");
                        break;
                    }
                }
            }

            // A stop or cancel observed here comes after a full pass.
            if self.state.stop.is_cancelled() || self.cancel.is_cancelled() {
                break;
            }

            // Truncation or replacement under the same path restarts the
            // read from the top of the new content.
            if let Ok(meta) = tokio::fs::metadata(&self.path).await {
                let replaced = inode.is_some() && inode_of(&meta) != inode;
                if replaced || meta.len() < offset {
                    match tokio::fs::File::open(&self.path).await {
                        Ok(file) => {
                            info!(path = ?self.path, "source rotated, reopening from start");
                            reader = BufReader::new(file);
                            offset = 0;
                            partial.clear();
                            inode = inode_of(&meta);
                            continue;
                        }
                        Err(error) => {
                            debug!(path = ?self.path, %error, "rotated source not readable yet");
                        }
                    }
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = self.state.stop.cancelled() => {}
                _ = idle_wait(&self.waker) => {}
            }
        }

        if !partial.is_empty() {
            let text = std::mem::take(&mut partial);
            let _ = self.lines.send(LogLine::new(&self.path, text)).await;
        }
        self.state.complete.store(true, Ordering::Release);
        debug!(path = ?self.path, "file stream complete");
    }
}

async fn idle_wait(waker: &Option<Arc<dyn Waker>>) {
    match waker {
        Some(waker) => waker.wake().await,
        None => tokio::time::sleep(DEFAULT_IDLE_WAIT).await,
    }
}

#[cfg(unix)]
fn inode_of(meta: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn inode_of(_meta: &std::fs::Metadata) -> Option<u64> {
    None
}
