// SPDX-License-Identifier: Apache-2.0

//! Bounded channel carrying log-line events from stream tasks to the
//! pipeline consumer.
//!
//! Thin wrapper over flume. Every tailed source holds a sender clone; the
//! channel disconnects when the last sender drops, which is how the tailer
//! signals end-of-stream exactly once.

use flume::{Receiver, Sender};
use std::fmt;

/// Create a bounded channel with the given capacity.
pub fn bounded<T>(capacity: usize) -> (BoundedSender<T>, BoundedReceiver<T>) {
    let (tx, rx) = flume::bounded(capacity);
    (BoundedSender { tx }, BoundedReceiver { rx })
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendError {
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Disconnected => write!(f, "channel disconnected"),
        }
    }
}

impl std::error::Error for SendError {}

pub struct BoundedSender<T> {
    tx: Sender<T>,
}

impl<T> BoundedSender<T> {
    /// Send an item, waiting for capacity. Fails once the receiver is gone.
    pub async fn send(&self, item: T) -> Result<(), SendError> {
        self.tx
            .send_async(item)
            .await
            .map_err(|_| SendError::Disconnected)
    }

    pub fn is_disconnected(&self) -> bool {
        self.tx.is_disconnected()
    }
}

impl<T> Clone for BoundedSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

pub struct BoundedReceiver<T> {
    rx: Receiver<T>,
}

impl<T> BoundedReceiver<T> {
    /// Receive the next item, or `None` once all senders have dropped and
    /// the channel is drained.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_recv() {
        let (tx, mut rx) = bounded::<u32>(4);
        tx.send(7).await.unwrap();
        assert_eq!(rx.next().await, Some(7));
    }

    #[tokio::test]
    async fn test_recv_none_after_all_senders_drop() {
        let (tx, mut rx) = bounded::<u32>(4);
        let tx2 = tx.clone();
        tx.send(1).await.unwrap();
        drop(tx);
        tx2.send(2).await.unwrap();
        drop(tx2);

        assert_eq!(rx.next().await, Some(1));
        assert_eq!(rx.next().await, Some(2));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_send_fails_without_receiver() {
        let (tx, rx) = bounded::<u32>(1);
        drop(rx);
        assert_eq!(tx.send(1).await, Err(SendError::Disconnected));
        assert!(tx.is_disconnected());
    }
}
