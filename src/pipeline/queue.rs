//! Dispatch queue between the listener and the dispatcher
//!
//! FIFO, single producer / single consumer. Unbounded by default; when bounded,
//! a full queue rejects the new command and leaves the queued ones alone.

use super::shutdown::Shutdown;
use feedbot_shared::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Capacity policy for the dispatch queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePolicy {
    #[default]
    Unbounded,
    /// Reject new commands once `capacity` are pending
    Bounded { capacity: usize },
}

/// Enqueue failures. The rejected command is handed back.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("dispatch queue is full")]
    Full(Command),

    #[error("dispatcher has stopped")]
    Closed(Command),
}

enum SenderInner {
    Unbounded(mpsc::UnboundedSender<Command>),
    Bounded(mpsc::Sender<Command>),
}

enum ReceiverInner {
    Unbounded(mpsc::UnboundedReceiver<Command>),
    Bounded(mpsc::Receiver<Command>),
}

/// Producer half, owned by the listener
pub struct QueueSender {
    inner: SenderInner,
    pending: Arc<AtomicUsize>,
}

/// Consumer half, owned by the dispatcher
pub struct QueueReceiver {
    inner: ReceiverInner,
    pending: Arc<AtomicUsize>,
}

/// Create the queue for the given policy
pub fn dispatch_queue(policy: QueuePolicy) -> (QueueSender, QueueReceiver) {
    let pending = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = match policy {
        QueuePolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (SenderInner::Unbounded(tx), ReceiverInner::Unbounded(rx))
        }
        QueuePolicy::Bounded { capacity } => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (SenderInner::Bounded(tx), ReceiverInner::Bounded(rx))
        }
    };

    (
        QueueSender {
            inner: tx,
            pending: pending.clone(),
        },
        QueueReceiver { inner: rx, pending },
    )
}

impl QueueSender {
    /// Append to the tail. Never waits.
    pub fn enqueue(&self, command: Command) -> Result<(), QueueError> {
        self.pending.fetch_add(1, Ordering::SeqCst);

        let result = match &self.inner {
            SenderInner::Unbounded(tx) => tx.send(command).map_err(|e| QueueError::Closed(e.0)),
            SenderInner::Bounded(tx) => tx.try_send(command).map_err(|e| match e {
                TrySendError::Full(command) => QueueError::Full(command),
                TrySendError::Closed(command) => QueueError::Closed(command),
            }),
        };

        if result.is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }

    /// Commands queued but not yet taken by the dispatcher
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl QueueReceiver {
    /// Wait for the head of the queue.
    ///
    /// Returns `None` once shutdown is triggered, or once the sender is gone
    /// and the queue is empty.
    pub async fn dequeue(&mut self, shutdown: &mut Shutdown) -> Option<Command> {
        let command = tokio::select! {
            biased;
            _ = shutdown.wait() => return None,
            command = self.recv() => command?,
        };

        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(command)
    }

    async fn recv(&mut self) -> Option<Command> {
        match &mut self.inner {
            ReceiverInner::Unbounded(rx) => rx.recv().await,
            ReceiverInner::Bounded(rx) => rx.recv().await,
        }
    }
}
