//! In-process FIFO delivery queue.
//!
//! [`DeliveryQueue`] connects any number of producers ([`QueueSender`],
//! cheaply cloneable) to the single delivery consumer ([`QueueReceiver`]).
//! It is backed by a `tokio::sync::mpsc` channel, bounded or unbounded, plus
//! a `watch` flag that lets either side close the queue while producer
//! handles are still alive.
//!
//! Closing never loses work: messages already enqueued are still returned by
//! [`QueueReceiver::dequeue`], which yields `None` only once the queue is
//! closed and drained.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::message::DeliveryMessage;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error returned when a message cannot be enqueued.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed or its consumer is gone.
    #[error("delivery queue is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// DeliveryQueue
// ---------------------------------------------------------------------------

/// Constructors for the producer/consumer handle pair.
pub struct DeliveryQueue;

impl DeliveryQueue {
    /// Create a queue holding at most `capacity` messages.
    ///
    /// When full, [`QueueSender::enqueue`] waits for space.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> (QueueSender, QueueReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        Self::assemble(Tx::Bounded(tx), Rx::Bounded(rx))
    }

    /// Create a queue without a capacity limit.
    pub fn unbounded() -> (QueueSender, QueueReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::assemble(Tx::Unbounded(tx), Rx::Unbounded(rx))
    }

    /// Bounded when `capacity` is a positive number, unbounded otherwise.
    pub fn from_capacity(capacity: Option<usize>) -> (QueueSender, QueueReceiver) {
        match capacity {
            Some(n) if n > 0 => Self::bounded(n),
            _ => Self::unbounded(),
        }
    }

    fn assemble(tx: Tx, rx: Rx) -> (QueueSender, QueueReceiver) {
        let (closed_tx, closed_rx) = watch::channel(false);
        let closed = Arc::new(closed_tx);
        let sender = QueueSender {
            tx,
            closed: Arc::clone(&closed),
        };
        let receiver = QueueReceiver {
            rx,
            closed,
            closed_rx,
            draining: false,
        };
        (sender, receiver)
    }
}

// ---------------------------------------------------------------------------
// Channel flavours
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Tx {
    Bounded(mpsc::Sender<DeliveryMessage>),
    Unbounded(mpsc::UnboundedSender<DeliveryMessage>),
}

enum Rx {
    Bounded(mpsc::Receiver<DeliveryMessage>),
    Unbounded(mpsc::UnboundedReceiver<DeliveryMessage>),
}

impl Rx {
    async fn recv(&mut self) -> Option<DeliveryMessage> {
        match self {
            Rx::Bounded(rx) => rx.recv().await,
            Rx::Unbounded(rx) => rx.recv().await,
        }
    }

    fn close(&mut self) {
        match self {
            Rx::Bounded(rx) => rx.close(),
            Rx::Unbounded(rx) => rx.close(),
        }
    }
}

// ---------------------------------------------------------------------------
// QueueSender
// ---------------------------------------------------------------------------

/// Producer handle. Clone it freely; all clones feed the same queue.
#[derive(Clone)]
pub struct QueueSender {
    tx: Tx,
    closed: Arc<watch::Sender<bool>>,
}

impl QueueSender {
    /// Append a message to the tail of the queue.
    ///
    /// Waits for space when the queue is bounded and full. Fails with
    /// [`QueueError::Closed`] once the queue has been closed.
    pub async fn enqueue(&self, message: DeliveryMessage) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }
        match &self.tx {
            Tx::Bounded(tx) => tx.send(message).await.map_err(|_| QueueError::Closed),
            Tx::Unbounded(tx) => tx.send(message).map_err(|_| QueueError::Closed),
        }
    }

    /// Stop accepting messages. Already-queued messages are still delivered.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Whether the queue no longer accepts messages.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
            || match &self.tx {
                Tx::Bounded(tx) => tx.is_closed(),
                Tx::Unbounded(tx) => tx.is_closed(),
            }
    }
}

// ---------------------------------------------------------------------------
// QueueReceiver
// ---------------------------------------------------------------------------

/// Consumer handle. There is exactly one per queue.
pub struct QueueReceiver {
    rx: Rx,
    closed: Arc<watch::Sender<bool>>,
    closed_rx: watch::Receiver<bool>,
    draining: bool,
}

impl QueueReceiver {
    /// Remove and return the head of the queue, waiting while it is empty.
    ///
    /// Returns `None` once the queue is closed and every message enqueued
    /// before the close has been returned, or when all producers are gone.
    /// Cancel safe.
    pub async fn dequeue(&mut self) -> Option<DeliveryMessage> {
        if !self.draining {
            tokio::select! {
                biased;
                message = self.rx.recv() => return message,
                _ = self.closed_rx.wait_for(|closed| *closed) => {}
            }
            self.start_draining();
        }
        self.rx.recv().await
    }

    /// Close the queue from the consumer side.
    pub fn close(&mut self) {
        self.closed.send_replace(true);
        self.start_draining();
    }

    /// Whether the queue has been closed by either side.
    pub fn is_closed(&self) -> bool {
        self.draining || *self.closed.borrow()
    }

    // Closing the channel itself rejects late sends from producers that
    // checked the flag just before it flipped.
    fn start_draining(&mut self) {
        self.rx.close();
        self.draining = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
