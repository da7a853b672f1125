//! Delivery worker: the single consumer of the delivery queue.
//!
//! [`DeliveryWorker::run`] drains the queue and pushes every notification to
//! the transport, one send attempt per notification. A failing, hanging or
//! panicking send is logged with the notification id and the loop moves on;
//! nothing is retried or re-queued because the record is already durable and
//! shows up in the recipient's history regardless.
//!
//! The loop stops when its [`CancellationToken`] is cancelled, or once the
//! queue is closed and drained.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{DeliveryMode, PipelineConfig};
use crate::message::SendNotificationMessage;
use crate::queue::QueueReceiver;
use crate::transport::{NotificationTransport, TransportError};

// ---------------------------------------------------------------------------
// Configuration and reporting types
// ---------------------------------------------------------------------------

/// Settings that shape each delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    /// Upper bound on a single send; `None` waits for the transport.
    pub send_timeout: Option<Duration>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for DeliveryConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            mode: config.delivery_mode,
            send_timeout: config.send_timeout,
        }
    }
}

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Looping dequeue → send.
    Running,
    /// Not consuming; either not started yet or finished.
    Stopped,
}

/// Result of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handed to the transport, which reached this many connections.
    Delivered { connections: usize },
    /// The transport returned an error or panicked.
    Failed,
    /// The send did not finish within the configured timeout.
    TimedOut,
}

/// Totals over the lifetime of one [`DeliveryWorker::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
    pub timed_out: u64,
}

impl DeliveryStats {
    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered { .. } => self.delivered += 1,
            DeliveryOutcome::Failed => self.failed += 1,
            DeliveryOutcome::TimedOut => self.timed_out += 1,
        }
    }

    /// Number of send attempts made.
    pub fn attempts(&self) -> u64 {
        self.delivered + self.failed + self.timed_out
    }
}

/// Read-only view of a worker's state, usable after the worker is moved
/// into its task.
#[derive(Clone)]
pub struct WorkerHandle {
    state: watch::Receiver<WorkerState>,
}

impl WorkerHandle {
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }
}

// ---------------------------------------------------------------------------
// DeliveryWorker
// ---------------------------------------------------------------------------

/// Background consumer that bridges the delivery queue to the transport.
pub struct DeliveryWorker {
    receiver: QueueReceiver,
    transport: Arc<dyn NotificationTransport>,
    config: DeliveryConfig,
    state: watch::Sender<WorkerState>,
}

impl DeliveryWorker {
    pub fn new(
        receiver: QueueReceiver,
        transport: Arc<dyn NotificationTransport>,
        config: DeliveryConfig,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Stopped);
        Self {
            receiver,
            transport,
            config,
            state,
        }
    }

    /// A handle that reports this worker's state.
    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            state: self.state.subscribe(),
        }
    }

    /// Run the delivery loop until `cancel` fires or the queue is closed and
    /// drained.
    ///
    /// A message that is being delivered when `cancel` fires is finished;
    /// no further messages are pulled.
    ///
    /// The state goes back to [`WorkerState::Stopped`] however the loop
    /// ends, including when the future is dropped or unwinds.
    pub async fn run(mut self, cancel: CancellationToken) -> DeliveryStats {
        let mut running = RunningGuard::enter(&self.state);
        tracing::info!(mode = ?self.config.mode, "Delivery worker started");

        let mut stats = DeliveryStats::default();

        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Delivery worker cancelled");
                    break;
                }
                message = self.receiver.dequeue() => message,
            };

            let Some(message) = message else {
                tracing::info!("Delivery queue closed and drained");
                break;
            };

            for notification in message.into_notifications() {
                let outcome = self.deliver(&notification).await;
                stats.record(outcome);
            }
        }

        running.finish();
        tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            timed_out = stats.timed_out,
            "Delivery worker stopped"
        );
        stats
    }

    /// Make exactly one send attempt for a notification.
    async fn deliver(&self, notification: &SendNotificationMessage) -> DeliveryOutcome {
        let attempt = AssertUnwindSafe(self.send(notification)).catch_unwind();

        let result = match self.config.send_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(
                        notification_id = %notification.id,
                        timeout_ms = limit.as_millis() as u64,
                        "Timed out delivering notification"
                    );
                    return DeliveryOutcome::TimedOut;
                }
            },
            None => attempt.await,
        };

        match result {
            Ok(Ok(connections)) => {
                tracing::debug!(
                    notification_id = %notification.id,
                    recipient_id = %notification.recipient_id,
                    connections,
                    "Notification delivered"
                );
                DeliveryOutcome::Delivered { connections }
            }
            Ok(Err(e)) => {
                tracing::error!(
                    notification_id = %notification.id,
                    error = %e,
                    "Failed to deliver notification"
                );
                DeliveryOutcome::Failed
            }
            Err(panic) => {
                tracing::error!(
                    notification_id = %notification.id,
                    panic = panic_message(panic.as_ref()),
                    "Transport panicked while delivering notification"
                );
                DeliveryOutcome::Failed
            }
        }
    }

    async fn send(&self, notification: &SendNotificationMessage) -> Result<usize, TransportError> {
        match self.config.mode {
            DeliveryMode::Group => {
                self.transport
                    .send_to_group(&notification.recipient_id, notification)
                    .await
            }
            DeliveryMode::Broadcast => self.transport.send_to_all(notification).await,
        }
    }
}

/// Holds the worker in [`WorkerState::Running`] until dropped.
struct RunningGuard<'a> {
    state: &'a watch::Sender<WorkerState>,
    finished: bool,
}

impl<'a> RunningGuard<'a> {
    fn enter(state: &'a watch::Sender<WorkerState>) -> Self {
        state.send_replace(WorkerState::Running);
        Self {
            state,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::error!(
                panicking = std::thread::panicking(),
                "Delivery worker exited before its loop finished"
            );
        }
        self.state.send_replace(WorkerState::Stopped);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
