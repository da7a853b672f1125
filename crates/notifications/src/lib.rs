//! Marketplace notification delivery pipeline.
//!
//! Application code raises notifications through the
//! [`NotificationFacade`], which records each one durably and hands it to the
//! in-process [`DeliveryQueue`]. A single [`DeliveryWorker`] drains the queue
//! and pushes every notification to connected clients through a
//! [`NotificationTransport`].
//!
//! - [`message`]: transient queue messages and the client payload.
//! - [`queue`]: FIFO delivery queue, bounded or unbounded.
//! - [`store`]: persistence port with PostgreSQL and in-memory backends.
//! - [`transport`]: push transport port.
//! - [`facade`]: producer-side entry point.
//! - [`templates`]: notification drafts for platform events.
//! - [`worker`]: the delivery consumer loop.
//! - [`cleanup`]: periodic retention job for read notifications.
//! - [`config`]: pipeline settings loaded from the environment.

pub mod cleanup;
pub mod config;
pub mod facade;
pub mod message;
pub mod queue;
pub mod store;
pub mod templates;
pub mod transport;
pub mod worker;

pub use config::{DeliveryMode, PipelineConfig};
pub use facade::{NotificationFacade, NotifyError};
pub use message::{DeliveryMessage, SendNotificationMessage, SendNotificationsRequestMessage};
pub use queue::{DeliveryQueue, QueueError, QueueReceiver, QueueSender};
pub use store::{MemoryNotificationStore, NotificationStore, PgNotificationStore, StoreError};
pub use transport::{NotificationTransport, TransportError};
pub use worker::{DeliveryConfig, DeliveryStats, DeliveryWorker, WorkerHandle, WorkerState};
