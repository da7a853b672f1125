//! Push transport port.
//!
//! The delivery worker only needs to hand a payload to connected clients;
//! connection lifecycle and group membership belong to the implementation.
//! Sends are fire-and-forget: the returned count is informational and no
//! acknowledgement flows back into the pipeline.

use async_trait::async_trait;
use marketplace_core::types::ProfileId;

use crate::message::SendNotificationMessage;

/// Error type for transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The payload could not be encoded for the wire.
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The transport refused or failed the send.
    #[error("Transport send failed: {0}")]
    Send(String),
}

/// A real-time channel to connected clients.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Push to every connected client. Clients must discard payloads whose
    /// `recipientId` is not their own profile.
    ///
    /// Returns the number of connections the payload was handed to.
    async fn send_to_all(&self, payload: &SendNotificationMessage) -> Result<usize, TransportError>;

    /// Push to the connections of a single profile.
    ///
    /// Returns the number of connections the payload was handed to; zero
    /// means the profile is offline, which is not an error.
    async fn send_to_group(
        &self,
        group: &ProfileId,
        payload: &SendNotificationMessage,
    ) -> Result<usize, TransportError>;
}
