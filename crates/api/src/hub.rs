//! WebSocket-backed notification transport.
//!
//! Each notification is pushed as a text frame:
//!
//! ```json
//! {"type": "notification", "data": { "id": "...", "recipientId": "...", ... }}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use marketplace_core::types::ProfileId;
use marketplace_notifications::{NotificationTransport, SendNotificationMessage, TransportError};
use serde::Serialize;

use crate::ws::WsManager;

/// Frame type clients dispatch on.
pub const NOTIFICATION_FRAME_TYPE: &str = "notification";

#[derive(Serialize)]
struct Frame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a SendNotificationMessage,
}

/// Delivers notifications to browser clients through [`WsManager`].
#[derive(Clone)]
pub struct HubTransport {
    ws_manager: Arc<WsManager>,
}

impl HubTransport {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    fn frame(payload: &SendNotificationMessage) -> Result<Message, TransportError> {
        let text = serde_json::to_string(&Frame {
            kind: NOTIFICATION_FRAME_TYPE,
            data: payload,
        })?;
        Ok(Message::Text(text.into()))
    }
}

#[async_trait]
impl NotificationTransport for HubTransport {
    async fn send_to_all(&self, payload: &SendNotificationMessage) -> Result<usize, TransportError> {
        let frame = Self::frame(payload)?;
        Ok(self.ws_manager.broadcast(frame).await)
    }

    async fn send_to_group(
        &self,
        group: &ProfileId,
        payload: &SendNotificationMessage,
    ) -> Result<usize, TransportError> {
        let frame = Self::frame(payload)?;
        Ok(self.ws_manager.send_to_profile(group, frame).await)
    }
}
