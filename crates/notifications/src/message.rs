//! Messages carried by the delivery queue.
//!
//! [`SendNotificationMessage`] is also the payload pushed to clients: it is
//! serialised as a flat camelCase JSON object.

use marketplace_core::types::{NotificationId, ProfileId, Timestamp};
use marketplace_db::models::notification::Notification;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SendNotificationMessage
// ---------------------------------------------------------------------------

/// Denormalised copy of a recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationMessage {
    pub id: NotificationId,
    pub recipient_id: ProfileId,
    pub sender_id: Option<ProfileId>,
    pub message: String,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub icon_url: Option<String>,
    pub icon_action_url: Option<String>,
    pub created_at: Timestamp,
}

impl From<Notification> for SendNotificationMessage {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            recipient_id: n.recipient_id,
            sender_id: n.sender_id,
            message: n.message,
            is_read: n.is_read,
            action_url: n.action_url,
            icon_url: n.icon_url,
            icon_action_url: n.icon_action_url,
            created_at: n.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// SendNotificationsRequestMessage
// ---------------------------------------------------------------------------

/// An ordered batch of notifications raised by a single fan-out action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendNotificationsRequestMessage {
    pub notifications: Vec<SendNotificationMessage>,
}

// ---------------------------------------------------------------------------
// DeliveryMessage
// ---------------------------------------------------------------------------

/// A unit of work on the delivery queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMessage {
    Single(SendNotificationMessage),
    Batch(SendNotificationsRequestMessage),
}

impl DeliveryMessage {
    /// Number of notifications carried by this message.
    pub fn len(&self) -> usize {
        match self {
            DeliveryMessage::Single(_) => 1,
            DeliveryMessage::Batch(batch) => batch.notifications.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into individual notifications, preserving batch order.
    pub fn into_notifications(self) -> Vec<SendNotificationMessage> {
        match self {
            DeliveryMessage::Single(n) => vec![n],
            DeliveryMessage::Batch(batch) => batch.notifications,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample(recipient: &str) -> SendNotificationMessage {
        SendNotificationMessage {
            id: uuid::Uuid::now_v7(),
            recipient_id: recipient.to_string(),
            sender_id: None,
            message: "hello".to_string(),
            is_read: false,
            action_url: Some("/offers".to_string()),
            icon_url: None,
            icon_action_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payload_serialises_as_flat_camel_case_object() {
        let json = serde_json::to_value(sample("p1")).unwrap();

        assert_eq!(json["recipientId"], "p1");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["actionUrl"], "/offers");
        assert!(json["senderId"].is_null());
        assert!(json["iconActionUrl"].is_null());
        assert!(json["createdAt"].is_string());
        assert!(json["id"].is_string());
    }

    #[test]
    fn batch_flattens_in_order() {
        let batch = DeliveryMessage::Batch(SendNotificationsRequestMessage {
            notifications: vec![sample("a"), sample("b"), sample("c")],
        });
        assert_eq!(batch.len(), 3);

        let recipients: Vec<_> = batch
            .into_notifications()
            .into_iter()
            .map(|n| n.recipient_id)
            .collect();
        assert_eq!(recipients, ["a", "b", "c"]);
    }

    #[test]
    fn single_has_length_one() {
        let single = DeliveryMessage::Single(sample("a"));
        assert_eq!(single.len(), 1);
        assert!(!single.is_empty());
    }
}
