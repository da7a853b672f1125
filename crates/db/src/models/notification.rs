//! Notification entity model and insert DTO.

use marketplace_core::notification::NewNotification;
use marketplace_core::types::{NotificationId, ProfileId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
///
/// Serialised in camelCase, matching the live delivery payload.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
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

/// A fully-formed notification ready to be inserted.
///
/// The id and timestamp are assigned by the caller so the record can be
/// referenced before the insert completes.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub id: NotificationId,
    pub created_at: Timestamp,
    pub draft: NewNotification,
}

impl CreateNotification {
    /// Stamp a draft with a fresh v7 id and the current time.
    pub fn stamp(draft: NewNotification) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            created_at: chrono::Utc::now(),
            draft,
        }
    }

    /// The row this insert produces. New notifications are always unread.
    pub fn into_row(self) -> Notification {
        Notification {
            id: self.id,
            recipient_id: self.draft.recipient_id,
            sender_id: self.draft.sender_id,
            message: self.draft.message,
            is_read: false,
            action_url: self.draft.action_url,
            icon_url: self.draft.icon_url,
            icon_action_url: self.draft.icon_action_url,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_rows_are_unread_with_distinct_ids() {
        let draft = NewNotification::new("p1", "hello");
        let a = CreateNotification::stamp(draft.clone()).into_row();
        let b = CreateNotification::stamp(draft).into_row();

        assert!(!a.is_read);
        assert_ne!(a.id, b.id);
        assert_eq!(a.recipient_id, "p1");
        assert_eq!(a.message, "hello");
    }

    #[test]
    fn rows_serialize_with_camel_case_keys() {
        let draft = NewNotification::new("p1", "hello").from_sender("p2");
        let json = serde_json::to_value(CreateNotification::stamp(draft).into_row()).unwrap();

        assert_eq!(json["recipientId"], "p1");
        assert_eq!(json["senderId"], "p2");
        assert_eq!(json["isRead"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("recipient_id").is_none());
    }
}
