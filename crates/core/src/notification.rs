//! Notification drafts and their field limits.
//!
//! A [`NewNotification`] is what application code hands to the notification
//! facade. It carries every user-facing field of a notification; the id,
//! read flag and creation timestamp are assigned when it is recorded.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::ProfileId;

/// Maximum length of a notification message, in characters.
pub const MAX_MESSAGE_LEN: usize = 500;

/// Maximum length of any notification URL field, in characters.
pub const MAX_URL_LEN: usize = 2000;

/// A notification that has not been recorded yet.
///
/// Constructed via [`NewNotification::new`] and enriched with the builder
/// methods [`from_sender`](NewNotification::from_sender),
/// [`with_action_url`](NewNotification::with_action_url),
/// [`with_icon_url`](NewNotification::with_icon_url) and
/// [`with_icon_action_url`](NewNotification::with_icon_action_url).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewNotification {
    /// Profile that should receive the notification.
    #[validate(length(min = 1))]
    pub recipient_id: ProfileId,

    /// Profile whose action triggered the notification, `None` for system
    /// notifications.
    pub sender_id: Option<ProfileId>,

    /// Human-readable text shown to the recipient.
    #[validate(length(min = 1, max = 500))]
    pub message: String,

    /// Where the client navigates when the notification is clicked.
    #[validate(length(max = 2000))]
    pub action_url: Option<String>,

    /// Icon rendered next to the notification (usually the sender's avatar).
    #[validate(length(max = 2000))]
    pub icon_url: Option<String>,

    /// Where the client navigates when the icon is clicked.
    #[validate(length(max = 2000))]
    pub icon_action_url: Option<String>,
}

impl NewNotification {
    /// Create a system notification with only the required fields.
    pub fn new(recipient_id: impl Into<ProfileId>, message: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            sender_id: None,
            message: message.into(),
            action_url: None,
            icon_url: None,
            icon_action_url: None,
        }
    }

    /// Attach the profile that triggered the notification.
    pub fn from_sender(mut self, sender_id: impl Into<ProfileId>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set the navigation target of the notification.
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    /// Set the icon URL. `None` keeps the field empty, which is convenient
    /// when the sender has no profile picture.
    pub fn with_icon_url(mut self, url: Option<String>) -> Self {
        self.icon_url = url;
        self
    }

    /// Set the navigation target of the icon.
    pub fn with_icon_action_url(mut self, url: impl Into<String>) -> Self {
        self.icon_action_url = Some(url.into());
        self
    }

    /// Whether the recipient is also the sender.
    ///
    /// Users are never notified about their own actions.
    pub fn is_self_notification(&self) -> bool {
        self.sender_id.as_deref() == Some(self.recipient_id.as_str())
    }

    /// Check field presence and length limits.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let draft = NewNotification::new("p1", "You got a job offer")
            .from_sender("p2")
            .with_action_url("/offers")
            .with_icon_url(Some("https://cdn.example/p2.png".to_string()))
            .with_icon_action_url("/profile/p2");

        assert_eq!(draft.recipient_id, "p1");
        assert_eq!(draft.sender_id.as_deref(), Some("p2"));
        assert_eq!(draft.action_url.as_deref(), Some("/offers"));
        assert_eq!(draft.icon_url.as_deref(), Some("https://cdn.example/p2.png"));
        assert_eq!(draft.icon_action_url.as_deref(), Some("/profile/p2"));
        assert!(draft.check().is_ok());
    }

    #[test]
    fn system_notification_has_no_sender() {
        let draft = NewNotification::new("p1", "Your post was restored");
        assert!(draft.sender_id.is_none());
        assert!(!draft.is_self_notification());
    }

    #[test]
    fn detects_self_notification() {
        let draft = NewNotification::new("p1", "hi").from_sender("p1");
        assert!(draft.is_self_notification());
    }

    #[test]
    fn rejects_empty_message() {
        let draft = NewNotification::new("p1", "");
        assert_matches!(draft.check(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_empty_recipient() {
        let draft = NewNotification::new("", "hello");
        assert_matches!(draft.check(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn message_limit_counts_characters() {
        let at_limit = NewNotification::new("p1", "é".repeat(MAX_MESSAGE_LEN));
        assert!(at_limit.check().is_ok());

        let over = NewNotification::new("p1", "a".repeat(MAX_MESSAGE_LEN + 1));
        assert_matches!(over.check(), Err(CoreError::Validation(msg)) if msg.contains("message"));
    }

    #[test]
    fn rejects_overlong_urls() {
        let long_url = format!("/{}", "x".repeat(MAX_URL_LEN));
        let draft = NewNotification::new("p1", "hello").with_action_url(long_url);
        assert_matches!(draft.check(), Err(CoreError::Validation(msg)) if msg.contains("action_url"));
    }
}
