/// Profiles are owned by the profile service; their ids are opaque strings.
pub type ProfileId = String;

/// Notification primary keys are time-ordered UUIDs (v7).
pub type NotificationId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
