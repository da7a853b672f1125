use std::str::FromStr;
use std::time::Duration;

/// How the delivery worker addresses the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Send only to the recipient's connection group.
    #[default]
    Group,
    /// Send to every connected client; clients filter on `recipientId`.
    Broadcast,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(DeliveryMode::Group),
            "broadcast" => Ok(DeliveryMode::Broadcast),
            other => Err(format!("unknown delivery mode '{other}'")),
        }
    }
}

/// Default per-send transport timeout.
const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;

/// Default age after which read notifications are purged.
const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Default interval between retention runs.
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Notification pipeline configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Queue capacity; `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// Transport addressing mode.
    pub delivery_mode: DeliveryMode,
    /// Upper bound on a single transport send; `None` waits indefinitely.
    pub send_timeout: Option<Duration>,
    /// Read notifications older than this many days are purged.
    pub retention_days: i64,
    /// How often the retention job runs.
    pub cleanup_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            delivery_mode: DeliveryMode::default(),
            send_timeout: Some(Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS)),
            retention_days: DEFAULT_RETENTION_DAYS,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                              | Default     |
    /// |--------------------------------------|-------------|
    /// | `NOTIFICATION_QUEUE_CAPACITY`        | unbounded   |
    /// | `NOTIFICATION_DELIVERY_MODE`         | `group`     |
    /// | `NOTIFICATION_SEND_TIMEOUT_MS`       | `10000`     |
    /// | `NOTIFICATION_RETENTION_DAYS`        | `30`        |
    /// | `NOTIFICATION_CLEANUP_INTERVAL_SECS` | `3600`      |
    ///
    /// A capacity or timeout of `0` disables the limit.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to
    /// the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let queue_capacity = match parse_or_warn::<usize>(&lookup, "NOTIFICATION_QUEUE_CAPACITY") {
            Some(0) | None => None,
            Some(n) => Some(n),
        };

        let delivery_mode = parse_or_warn(&lookup, "NOTIFICATION_DELIVERY_MODE")
            .unwrap_or(defaults.delivery_mode);

        let send_timeout = match parse_or_warn::<u64>(&lookup, "NOTIFICATION_SEND_TIMEOUT_MS") {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.send_timeout,
        };

        let retention_days = parse_or_warn::<i64>(&lookup, "NOTIFICATION_RETENTION_DAYS")
            .filter(|d| *d > 0)
            .unwrap_or(defaults.retention_days);

        let cleanup_interval =
            parse_or_warn::<u64>(&lookup, "NOTIFICATION_CLEANUP_INTERVAL_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval);

        Self {
            queue_capacity,
            delivery_mode,
            send_timeout,
            retention_days,
            cleanup_interval,
        }
    }
}

fn parse_or_warn<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
