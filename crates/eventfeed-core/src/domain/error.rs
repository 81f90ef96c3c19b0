//! Domain-level error taxonomy for eventfeed.

use eventfeed_state::{EventId, StorageError};

/// Errors produced by configuration validation and loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one secret must be configured")]
    NoSecrets,

    #[error("secrets must be non-empty strings")]
    EmptySecret,

    #[error("{field} must be a positive integer")]
    NonPositive { field: &'static str },

    #[error("events_order entry {index} has an empty expression")]
    EmptyOrderExpression { index: usize },

    #[error("template.title must not be empty")]
    MissingTitle,

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while turning window events into a feed document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unsupported feed format: {0}")]
    UnknownFormat(String),

    #[error("event {event_id}: {field} {value:?} is not a valid timestamp")]
    InvalidTimestamp {
        event_id: EventId,
        field: &'static str,
        value: String,
    },

    #[error("event {event_id}: ends_at does not follow starts_at")]
    EndsBeforeStart { event_id: EventId },

    #[error("event {event_id}: starts_at and ends_at mix a date with a date-time")]
    MixedTimeKinds { event_id: EventId },

    #[error("event {event_id}: url {value:?} contains control characters")]
    InvalidUrl { event_id: EventId, value: String },

    #[error("event {event_id}: required field {field} rendered empty")]
    MissingField {
        event_id: EventId,
        field: &'static str,
    },

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// eventfeed domain errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeedError {
    /// HTTP status a host should answer with when a request fails this way.
    pub fn status_code(&self) -> u16 {
        match self {
            FeedError::Render(RenderError::UnknownFormat(_)) => 400,
            _ => 500,
        }
    }
}

/// Result type for eventfeed domain operations.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NonPositive {
            field: "events_to_show",
        };
        assert!(err.to_string().contains("events_to_show"));

        let err = ConfigError::NoSecrets;
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn test_render_error_names_event_and_field() {
        let err = RenderError::InvalidTimestamp {
            event_id: EventId(42),
            field: "starts_at",
            value: "tomorrow-ish".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("starts_at"));
        assert!(msg.contains("tomorrow-ish"));
    }

    #[test]
    fn test_status_codes() {
        let err = FeedError::from(RenderError::UnknownFormat("atom".into()));
        assert_eq!(err.status_code(), 400);

        let err = FeedError::from(StorageError::Backend("down".into()));
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("storage error"));
    }
}
