use thiserror::Error;

/// Errors raised while publishing or consuming events.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A topic name is not one of the known topics.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// The transport refused the message.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// A handler could not apply an event.
    #[error("Handler {handler} failed: {reason}")]
    Handler {
        handler: &'static str,
        reason: String,
    },
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
