//! Error types for the lead bot.
//!
//! The conversation engine itself never fails; these cover the collaborators
//! around it (configuration, transports, lead sinks).

/// Error returned by the bot's main loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("No channel registered under name {0}")]
    UnknownChannel(String),

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },
}

/// Errors raised while handing a finished lead to a sink.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Lead sink {sink} failed: {reason}")]
    SinkFailed { sink: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}
