//! Error types for tagflow.

/// Top-level error type for the tag subsystem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Template engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Persistent tag store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Template engine errors. The engine is an external collaborator; its
/// failures arrive here as opaque diagnostic text.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Template processing failed: {0}")]
    Process(String),
}

/// Chat platform errors.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Failed to send message to channel {channel}: {reason}")]
    SendFailed { channel: String, reason: String },

    #[error("Failed to delete message {message}: {reason}")]
    DeleteFailed { message: String, reason: String },

    #[error("Failed to add reaction {emoji}: {reason}")]
    ReactionFailed { emoji: String, reason: String },

    #[error("Could not open DM channel with user {user}")]
    DmUnavailable { user: String },

    #[error("Missing permission: {0}")]
    PermissionDenied(String),

    #[error("Command invocation failed: {0}")]
    InvokeFailed(String),
}

/// Invocation pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Command surface errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid tag name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Tag `{name}` is already registered")]
    AlreadyExists { name: String },

    #[error("Tag `{name}` not found")]
    NotFound { name: String },

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Result type alias for the tag subsystem.
pub type Result<T> = std::result::Result<T, Error>;
