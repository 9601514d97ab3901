use thiserror::Error;

/// Errors that can occur while generating or publishing telemetry.
///
/// Inside the publish loop every variant is converted into a cycle-local
/// failure outcome; only configuration errors surface to the caller.
#[derive(Error, Debug)]
pub enum SimError {
    /// The broker data endpoint could not be resolved for this attempt.
    #[error("endpoint resolution failed: {0}")]
    EndpointResolution(String),

    /// The broker or transport rejected the message.
    #[error("publish failed: {0}")]
    Publish(String),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport adapter could not be created or used.
    #[error("transport error: {0}")]
    Transport(String),

    /// A required configuration value was not provided.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// Configuration values contradict each other.
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),
}

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
