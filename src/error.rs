//! Error types for walletchat.

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session identity persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to read session file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to persist session file {path}: {reason}")]
    PersistFailed { path: String, reason: String },

    #[error("Failed to clear session file {path}: {reason}")]
    ClearFailed { path: String, reason: String },
}

/// Backend gateway errors.
///
/// The gateway recognizes a single failure kind toward callers: a request
/// either yields a full structured reply or fails. `Network` covers both
/// transport failures and non-2xx statuses; `InvalidResponse` covers 2xx
/// bodies that don't decode into the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request to {endpoint} failed: {reason}")]
    Network { endpoint: String, reason: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl GatewayError {
    /// Whether a manual retry of the same request is reasonable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Terminal channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to initialize line editor: {0}")]
    EditorInit(String),

    #[error("Input error: {0}")]
    Input(String),
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
