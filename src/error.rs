use std::time::Duration;
use thiserror::Error;

/// Crate-wide error type, categorized by who can fix the failure
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Environment configuration error: {0}")]
    Env(#[from] envy::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // I/O errors (potentially transient)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Network errors (transient)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded: retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },

    // Caller input errors (permanent - never retried, never cached)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid detail level: {level}. Must be 1, 2, or 3")]
    InvalidLevel { level: u8 },

    #[error("paper_id is required for level {level} summaries (full text analysis)")]
    MissingIdentifier { level: u8 },

    // Generative model errors
    #[error("Language model returned HTTP {status}: {message}")]
    Llm { status: u16, message: String },

    #[error("Language model output violated the summary contract: {message}")]
    ModelContract { message: String },

    // Server errors (transient)
    #[error("Service temporarily unavailable: {service} - {reason}")]
    ServiceUnavailable { service: String, reason: String },

    #[error("Timeout error: operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    // Parse errors
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    // General service error
    #[error("Service error: {0}")]
    Service(String),

    // Provider errors
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Error categorization for callers deciding whether to try again
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Permanent errors - should not retry
    Permanent,
    /// Transient errors - a later attempt may succeed
    Transient,
    /// Rate limited - retry with backoff
    RateLimited,
}

impl Error {
    /// Categorize error for retry logic
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_)
            | Self::Env(_)
            | Self::Toml(_)
            | Self::InvalidInput { .. }
            | Self::InvalidLevel { .. }
            | Self::MissingIdentifier { .. }
            | Self::ModelContract { .. }
            | Self::Parse { .. }
            | Self::Serde(_) => ErrorCategory::Permanent,

            Self::RateLimitExceeded { .. } => ErrorCategory::RateLimited,

            Self::Llm { status, .. } => match *status {
                429 => ErrorCategory::RateLimited,
                400..=499 => ErrorCategory::Permanent,
                _ => ErrorCategory::Transient,
            },

            Self::Http(_)
            | Self::Io(_)
            | Self::ServiceUnavailable { .. }
            | Self::Timeout { .. }
            | Self::Service(_)
            | Self::Provider(_) => ErrorCategory::Transient,
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::RateLimited
        )
    }

    /// Whether the request itself was wrong (bad level, missing id, bounds)
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::InvalidLevel { .. } | Self::MissingIdentifier { .. }
        )
    }

    /// Get suggested retry delay for rate limited errors
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// Provider error conversion
impl From<crate::client::providers::ProviderError> for Error {
    fn from(err: crate::client::providers::ProviderError) -> Self {
        use crate::client::providers::ProviderError;

        match err {
            ProviderError::Network(msg) => Self::Provider(format!("Network error: {msg}")),
            ProviderError::Parse(msg) => Self::Parse {
                context: "provider".to_string(),
                message: msg,
            },
            ProviderError::RateLimit => Self::RateLimitExceeded {
                retry_after: Duration::from_secs(60),
            },
            ProviderError::InvalidQuery(msg) => Self::InvalidInput {
                field: "query".to_string(),
                reason: msg,
            },
            ProviderError::ServiceUnavailable(msg) => Self::ServiceUnavailable {
                service: "provider".to_string(),
                reason: msg,
            },
            ProviderError::Timeout => Self::Timeout {
                timeout: Duration::from_secs(30),
            },
            ProviderError::Other(msg) => Self::Provider(msg),
        }
    }
}
