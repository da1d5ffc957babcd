//! Error types for threadkit.

use thiserror::Error;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Server,
    Api,
    Configuration,
    Serialization,
    /// The remote answered, but not with something the protocol can use.
    MalformedResponse,
    /// A local protocol rule was broken (e.g. a second submission).
    Protocol,
    ToolExecution,
}

/// Primary error type for all threadkit operations.
#[derive(Error, Debug)]
pub enum ThreadError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[cfg(feature = "openai")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No response from assistant")]
    NoResponse,

    #[error("Empty response from assistant")]
    EmptyResponse,

    #[error("Non-text response from assistant ({kind})")]
    NonTextResponse { kind: String },

    #[error("Unsupported required action type: {0}")]
    UnsupportedAction(String),

    #[error("Invalid arguments for tool call {call_id}: {source}")]
    InvalidToolArguments {
        call_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tool outputs were already submitted for this action")]
    AlreadySubmitted,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },
}

impl ThreadError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            #[cfg(feature = "openai")]
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::NoResponse
            | Self::EmptyResponse
            | Self::NonTextResponse { .. }
            | Self::UnsupportedAction(_)
            | Self::InvalidToolArguments { .. } => ErrorCategory::MalformedResponse,
            Self::AlreadySubmitted => ErrorCategory::Protocol,
            Self::UnknownTool(_) | Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
        }
    }

    /// Whether the remote answered with data the protocol cannot use.
    pub fn is_malformed_response(&self) -> bool {
        self.category() == ErrorCategory::MalformedResponse
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ThreadError>;
