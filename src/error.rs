use crate::output_parser::ParseError;
use thiserror::Error;

/// Markers in a provider error message that indicate a transient condition
/// (overload, rate limit, timeout, internal server fault).
pub const TRANSIENT_MARKERS: [&str; 6] = [
    "503",
    "UNAVAILABLE",
    "429",
    "RESOURCE_EXHAUSTED",
    "DEADLINE_EXCEEDED",
    "INTERNAL",
];

/// Errors produced by the generation client, the pipeline and its components.
#[derive(Error, Debug)]
pub enum DebateError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed at the serde level.
    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote generation service rejected or failed the call.
    ///
    /// `message` is inspected for [`TRANSIENT_MARKERS`] when classifying.
    #[error("{message}")]
    Provider {
        /// HTTP status code, when the failure came from an HTTP response.
        status: Option<u16>,
        /// Provider message (typically `HTTP {status}: {body}`).
        message: String,
    },

    /// The service replied with neither text nor a pre-parsed object.
    #[error("Model returned no text and no parsed structured output")]
    EmptyReply,

    /// The reply text could not be coerced into a JSON object.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The reply parsed but does not satisfy the expected schema.
    #[error("Structured output failed validation: {0}")]
    Validation(String),

    /// The reply satisfies the schema but breaks a cross-field rule.
    #[error("Structured output is inconsistent: {0}")]
    Consistency(String),

    /// Every candidate model failed with transient service errors.
    #[error(
        "Models are temporarily unavailable or overloaded after trying: {}. Please retry in 30-60 seconds.",
        .models.join(", ")
    )]
    ServiceUnavailable {
        /// Models attempted, in order.
        models: Vec<String>,
        /// The last transient failure observed.
        #[source]
        source: Box<DebateError>,
    },

    /// The invocation was cancelled via the cancellation flag.
    #[error("Debate was cancelled")]
    Cancelled,

    /// Invalid configuration or input detected before any remote call.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool no longer accepts work.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

/// How the generation client reacts to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Overload, rate limit or timeout: retry, then fall back to another model.
    TransientService,
    /// Malformed or invalid structured output: retried like a transient error.
    RetryableOutput,
    /// Anything else: abort immediately.
    Fatal,
}

impl ErrorClass {
    /// Whether the generation client may try again.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::Fatal)
    }
}

impl DebateError {
    /// Classify this error for the retry loop.
    pub fn class(&self) -> ErrorClass {
        match self {
            DebateError::EmptyReply | DebateError::Parse(_) | DebateError::Validation(_) => {
                ErrorClass::RetryableOutput
            }
            DebateError::Consistency(_)
            | DebateError::Cancelled
            | DebateError::InvalidConfig(_)
            | DebateError::PoolClosed
            | DebateError::ServiceUnavailable { .. } => ErrorClass::Fatal,
            DebateError::Request(e) if e.is_timeout() || e.is_connect() => {
                ErrorClass::TransientService
            }
            other if has_transient_marker(&other.to_string()) => ErrorClass::TransientService,
            _ => ErrorClass::Fatal,
        }
    }

    /// Shorthand for `class() == ErrorClass::TransientService`.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::TransientService
    }

    /// Build a provider error without an HTTP status.
    pub fn provider(message: impl Into<String>) -> Self {
        DebateError::Provider {
            status: None,
            message: message.into(),
        }
    }
}

/// Case-insensitive search for any of the [`TRANSIENT_MARKERS`].
pub fn has_transient_marker(message: &str) -> bool {
    let upper = message.to_uppercase();
    TRANSIENT_MARKERS.iter().any(|m| upper.contains(m))
}

impl From<anyhow::Error> for DebateError {
    fn from(err: anyhow::Error) -> Self {
        DebateError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DebateError>;
