use thiserror::Error;

/// User-facing message attached to [`PlannerError::ServiceOverloaded`].
pub const OVERLOADED_MESSAGE: &str = "The model is overloaded. Please try again later.";

/// Main error type for the planning pipeline
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider failure that does not match the overload signature.
    /// The provider's own message is carried verbatim.
    #[error("{0}")]
    Upstream(String),

    #[error("{}", OVERLOADED_MESSAGE)]
    ServiceOverloaded,

    #[error("Model did not return valid JSON: {0}")]
    MalformedResponse(String),

    /// Rejected at the boundary before any planning happens.
    #[error("{0}")]
    InvalidRequest(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Whether a caller may reasonably try the same request again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlannerError::ServiceOverloaded)
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Configuration(_) => "CONFIGURATION_ERROR",
            PlannerError::Upstream(_) => "UPSTREAM_ERROR",
            PlannerError::ServiceOverloaded => "SERVICE_OVERLOADED",
            PlannerError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            PlannerError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// HTTP status the boundary should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            PlannerError::ServiceOverloaded => 503,
            PlannerError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}
