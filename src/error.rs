//! Error taxonomy for the analytics core

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors that can occur while recording or reporting usage
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Malformed or missing required field; nothing was mutated
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store has not been initialized (or has been closed)
    #[error("Store is not ready, retry shortly")]
    NotReady,

    /// Durable write failed; in-memory state may be ahead of disk
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Counters disagree with the event log
    #[error("Store inconsistency: {0}")]
    StoreInconsistency(String),

    /// A counter is saturated and cannot be incremented
    #[error("Counter overflow: {0}")]
    CounterOverflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AnalyticsError::InvalidInput(message.into())
    }

    /// Whether the caller may retry the same call unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalyticsError::NotReady | AnalyticsError::Persistence(_))
    }

    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            AnalyticsError::InvalidInput(_) => "BAD_REQUEST",
            AnalyticsError::NotReady => "NOT_READY",
            AnalyticsError::Persistence(_) => "PERSISTENCE_FAILURE",
            AnalyticsError::StoreInconsistency(_) => "STORE_INCONSISTENCY",
            AnalyticsError::CounterOverflow(_) => "COUNTER_OVERFLOW",
            AnalyticsError::Io(_) | AnalyticsError::Json(_) => "INTERNAL_ERROR",
        }
    }
}
