/// Error types for the data plane
///
/// Every component-boundary error maps to one of the fixed kinds so recovery
/// policy (backoff, fallback chain, skip, absorb) can be decided uniformly.
/// Upstream `not_found` is never an error at the client layer; clients return
/// `Ok(None)` and read services translate absence to their own `NotFound`.
use std::time::Duration;

// =============================================================================
// ERROR KIND
// =============================================================================

/// Fixed classification used by recovery policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RateLimited,
    UpstreamUnavailable,
    NotFound,
    BadResponse,
    Conflict,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadResponse => "bad_response",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// API CLIENT ERRORS
// =============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Upstream signalled a rate limit (HTTP 429); recovery hint when provided
    #[error("rate limited by {feed}")]
    RateLimited {
        feed: &'static str,
        retry_after: Option<Duration>,
    },

    /// Transport failure, timeout, or HTTP 5xx
    #[error("{feed} unavailable: {message}")]
    Unavailable { feed: &'static str, message: String },

    /// Response arrived but could not be decoded into the expected shape
    #[error("{feed} bad response: {message}")]
    BadResponse { feed: &'static str, message: String },

    /// Authentication failure (bad or missing API key)
    #[error("{feed} auth error: {message}")]
    Auth { feed: &'static str, message: String },

    /// Client constructed without credentials or explicitly disabled
    #[error("{feed} client disabled")]
    Disabled { feed: &'static str },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Unavailable { .. } | ApiError::Disabled { .. } => {
                ErrorKind::UpstreamUnavailable
            }
            ApiError::BadResponse { .. } => ErrorKind::BadResponse,
            ApiError::Auth { .. } => ErrorKind::Internal,
        }
    }

    /// Whether a retry with backoff may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. } | ApiError::Unavailable { .. }
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// APPLICATION ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        // Keep database conflicts classified even through anyhow context
        match e.downcast::<rusqlite::Error>() {
            Ok(db) => AppError::Database(db),
            Err(other) => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Api(e) => e.kind(),
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Database(e) => classify_db_error(e),
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Cancelled => ErrorKind::Cancelled,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Unique-constraint violations are conflicts; everything else is internal
fn classify_db_error(e: &rusqlite::Error) -> ErrorKind {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ErrorKind::Conflict
        }
        _ => ErrorKind::Internal,
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_kinds_classify_for_recovery() {
        let e = ApiError::RateLimited {
            feed: "metadata",
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(e.kind(), ErrorKind::RateLimited);
        assert!(e.is_retriable());

        let e = ApiError::BadResponse {
            feed: "dashboard",
            message: "missing field".into(),
        };
        assert_eq!(e.kind(), ErrorKind::BadResponse);
        assert!(!e.is_retriable());
    }

    #[test]
    fn not_found_is_a_service_level_concept() {
        let e = AppError::NotFound("token abc".into());
        assert_eq!(e.kind(), ErrorKind::NotFound);
    }
}
