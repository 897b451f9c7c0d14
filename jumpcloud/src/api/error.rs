use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to encode request body: {0}")]
    EncodeError(String),

    #[error("Authentication failed: unauthorized")]
    AuthError,

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse error categories that drive resource behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Timeout,
    RateLimited,
    Other,
}

impl ErrorClass {
    /// Category for an HTTP status, None for statuses with no category
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            404 => Some(ErrorClass::NotFound),
            409 => Some(ErrorClass::Conflict),
            401 => Some(ErrorClass::Unauthorized),
            403 => Some(ErrorClass::Forbidden),
            408 | 504 => Some(ErrorClass::Timeout),
            429 => Some(ErrorClass::RateLimited),
            _ => None,
        }
    }

    /// Case-insensitive phrase matching for errors that carry no status
    pub fn from_message(message: &str) -> Self {
        const PATTERNS: &[(&[&str], ErrorClass)] = &[
            (&["not found", "does not exist"], ErrorClass::NotFound),
            (&["already exists", "conflict", "duplicate"], ErrorClass::Conflict),
            (&["unauthorized", "unauthenticated"], ErrorClass::Unauthorized),
            (&["forbidden", "permission denied"], ErrorClass::Forbidden),
            (&["timeout", "timed out"], ErrorClass::Timeout),
            (&["rate limit", "too many requests"], ErrorClass::RateLimited),
        ];

        let message = message.to_lowercase();
        PATTERNS
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| message.contains(n)))
            .map(|(_, class)| *class)
            .unwrap_or(ErrorClass::Other)
    }
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiError { status, .. } => Some(*status),
            ApiError::RequestError(e) => e.status().map(|s| s.as_u16()),
            ApiError::AuthError => Some(401),
            ApiError::RateLimited => Some(429),
            _ => None,
        }
    }

    /// The status decides when it maps to a category, otherwise the text does
    pub fn class(&self) -> ErrorClass {
        if let Some(class) = self.status().and_then(ErrorClass::from_status) {
            return class;
        }
        match self {
            ApiError::Timeout(_) => ErrorClass::Timeout,
            ApiError::RequestError(e) if e.is_timeout() => ErrorClass::Timeout,
            ApiError::ApiError { message, .. } => ErrorClass::from_message(message),
            other => ErrorClass::from_message(&other.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.class() == ErrorClass::Conflict
    }

    pub fn is_unauthorized(&self) -> bool {
        self.class() == ErrorClass::Unauthorized
    }

    pub fn is_forbidden(&self) -> bool {
        self.class() == ErrorClass::Forbidden
    }

    pub fn is_timeout(&self) -> bool {
        self.class() == ErrorClass::Timeout
    }

    pub fn is_rate_limited(&self) -> bool {
        self.class() == ErrorClass::RateLimited
    }
}
