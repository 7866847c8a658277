use thiserror::Error;

/// Failure classes for calls against the Belay API.
///
/// Polling swallows `Network` and `Server` and retries on the next tick;
/// `Unauthorized` terminates the session and is never retried;
/// `Validation` carries the server's message body for the status bar.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("server error (status {0})")]
    Server(u16),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Map an HTTP status to the error class, `None` for success.
/// 4xx bodies carry a `message` field; its text becomes the error.
pub fn classify_status(status: u16, message: Option<String>) -> Option<ApiError> {
    match status {
        200..=299 => None,
        401 => Some(ApiError::Unauthorized),
        400..=499 => Some(ApiError::Validation(
            message.unwrap_or_else(|| format!("request failed (status {})", status)),
        )),
        _ => Some(ApiError::Server(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert!(classify_status(200, None).is_none());
        assert!(classify_status(201, None).is_none());
    }

    #[test]
    fn test_unauthorized_ignores_body() {
        let err = classify_status(401, Some("Invalid session token".into())).unwrap();
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_validation_carries_server_message() {
        let err = classify_status(400, Some("Channel name already exists".into())).unwrap();
        assert_eq!(err.to_string(), "Channel name already exists");
    }

    #[test]
    fn test_validation_without_body() {
        let err = classify_status(404, None).unwrap();
        assert_eq!(err.to_string(), "request failed (status 404)");
    }

    #[test]
    fn test_server_failures() {
        let err = classify_status(500, Some("ignored".into())).unwrap();
        assert_eq!(err.to_string(), "server error (status 500)");
        assert!(!err.is_auth_failure());
    }
}
