use thiserror::Error;

/// Coarse classification of everything that can go wrong talking to the service.
///
/// The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// No connectivity, DNS failure or timeout
  #[error("Network error: Please check your internet connection")]
  Network,
  /// HTTP 401; the session has already been cleared when this is returned
  #[error("Unauthorized access. Please login again.")]
  Unauthorized,
  /// HTTP 403
  #[error("Access forbidden. Please check your credentials.")]
  Forbidden,
  /// Any other non-2xx response, or a 2xx envelope flagged as an error
  #[error("API error: {0}")]
  Api(String),
  /// 2xx response without a body
  #[error("Empty response body")]
  EmptyBody,
  /// Malformed response or a local failure (e.g. unreadable photo)
  #[error("Unexpected error: {0}")]
  Unexpected(String),
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_connect() || e.is_timeout() || e.is_request() {
      ApiError::Network
    } else if e.is_decode() {
      ApiError::Unexpected(format!("Failed to parse response: {}", e))
    } else {
      ApiError::Unexpected(e.to_string())
    }
  }
}
