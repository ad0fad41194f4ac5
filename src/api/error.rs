/// Failures of a remote page fetch.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("network error: {0}")]
  Network(String),

  #[error("authentication failed: {0}")]
  Auth(String),

  #[error("server error: {message}")]
  Server {
    status: Option<u16>,
    message: String,
  },

  #[error("unexpected response: {0}")]
  InvalidResponse(#[from] serde_json::Error),

  #[error("invalid API configuration: {0}")]
  Config(String),
}

impl ApiError {
  /// True when the server answered but refused the request.
  pub fn is_server_rejection(&self) -> bool {
    matches!(self, ApiError::Server { .. })
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_builder() {
      ApiError::Config(err.to_string())
    } else {
      ApiError::Network(err.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    let err = ApiError::Network("connection refused".to_string());
    assert_eq!(err.to_string(), "network error: connection refused");

    let err = ApiError::Server {
      status: None,
      message: "Something went wrong".to_string(),
    };
    assert_eq!(err.to_string(), "server error: Something went wrong");

    let err = ApiError::Auth("token expired".to_string());
    assert_eq!(err.to_string(), "authentication failed: token expired");
  }

  #[test]
  fn test_only_server_errors_are_rejections() {
    let server = ApiError::Server {
      status: Some(500),
      message: "boom".to_string(),
    };
    assert!(server.is_server_rejection());
    assert!(!ApiError::Network("down".to_string()).is_server_rejection());
    assert!(!ApiError::Auth("nope".to_string()).is_server_rejection());
  }
}
