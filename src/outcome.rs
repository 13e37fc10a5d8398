use crate::api::ApiError;

/// State of the last attempted operation, as seen by presentation code.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
  /// Operation started, no answer yet
  Loading,
  Success(T),
  /// Human-readable failure description
  Error(String),
}

impl<T> Outcome<T> {
  pub fn error(message: impl Into<String>) -> Self {
    Outcome::Error(message.into())
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Outcome::Success(_))
  }

  /// The payload, if the operation succeeded
  pub fn data(&self) -> Option<&T> {
    match self {
      Outcome::Success(data) => Some(data),
      _ => None,
    }
  }
}

impl<T> From<Result<T, ApiError>> for Outcome<T> {
  fn from(result: Result<T, ApiError>) -> Self {
    match result {
      Ok(data) => Outcome::Success(data),
      Err(e) => Outcome::Error(e.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_result() {
    let ok: Outcome<u32> = Ok(3).into();
    assert_eq!(ok, Outcome::Success(3));

    let err: Outcome<u32> = Err(ApiError::Unauthorized).into();
    assert_eq!(
      err,
      Outcome::Error("Unauthorized access. Please login again.".to_string())
    );
  }

  #[test]
  fn test_data() {
    assert_eq!(Outcome::Success("x").data(), Some(&"x"));
    assert_eq!(Outcome::<&str>::Loading.data(), None);
    assert!(!Outcome::<()>::error("e").is_success());
  }
}
