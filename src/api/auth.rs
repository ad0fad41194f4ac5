use super::error::ApiError;

/// Supplies the bearer token for API requests.
pub trait TokenProvider: Send + Sync {
  fn bearer_token(&self) -> Result<String, ApiError>;
}

/// Token read from the environment on every request.
///
/// Checks CUSTLIST_API_TOKEN first, then CUSTOMER_API_TOKEN as fallback.
#[derive(Debug, Clone)]
pub struct EnvToken {
  vars: &'static [&'static str],
}

impl EnvToken {
  pub const VARS: &'static [&'static str] = &["CUSTLIST_API_TOKEN", "CUSTOMER_API_TOKEN"];

  pub fn new() -> Self {
    Self { vars: Self::VARS }
  }
}

impl Default for EnvToken {
  fn default() -> Self {
    Self::new()
  }
}

impl TokenProvider for EnvToken {
  fn bearer_token(&self) -> Result<String, ApiError> {
    self
      .vars
      .iter()
      .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
      .ok_or_else(|| {
        ApiError::Auth(format!(
          "API token not found. Set {} environment variable.",
          self.vars.join(" or ")
        ))
      })
  }
}

/// Fixed token, taken from the config file.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }
}

impl TokenProvider for StaticToken {
  fn bearer_token(&self) -> Result<String, ApiError> {
    Ok(self.0.clone())
  }
}

impl std::fmt::Debug for StaticToken {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("StaticToken(***)")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_static_token() {
    let token = StaticToken::new("abc");
    assert_eq!(token.bearer_token().unwrap(), "abc");
    assert_eq!(format!("{token:?}"), "StaticToken(***)");
  }

  #[test]
  fn test_missing_env_token_is_auth_error() {
    let provider = EnvToken {
      vars: &["CUSTLIST_TEST_TOKEN_THAT_IS_NEVER_SET"],
    };
    let err = provider.bearer_token().unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
    assert!(err
      .to_string()
      .contains("CUSTLIST_TEST_TOKEN_THAT_IS_NEVER_SET"));
  }
}
