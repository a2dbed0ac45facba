use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
  #[error("Invalid email format: {0}")]
  InvalidEmail(String),

  #[error("Password is too short (minimum {min} characters)")]
  PasswordTooShort { min: usize },

  #[error("Password is too long (maximum {max} characters)")]
  PasswordTooLong { max: usize },
}

// ============================================================================
// Email Value Object
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
  /// Creates a new Email after validation
  pub fn new(email: impl Into<String>) -> Result<Self, ValueObjectError> {
    let email = email.into();
    let email = email.trim();

    if !email.validate_email() {
      return Err(ValueObjectError::InvalidEmail(email.to_string()));
    }

    Ok(Self(email.to_lowercase()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The part before `@`
  pub fn local_part(&self) -> &str {
    self.0.split('@').next().unwrap_or_default()
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for Email {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Email {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl FromStr for Email {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Email::new(s)
  }
}

impl TryFrom<String> for Email {
  type Error = ValueObjectError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Email::new(value)
  }
}

impl From<Email> for String {
  fn from(email: Email) -> Self {
    email.0
  }
}

// ============================================================================
// Password Value Object (plain text, handed to the identity provider only)
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
  pub const MIN_LENGTH: usize = 8;
  pub const MAX_LENGTH: usize = 128;

  /// Creates a new Password after length validation
  pub fn new(password: impl Into<String>) -> Result<Self, ValueObjectError> {
    let password = password.into();
    let length = password.chars().count();

    if length < Self::MIN_LENGTH {
      return Err(ValueObjectError::PasswordTooShort {
        min: Self::MIN_LENGTH,
      });
    }

    if length > Self::MAX_LENGTH {
      return Err(ValueObjectError::PasswordTooLong {
        max: Self::MAX_LENGTH,
      });
    }

    Ok(Self(password))
  }

  /// Returns the password as a string slice (use with caution)
  pub fn expose(&self) -> &str {
    &self.0
  }
}

// Implement Debug without exposing the password
impl fmt::Debug for Password {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Password(***)")
  }
}

impl fmt::Display for Password {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("***")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_email_is_normalized() {
    let email = Email::new("  Alice@Example.COM ").unwrap();
    assert_eq!(email.as_str(), "alice@example.com");
    assert_eq!(email.local_part(), "alice");
  }

  #[test]
  fn test_email_rejects_garbage() {
    assert!(matches!(
      Email::new("not-an-email"),
      Err(ValueObjectError::InvalidEmail(_))
    ));
  }

  #[test]
  fn test_email_deserializes_through_validation() {
    let email: Email = serde_json::from_str("\"Bob@Example.com\"").unwrap();
    assert_eq!(email.as_str(), "bob@example.com");
    assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
  }

  #[test]
  fn test_password_bounds() {
    assert_eq!(
      Password::new("short"),
      Err(ValueObjectError::PasswordTooShort { min: 8 })
    );
    assert_eq!(
      Password::new("x".repeat(129)),
      Err(ValueObjectError::PasswordTooLong { max: 128 })
    );
    assert!(Password::new("correct horse").is_ok());
  }

  #[test]
  fn test_password_is_redacted() {
    let password = Password::new("hunter2hunter2").unwrap();
    assert_eq!(format!("{:?}", password), "Password(***)");
    assert_eq!(password.to_string(), "***");
    assert_eq!(password.expose(), "hunter2hunter2");
  }
}
