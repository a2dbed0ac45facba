use std::sync::Arc;

use crate::domain::account::entities::Handles;
use crate::domain::account::errors::AuthError;
use crate::domain::account::ports::Authentication;
use crate::domain::account::value_objects::{Email, Password};

/// Command for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterAccountCommand {
  /// User's email address
  pub email: String,
  /// User's password (plain text, handed to the identity provider)
  pub password: String,
  /// Competitive programming handles keyed by platform
  pub handles: Handles,
}

/// Response after successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAccountResponse {
  /// Identifier assigned by the identity provider
  pub user_id: String,
  /// Display name, initially the email's local part
  pub name: String,
  /// Normalized email address
  pub email: String,
}

/// Use case for registering a new account
pub struct RegisterAccountUseCase {
  authentication: Arc<dyn Authentication>,
}

impl RegisterAccountUseCase {
  pub fn new(authentication: Arc<dyn Authentication>) -> Self {
    Self { authentication }
  }

  /// Executes the registration use case
  ///
  /// # Errors
  /// Returns `AuthError::ValueObject` for a malformed email or password, and
  /// whatever the provider reports otherwise (e.g. `UserAlreadyHasAccount`)
  pub async fn execute(
    &self,
    command: RegisterAccountCommand,
  ) -> Result<RegisterAccountResponse, AuthError> {
    let email = Email::new(command.email)?;
    let password = Password::new(command.password)?;

    let user = self
      .authentication
      .sign_up(&email, &password, command.handles)
      .await?;

    Ok(RegisterAccountResponse {
      user_id: user.user_id().to_string(),
      name: user.name().to_string(),
      email: user.email().to_string(),
    })
  }
}
