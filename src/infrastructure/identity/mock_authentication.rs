use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Session;
use crate::domain::account::{
  entities::{Handles, User},
  errors::AuthError,
  ports::{Authentication, UserRepository},
  value_objects::{Email, Password},
};

/// In-memory identity provider for development and tests
///
/// Accounts start verified and active; use `set_verified` and `set_active`
/// to exercise the failure paths.
pub struct MockAuthentication {
  accounts: RwLock<HashMap<String, MockAccount>>,
  reset_codes: RwLock<HashMap<String, String>>,
  session: RwLock<Option<Session>>,
  require_verified_email: bool,
  users: Arc<dyn UserRepository>,
}

struct MockAccount {
  user_id: String,
  password: String,
  verified: bool,
  active: bool,
}

impl MockAuthentication {
  pub fn new(users: Arc<dyn UserRepository>) -> Self {
    Self {
      accounts: RwLock::new(HashMap::new()),
      reset_codes: RwLock::new(HashMap::new()),
      session: RwLock::new(None),
      require_verified_email: false,
      users,
    }
  }

  /// Refuse sign-in for accounts whose email is not verified
  pub fn require_verified_email(mut self, required: bool) -> Self {
    self.require_verified_email = required;
    self
  }

  pub async fn set_verified(&self, email: &Email, verified: bool) -> Result<(), AuthError> {
    self.with_account(email, |account| account.verified = verified).await
  }

  pub async fn set_active(&self, email: &Email, active: bool) -> Result<(), AuthError> {
    self.with_account(email, |account| account.active = active).await
  }

  pub async fn current_session(&self) -> Option<Session> {
    self.session.read().await.clone()
  }

  /// The code a reset email would carry, once `reset_password` was requested
  pub async fn pending_reset_code(&self, email: &Email) -> Option<String> {
    self
      .reset_codes
      .read()
      .await
      .iter()
      .find(|(_, owner)| owner.as_str() == email.as_str())
      .map(|(code, _)| code.clone())
  }

  /// Sets a new password using a code issued by `reset_password`; codes are single-use
  pub async fn confirm_password_reset(
    &self,
    oob_code: &str,
    new_password: &Password,
  ) -> Result<(), AuthError> {
    let email = self
      .reset_codes
      .write()
      .await
      .remove(oob_code)
      .ok_or(AuthError::PasswordResetLinkInvalid)?;

    let mut accounts = self.accounts.write().await;
    let account = accounts
      .get_mut(&email)
      .ok_or(AuthError::PasswordResetLinkInvalid)?;
    account.password = new_password.expose().to_string();
    Ok(())
  }

  async fn with_account(
    &self,
    email: &Email,
    change: impl FnOnce(&mut MockAccount),
  ) -> Result<(), AuthError> {
    let mut accounts = self.accounts.write().await;
    let account = accounts
      .get_mut(email.as_str())
      .ok_or_else(|| AuthError::UserNotFound {
        email: email.to_string(),
      })?;
    change(account);
    Ok(())
  }

  async fn start_session(&self, user_id: &str, email: &Email) {
    *self.session.write().await = Some(Session {
      user_id: user_id.to_string(),
      email: email.to_string(),
      id_token: format!("mock-id-token-{}", Uuid::new_v4()),
      refresh_token: None,
    });
  }
}

#[async_trait]
impl Authentication for MockAuthentication {
  async fn sign_in(&self, email: &Email, password: &Password) -> Result<User, AuthError> {
    let user_id = {
      let accounts = self.accounts.read().await;
      let account = accounts
        .get(email.as_str())
        .ok_or_else(|| AuthError::UserNotFound {
          email: email.to_string(),
        })?;

      if account.password != password.expose() {
        return Err(AuthError::InvalidCredentials);
      }
      if !account.active {
        return Err(AuthError::UserNotActive {
          email: email.to_string(),
        });
      }
      if self.require_verified_email && !account.verified {
        return Err(AuthError::UserNotVerified {
          email: email.to_string(),
        });
      }
      account.user_id.clone()
    };

    let user = self.users.get_user(&user_id).await?;
    self.start_session(&user_id, email).await;
    Ok(user)
  }

  async fn sign_up(
    &self,
    email: &Email,
    password: &Password,
    handles: Handles,
  ) -> Result<User, AuthError> {
    let mut accounts = self.accounts.write().await;
    if accounts.contains_key(email.as_str()) {
      return Err(AuthError::UserAlreadyHasAccount {
        email: email.to_string(),
      });
    }

    let user_id = Uuid::new_v4().to_string();
    let user =
      User::new(user_id.as_str(), email.local_part(), email.as_str()).with_handles(handles);
    self.users.create_user(&user).await?;

    accounts.insert(
      email.to_string(),
      MockAccount {
        user_id: user_id.clone(),
        password: password.expose().to_string(),
        verified: true,
        active: true,
      },
    );
    drop(accounts);

    self.start_session(&user_id, email).await;
    Ok(user)
  }

  async fn sign_out(&self) -> Result<(), AuthError> {
    self
      .session
      .write()
      .await
      .take()
      .map(|_| ())
      .ok_or(AuthError::UserNotSignedIn)
  }

  async fn reset_password(&self, email: &Email) -> Result<(), AuthError> {
    if !self.accounts.read().await.contains_key(email.as_str()) {
      return Err(AuthError::UserNotFound {
        email: email.to_string(),
      });
    }

    let code = format!("mock-oob-{}", Uuid::new_v4());
    self.reset_codes.write().await.insert(code, email.to_string());
    Ok(())
  }
}
