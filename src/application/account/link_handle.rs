use std::sync::Arc;

use crate::domain::account::entities::{Handles, UserField};
use crate::domain::account::errors::UserStoreError;
use crate::domain::account::ports::UserRepository;

/// Command for linking or unlinking a platform handle
#[derive(Debug, Clone)]
pub struct LinkHandleCommand {
  pub user_id: String,
  /// Platform name, e.g. `codeforces`
  pub platform: String,
  /// New handle; `None` unlinks the platform
  pub handle: Option<String>,
}

/// Use case for maintaining a user's platform handles
pub struct LinkHandleUseCase {
  users: Arc<dyn UserRepository>,
}

impl LinkHandleUseCase {
  pub fn new(users: Arc<dyn UserRepository>) -> Self {
    Self { users }
  }

  /// Applies the change and persists the `handles` field
  ///
  /// Returns the user's handles after the change.
  pub async fn execute(&self, command: LinkHandleCommand) -> Result<Handles, UserStoreError> {
    let platform = command.platform.trim();
    if platform.is_empty() {
      return Err(UserStoreError::InvalidUserInput("platform".to_string()));
    }

    let mut user = self.users.get_user(&command.user_id).await?;
    match command.handle {
      Some(handle) => user.add_handle(platform, handle),
      None => {
        if user.remove_handle(platform).is_none() {
          return Ok(user.handles().clone());
        }
      }
    }

    self
      .users
      .edit_user_field(
        &command.user_id,
        UserField::Handles.as_str(),
        user.field_value(UserField::Handles),
      )
      .await?;

    tracing::info!(user_id = %command.user_id, platform, "Handles updated");
    Ok(user.handles().clone())
  }
}
