use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::entities::{User, UserField};
use super::errors::UserStoreError;
use super::ports::{Document, DocumentStore, UserRepository};

/// Collection holding one document per user, keyed by user id
pub const USERS_COLLECTION: &str = "users";

/// User record service over a document store
///
/// Each operation reads the current document, checks its precondition and
/// performs at most one mutation. Store faults are reported as
/// `UserStoreError::Firestore`, so callers only ever see the error taxonomy.
pub struct FirestoreUserService {
  store: Arc<dyn DocumentStore>,
  collection: String,
}

impl FirestoreUserService {
  /// Creates a service over the `users` collection
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self::with_collection(store, USERS_COLLECTION)
  }

  /// Creates a service over a custom collection
  pub fn with_collection(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
    Self {
      store,
      collection: collection.into(),
    }
  }

  pub fn collection(&self) -> &str {
    &self.collection
  }

  async fn fetch(&self, user_id: &str, context: &str) -> Result<Option<Document>, UserStoreError> {
    self
      .store
      .get(&self.collection, user_id)
      .await
      .map_err(|e| {
        tracing::warn!(user_id, error = %e, "{}", context);
        UserStoreError::firestore(context, e)
      })
  }
}

#[async_trait]
impl UserRepository for FirestoreUserService {
  #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id()))]
  async fn create_user(&self, user: &User) -> Result<(), UserStoreError> {
    const CONTEXT: &str = "Error creating user.";

    if self.fetch(user.user_id(), CONTEXT).await?.is_some() {
      tracing::debug!("User already exists");
      return Err(UserStoreError::UserAlreadyExists {
        user_id: user.user_id().to_string(),
      });
    }

    self
      .store
      .set(&self.collection, user.user_id(), user.to_dict())
      .await
      .map_err(|e| UserStoreError::firestore(CONTEXT, e))?;

    tracing::info!("User record created");
    Ok(())
  }

  #[tracing::instrument(skip(self))]
  async fn remove_user(&self, user_id: &str) -> Result<(), UserStoreError> {
    const CONTEXT: &str = "Error removing user.";

    if self.fetch(user_id, CONTEXT).await?.is_none() {
      return Err(UserStoreError::UserNotFound {
        user_id: user_id.to_string(),
      });
    }

    self
      .store
      .delete(&self.collection, user_id)
      .await
      .map_err(|e| UserStoreError::firestore(CONTEXT, e))?;

    tracing::info!("User record removed");
    Ok(())
  }

  #[tracing::instrument(skip(self, value))]
  async fn edit_user_field(
    &self,
    user_id: &str,
    field_name: &str,
    value: Value,
  ) -> Result<(), UserStoreError> {
    const CONTEXT: &str = "Error editing user field.";

    // Rejected before anything is read, whether or not the user exists.
    if field_name == UserField::UserId.as_str() {
      return Err(UserStoreError::UserIdModification);
    }

    let current = self
      .fetch(user_id, CONTEXT)
      .await?
      .ok_or_else(|| UserStoreError::UserNotFound {
        user_id: user_id.to_string(),
      })?;

    if !current.contains_key(field_name) {
      return Err(UserStoreError::InvalidUserInput(field_name.to_string()));
    }

    if let Ok(field) = field_name.parse::<UserField>() {
      field.validate(&value).map_err(|e| {
        tracing::debug!(error = %e, "Rejected field value");
        UserStoreError::InvalidUserInput(field_name.to_string())
      })?;
    }

    let mut fields = Document::new();
    fields.insert(field_name.to_string(), value);

    self
      .store
      .update(&self.collection, user_id, fields)
      .await
      .map_err(|e| UserStoreError::firestore(CONTEXT, e))?;

    tracing::debug!("User field updated");
    Ok(())
  }

  #[tracing::instrument(skip(self))]
  async fn get_user(&self, user_id: &str) -> Result<User, UserStoreError> {
    const CONTEXT: &str = "Error getting user.";

    let data = self
      .fetch(user_id, CONTEXT)
      .await?
      .ok_or_else(|| UserStoreError::UserNotFound {
        user_id: user_id.to_string(),
      })?;

    User::from_dict(&data).map_err(|e| {
      tracing::warn!(error = %e, "Stored user record is malformed");
      UserStoreError::firestore(CONTEXT, e)
    })
  }

  #[tracing::instrument(skip(self))]
  async fn get_user_field(&self, user_id: &str, field_name: &str) -> Result<Value, UserStoreError> {
    const CONTEXT: &str = "Error getting user field.";

    match self.fetch(user_id, CONTEXT).await? {
      Some(mut data) => data
        .remove(field_name)
        .ok_or_else(|| UserStoreError::InvalidUserInput(field_name.to_string())),
      None => Err(UserStoreError::UserNotFound {
        user_id: user_id.to_string(),
      }),
    }
  }
}
