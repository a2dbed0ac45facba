use async_trait::async_trait;
use serde_json::Value;

use super::entities::{Handles, User};
use super::errors::{AuthError, DocumentStoreError, UserStoreError};
use super::value_objects::{Email, Password};

/// A flat field-value record as held by the document store
pub type Document = serde_json::Map<String, Value>;

/// Remote document database addressed by collection and document id
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Fetches a document; `None` when it does not exist
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentStoreError>;

  /// Creates the document or overwrites it entirely
  async fn set(&self, collection: &str, id: &str, data: Document)
  -> Result<(), DocumentStoreError>;

  /// Merges the given top-level fields into an existing document
  async fn update(
    &self,
    collection: &str,
    id: &str,
    fields: Document,
  ) -> Result<(), DocumentStoreError>;

  /// Deletes the document; deleting an absent document is not an error
  async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentStoreError>;
}

/// User record persistence operations
#[async_trait]
pub trait UserRepository: Send + Sync {
  /// Stores a new user record
  async fn create_user(&self, user: &User) -> Result<(), UserStoreError>;

  /// Deletes the record of the user with the given id
  async fn remove_user(&self, user_id: &str) -> Result<(), UserStoreError>;

  /// Replaces the value of a field that already exists on the record
  async fn edit_user_field(
    &self,
    user_id: &str,
    field_name: &str,
    value: Value,
  ) -> Result<(), UserStoreError>;

  /// Loads the full user record
  async fn get_user(&self, user_id: &str) -> Result<User, UserStoreError>;

  /// Loads a single field of the user record
  async fn get_user_field(&self, user_id: &str, field_name: &str) -> Result<Value, UserStoreError>;
}

/// Credential-based sessions against an external identity provider
#[async_trait]
pub trait Authentication: Send + Sync {
  /// Signs in with email and password and returns the user's record
  async fn sign_in(&self, email: &Email, password: &Password) -> Result<User, AuthError>;

  /// Registers a new account, stores its record and returns it
  async fn sign_up(
    &self,
    email: &Email,
    password: &Password,
    handles: Handles,
  ) -> Result<User, AuthError>;

  /// Ends the current session
  async fn sign_out(&self) -> Result<(), AuthError>;

  /// Sends a password reset email
  async fn reset_password(&self, email: &Email) -> Result<(), AuthError>;
}
