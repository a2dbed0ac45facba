pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{Handles, User, UserField};
pub use errors::{
  AuthError, AuthErrorKind, DocumentStoreError, UnknownErrorKind, UserStoreError,
  UserStoreErrorKind, ValidationError,
};
pub use ports::{Authentication, Document, DocumentStore, UserRepository};
pub use services::{FirestoreUserService, USERS_COLLECTION};
pub use value_objects::{Email, Password, ValueObjectError};
