use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::value_objects::ValueObjectError;

// ============================================================================
// Authentication errors
// ============================================================================

/// Closed set of authentication failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
  InvalidCredentials,
  UserNotFound,
  UserNotActive,
  UserNotVerified,
  UserNotSignedIn,
  PasswordResetLinkExpired,
  PasswordResetLinkInvalid,
  UserAlreadyHasAccount,
}

impl AuthErrorKind {
  pub const ALL: [AuthErrorKind; 8] = [
    AuthErrorKind::InvalidCredentials,
    AuthErrorKind::UserNotFound,
    AuthErrorKind::UserNotActive,
    AuthErrorKind::UserNotVerified,
    AuthErrorKind::UserNotSignedIn,
    AuthErrorKind::PasswordResetLinkExpired,
    AuthErrorKind::PasswordResetLinkInvalid,
    AuthErrorKind::UserAlreadyHasAccount,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      AuthErrorKind::InvalidCredentials => "InvalidCredentialsError",
      AuthErrorKind::UserNotFound => "UserNotFoundError",
      AuthErrorKind::UserNotActive => "UserNotActiveError",
      AuthErrorKind::UserNotVerified => "UserNotVerifiedError",
      AuthErrorKind::UserNotSignedIn => "UserNotSignedInError",
      AuthErrorKind::PasswordResetLinkExpired => "PasswordResetLinkExpiredError",
      AuthErrorKind::PasswordResetLinkInvalid => "PasswordResetLinkInvalidError",
      AuthErrorKind::UserAlreadyHasAccount => "UserAlreadyHasAccount",
    }
  }
}

impl fmt::Display for AuthErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AuthErrorKind {
  type Err = UnknownErrorKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    AuthErrorKind::ALL
      .into_iter()
      .find(|kind| kind.as_str() == s)
      .ok_or_else(|| UnknownErrorKind(s.to_string()))
  }
}

/// Main authentication error type
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("Invalid credentials")]
  InvalidCredentials,

  #[error("User with email {email} not found")]
  UserNotFound { email: String },

  #[error("User with email {email} is not active")]
  UserNotActive { email: String },

  #[error("User with email {email} is not verified")]
  UserNotVerified { email: String },

  #[error("User is not signed in")]
  UserNotSignedIn,

  #[error("Password reset link has expired")]
  PasswordResetLinkExpired,

  #[error("Password reset link is invalid")]
  PasswordResetLinkInvalid,

  #[error("User with email {email} already has an account")]
  UserAlreadyHasAccount { email: String },

  /// The identity provider failed in a way none of the kinds above describe
  #[error("Identity provider error: {0}")]
  Provider(String),

  #[error("Repository error: {0}")]
  Repository(#[from] UserStoreError),

  #[error("Value object error: {0}")]
  ValueObject(#[from] ValueObjectError),
}

impl AuthError {
  /// Builds the error for `kind`.
  ///
  /// `message` fills the kind's only parameter (the email address); kinds
  /// with a fixed message ignore it.
  pub fn create(kind: AuthErrorKind, message: impl Into<String>) -> Self {
    let message = message.into();
    match kind {
      AuthErrorKind::InvalidCredentials => AuthError::InvalidCredentials,
      AuthErrorKind::UserNotFound => AuthError::UserNotFound { email: message },
      AuthErrorKind::UserNotActive => AuthError::UserNotActive { email: message },
      AuthErrorKind::UserNotVerified => AuthError::UserNotVerified { email: message },
      AuthErrorKind::UserNotSignedIn => AuthError::UserNotSignedIn,
      AuthErrorKind::PasswordResetLinkExpired => AuthError::PasswordResetLinkExpired,
      AuthErrorKind::PasswordResetLinkInvalid => AuthError::PasswordResetLinkInvalid,
      AuthErrorKind::UserAlreadyHasAccount => AuthError::UserAlreadyHasAccount { email: message },
    }
  }

  /// Returns the kind, or `None` for provider, repository and input failures
  pub fn kind(&self) -> Option<AuthErrorKind> {
    match self {
      AuthError::InvalidCredentials => Some(AuthErrorKind::InvalidCredentials),
      AuthError::UserNotFound { .. } => Some(AuthErrorKind::UserNotFound),
      AuthError::UserNotActive { .. } => Some(AuthErrorKind::UserNotActive),
      AuthError::UserNotVerified { .. } => Some(AuthErrorKind::UserNotVerified),
      AuthError::UserNotSignedIn => Some(AuthErrorKind::UserNotSignedIn),
      AuthError::PasswordResetLinkExpired => Some(AuthErrorKind::PasswordResetLinkExpired),
      AuthError::PasswordResetLinkInvalid => Some(AuthErrorKind::PasswordResetLinkInvalid),
      AuthError::UserAlreadyHasAccount { .. } => Some(AuthErrorKind::UserAlreadyHasAccount),
      AuthError::Provider(_) | AuthError::Repository(_) | AuthError::ValueObject(_) => None,
    }
  }
}

// ============================================================================
// User record (data access) errors
// ============================================================================

/// Closed set of data-access failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserStoreErrorKind {
  UserNotFound,
  UserAlreadyExists,
  InvalidUserInput,
  Firestore,
  UserIdModification,
  Other,
}

impl UserStoreErrorKind {
  pub const ALL: [UserStoreErrorKind; 6] = [
    UserStoreErrorKind::UserNotFound,
    UserStoreErrorKind::UserAlreadyExists,
    UserStoreErrorKind::InvalidUserInput,
    UserStoreErrorKind::Firestore,
    UserStoreErrorKind::UserIdModification,
    UserStoreErrorKind::Other,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      UserStoreErrorKind::UserNotFound => "UserNotFoundError",
      UserStoreErrorKind::UserAlreadyExists => "UserAlreadyExistsError",
      UserStoreErrorKind::InvalidUserInput => "InvalidUserInputError",
      UserStoreErrorKind::Firestore => "FirestoreError",
      UserStoreErrorKind::UserIdModification => "UserIdModificationError",
      UserStoreErrorKind::Other => "Exception",
    }
  }
}

impl fmt::Display for UserStoreErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for UserStoreErrorKind {
  type Err = UnknownErrorKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    UserStoreErrorKind::ALL
      .into_iter()
      .find(|kind| kind.as_str() == s)
      .ok_or_else(|| UnknownErrorKind(s.to_string()))
  }
}

/// Errors surfaced by the user record service
///
/// Every failure of a data-access operation is exactly one of these; raw
/// store errors only ever appear as the `source` of `Firestore`.
#[derive(Debug, Error)]
pub enum UserStoreError {
  #[error("User with ID {user_id} not found.")]
  UserNotFound { user_id: String },

  #[error("User with ID {user_id} already exists.")]
  UserAlreadyExists { user_id: String },

  #[error("Invalid user input: {0}")]
  InvalidUserInput(String),

  #[error("{message}")]
  Firestore {
    message: String,
    #[source]
    source: Option<StoreFailureCause>,
  },

  #[error("The user_id attribute cannot be modified.")]
  UserIdModification,

  #[error("{0}")]
  Other(String),
}

impl UserStoreError {
  /// Builds the error for `kind`.
  ///
  /// `message` fills the kind's only parameter (user id, field name or
  /// message); `UserIdModification` has a fixed message and ignores it.
  pub fn create(kind: UserStoreErrorKind, message: impl Into<String>) -> Self {
    let message = message.into();
    match kind {
      UserStoreErrorKind::UserNotFound => UserStoreError::UserNotFound { user_id: message },
      UserStoreErrorKind::UserAlreadyExists => {
        UserStoreError::UserAlreadyExists { user_id: message }
      }
      UserStoreErrorKind::InvalidUserInput => UserStoreError::InvalidUserInput(message),
      UserStoreErrorKind::Firestore => UserStoreError::Firestore {
        message,
        source: None,
      },
      UserStoreErrorKind::UserIdModification => UserStoreError::UserIdModification,
      UserStoreErrorKind::Other => UserStoreError::Other(message),
    }
  }

  /// Wraps an underlying fault as a store failure
  pub fn firestore(message: impl Into<String>, cause: impl Into<StoreFailureCause>) -> Self {
    UserStoreError::Firestore {
      message: message.into(),
      source: Some(cause.into()),
    }
  }

  pub fn kind(&self) -> UserStoreErrorKind {
    match self {
      UserStoreError::UserNotFound { .. } => UserStoreErrorKind::UserNotFound,
      UserStoreError::UserAlreadyExists { .. } => UserStoreErrorKind::UserAlreadyExists,
      UserStoreError::InvalidUserInput(_) => UserStoreErrorKind::InvalidUserInput,
      UserStoreError::Firestore { .. } => UserStoreErrorKind::Firestore,
      UserStoreError::UserIdModification => UserStoreErrorKind::UserIdModification,
      UserStoreError::Other(_) => UserStoreErrorKind::Other,
    }
  }
}

/// Underlying fault behind a `UserStoreError::Firestore`
#[derive(Debug, Error)]
pub enum StoreFailureCause {
  #[error(transparent)]
  Store(#[from] DocumentStoreError),

  #[error(transparent)]
  Validation(#[from] ValidationError),
}

/// An error kind name outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown error kind: {0}")]
pub struct UnknownErrorKind(pub String);

// ============================================================================
// Document store and record decoding errors
// ============================================================================

/// Transport-level failures reported by document store adapters
#[derive(Debug, Error)]
pub enum DocumentStoreError {
  #[error("Document store connection failed: {0}")]
  ConnectionFailed(String),

  #[error("Document store request failed with status {status}: {message}")]
  RequestFailed { status: u16, message: String },

  #[error("Document not found: {0}")]
  NotFound(String),

  #[error("Invalid document id: {0:?}")]
  InvalidDocumentId(String),

  #[error("Failed to decode document: {0}")]
  Decode(String),

  #[error("Failed to encode document: {0}")]
  Encode(String),
}

/// Record decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("Missing required field: {field}")]
  MissingField { field: String },

  #[error("Invalid field {field}: {reason}")]
  InvalidField { field: String, reason: String },
}

// Automatic conversions from external error types

impl From<reqwest::Error> for DocumentStoreError {
  fn from(error: reqwest::Error) -> Self {
    if error.is_connect() || error.is_timeout() {
      DocumentStoreError::ConnectionFailed(error.to_string())
    } else if error.is_decode() {
      DocumentStoreError::Decode(error.to_string())
    } else {
      DocumentStoreError::RequestFailed {
        status: error.status().map(|s| s.as_u16()).unwrap_or_default(),
        message: error.to_string(),
      }
    }
  }
}

impl From<reqwest::Error> for AuthError {
  fn from(error: reqwest::Error) -> Self {
    AuthError::Provider(error.to_string())
  }
}
