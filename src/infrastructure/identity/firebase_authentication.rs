use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::Session;
use crate::domain::account::{
  entities::{Handles, User},
  errors::AuthError,
  ports::{Authentication, UserRepository},
  value_objects::{Email, Password},
};
use crate::infrastructure::config::IdentityConfig;

/// Email/password sign-in against the Identity Toolkit REST API
///
/// Account records live in the injected `UserRepository`, keyed by the
/// provider's `localId`. The adapter holds at most one signed-in session.
pub struct FirebaseAuthentication {
  client: Client,
  base_url: String,
  api_key: String,
  require_verified_email: bool,
  users: Arc<dyn UserRepository>,
  session: RwLock<Option<Session>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
  email: &'a str,
  password: &'a str,
  return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
  local_id: String,
  email: String,
  id_token: String,
  #[serde(default)]
  refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct LookupResponse {
  #[serde(default)]
  users: Vec<AccountInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
  #[serde(default)]
  email_verified: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
  message: String,
}

#[derive(Deserialize)]
struct Ignored {}

impl FirebaseAuthentication {
  pub fn new(config: &IdentityConfig, users: Arc<dyn UserRepository>) -> Result<Self, AuthError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_seconds))
      .build()?;

    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      api_key: config.api_key.clone(),
      require_verified_email: config.require_verified_email,
      users,
      session: RwLock::new(None),
    })
  }

  /// The currently signed-in session, if any
  pub async fn current_session(&self) -> Option<Session> {
    self.session.read().await.clone()
  }

  /// Completes a password reset with the code from the reset email
  pub async fn confirm_password_reset(
    &self,
    oob_code: &str,
    new_password: &Password,
  ) -> Result<(), AuthError> {
    let _: Ignored = self
      .call(
        "resetPassword",
        &serde_json::json!({ "oobCode": oob_code, "newPassword": new_password.expose() }),
        "",
      )
      .await?;

    tracing::info!("Password reset completed");
    Ok(())
  }

  /// POSTs to `accounts:{method}` and decodes the reply.
  ///
  /// Provider error codes are translated with `email` as the subject.
  async fn call<B, R>(&self, method: &str, body: &B, email: &str) -> Result<R, AuthError>
  where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let url = format!("{}/accounts:{}", self.base_url, method);
    let response = self
      .client
      .post(&url)
      .query(&[("key", self.api_key.as_str())])
      .json(body)
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      let code = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

      tracing::warn!(method, %status, code = %code, "Identity provider rejected request");
      return Err(provider_error(&code, email));
    }

    Ok(response.json().await?)
  }

  async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
    let _: Ignored = self
      .call("delete", &serde_json::json!({ "idToken": id_token }), "")
      .await?;
    Ok(())
  }

  async fn email_verified(&self, id_token: &str) -> Result<bool, AuthError> {
    let lookup: LookupResponse = self
      .call("lookup", &serde_json::json!({ "idToken": id_token }), "")
      .await?;

    Ok(lookup.users.first().is_some_and(|account| account.email_verified))
  }

  async fn start_session(&self, tokens: TokenResponse) {
    *self.session.write().await = Some(Session {
      user_id: tokens.local_id,
      email: tokens.email,
      id_token: tokens.id_token,
      refresh_token: tokens.refresh_token,
    });
  }
}

/// Maps an Identity Toolkit error code onto the error taxonomy.
///
/// Codes may carry a detail suffix, as in `"WEAK_PASSWORD : Password should be..."`.
fn provider_error(message: &str, email: &str) -> AuthError {
  let code = message.split([' ', ':']).next().unwrap_or_default();
  match code {
    "EMAIL_NOT_FOUND" => AuthError::UserNotFound {
      email: email.to_string(),
    },
    "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredentials,
    "USER_DISABLED" => AuthError::UserNotActive {
      email: email.to_string(),
    },
    "EMAIL_EXISTS" => AuthError::UserAlreadyHasAccount {
      email: email.to_string(),
    },
    "EXPIRED_OOB_CODE" => AuthError::PasswordResetLinkExpired,
    "INVALID_OOB_CODE" => AuthError::PasswordResetLinkInvalid,
    _ => AuthError::Provider(message.to_string()),
  }
}

#[async_trait]
impl Authentication for FirebaseAuthentication {
  #[tracing::instrument(skip(self, password), fields(email = %email))]
  async fn sign_in(&self, email: &Email, password: &Password) -> Result<User, AuthError> {
    let request = PasswordRequest {
      email: email.as_str(),
      password: password.expose(),
      return_secure_token: true,
    };
    let tokens: TokenResponse = self
      .call("signInWithPassword", &request, email.as_str())
      .await?;

    if self.require_verified_email && !self.email_verified(&tokens.id_token).await? {
      return Err(AuthError::UserNotVerified {
        email: email.to_string(),
      });
    }

    let user = self.users.get_user(&tokens.local_id).await?;
    self.start_session(tokens).await;

    tracing::info!(user_id = user.user_id(), "User signed in");
    Ok(user)
  }

  #[tracing::instrument(skip(self, password, handles), fields(email = %email))]
  async fn sign_up(
    &self,
    email: &Email,
    password: &Password,
    handles: Handles,
  ) -> Result<User, AuthError> {
    let request = PasswordRequest {
      email: email.as_str(),
      password: password.expose(),
      return_secure_token: true,
    };
    let tokens: TokenResponse = self.call("signUp", &request, email.as_str()).await?;

    let user = User::new(tokens.local_id.as_str(), email.local_part(), email.as_str())
      .with_handles(handles);
    if let Err(e) = self.users.create_user(&user).await {
      // A provider account must not outlive a failed record write.
      if let Err(cleanup) = self.delete_account(&tokens.id_token).await {
        tracing::warn!(
          user_id = user.user_id(),
          error = %cleanup,
          "Failed to delete provider account after record creation failed"
        );
      }
      return Err(e.into());
    }
    self.start_session(tokens).await;

    tracing::info!(user_id = user.user_id(), "Account created");
    Ok(user)
  }

  async fn sign_out(&self) -> Result<(), AuthError> {
    let session = self
      .session
      .write()
      .await
      .take()
      .ok_or(AuthError::UserNotSignedIn)?;

    tracing::info!(user_id = %session.user_id, "User signed out");
    Ok(())
  }

  #[tracing::instrument(skip(self), fields(email = %email))]
  async fn reset_password(&self, email: &Email) -> Result<(), AuthError> {
    let _: Ignored = self
      .call(
        "sendOobCode",
        &serde_json::json!({ "requestType": "PASSWORD_RESET", "email": email.as_str() }),
        email.as_str(),
      )
      .await?;

    tracing::info!("Password reset email sent");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::account::errors::{AuthErrorKind, DocumentStoreError};
  use crate::domain::account::ports::{Document, DocumentStore};
  use crate::domain::account::services::FirestoreUserService;
  use crate::infrastructure::persistence::InMemoryDocumentStore;
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn config(server: &MockServer, require_verified_email: bool) -> IdentityConfig {
    IdentityConfig {
      api_key: "test-key".to_string(),
      base_url: server.uri(),
      require_verified_email,
      timeout_seconds: 5,
    }
  }

  fn setup(
    server: &MockServer,
    require_verified_email: bool,
  ) -> (FirebaseAuthentication, Arc<FirestoreUserService>) {
    setup_with_store(server, require_verified_email, Arc::new(InMemoryDocumentStore::new()))
  }

  fn setup_with_store(
    server: &MockServer,
    require_verified_email: bool,
    store: Arc<dyn DocumentStore>,
  ) -> (FirebaseAuthentication, Arc<FirestoreUserService>) {
    let users = Arc::new(FirestoreUserService::new(store));
    let config = config(server, require_verified_email);
    let auth = FirebaseAuthentication::new(&config, users.clone()).unwrap();
    (auth, users)
  }

  /// Store that reads as empty but refuses every write
  struct ReadOnlyStore;

  #[async_trait]
  impl DocumentStore for ReadOnlyStore {
    async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, DocumentStoreError> {
      Ok(None)
    }

    async fn set(&self, _: &str, _: &str, _: Document) -> Result<(), DocumentStoreError> {
      Err(DocumentStoreError::ConnectionFailed("write refused".to_string()))
    }

    async fn update(&self, _: &str, _: &str, _: Document) -> Result<(), DocumentStoreError> {
      Err(DocumentStoreError::ConnectionFailed("write refused".to_string()))
    }

    async fn delete(&self, _: &str, _: &str) -> Result<(), DocumentStoreError> {
      Err(DocumentStoreError::ConnectionFailed("write refused".to_string()))
    }
  }

  fn email() -> Email {
    Email::new("alice@example.com").unwrap()
  }

  fn password() -> Password {
    Password::new("correct horse").unwrap()
  }

  fn tokens() -> serde_json::Value {
    json!({
      "localId": "uid-1",
      "email": "alice@example.com",
      "idToken": "id-token",
      "refreshToken": "refresh-token",
      "expiresIn": "3600"
    })
  }

  fn provider_failure(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
      "error": {
        "code": 400,
        "message": code,
        "errors": [{ "message": code, "reason": "invalid" }]
      }
    }))
  }

  #[tokio::test]
  async fn test_sign_up_creates_record_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signUp"))
      .and(query_param("key", "test-key"))
      .and(body_partial_json(json!({ "email": "alice@example.com", "returnSecureToken": true })))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .expect(1)
      .mount(&server)
      .await;

    let (auth, users) = setup(&server, false);
    let mut handles = Handles::new();
    handles.insert("codeforces".to_string(), "alice_cf".to_string());

    let user = auth.sign_up(&email(), &password(), handles).await.unwrap();

    assert_eq!(user.user_id(), "uid-1");
    assert_eq!(user.name(), "alice");
    let stored = users.get_user("uid-1").await.unwrap();
    assert_eq!(stored.handle("codeforces"), Some("alice_cf"));
    assert_eq!(auth.current_session().await.unwrap().id_token, "id-token");
  }

  #[tokio::test]
  async fn test_sign_up_deletes_provider_account_when_record_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signUp"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/accounts:delete"))
      .and(query_param("key", "test-key"))
      .and(body_partial_json(json!({ "idToken": "id-token" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "deleted" })))
      .expect(1)
      .mount(&server)
      .await;

    let (auth, _) = setup_with_store(&server, false, Arc::new(ReadOnlyStore));

    let err = auth
      .sign_up(&email(), &password(), Handles::new())
      .await
      .unwrap_err();

    assert!(matches!(err, AuthError::Repository(_)));
    assert_eq!(err.to_string(), "Repository error: Error creating user.");
    assert!(auth.current_session().await.is_none());
  }

  #[tokio::test]
  async fn test_sign_up_keeps_record_error_when_cleanup_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signUp"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/accounts:delete"))
      .respond_with(provider_failure("INVALID_ID_TOKEN"))
      .expect(1)
      .mount(&server)
      .await;

    let (auth, _) = setup_with_store(&server, false, Arc::new(ReadOnlyStore));

    let err = auth
      .sign_up(&email(), &password(), Handles::new())
      .await
      .unwrap_err();

    assert!(matches!(err, AuthError::Repository(_)));
  }

  #[tokio::test]
  async fn test_sign_up_existing_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signUp"))
      .respond_with(provider_failure("EMAIL_EXISTS"))
      .mount(&server)
      .await;

    let (auth, _) = setup(&server, false);

    let err = auth
      .sign_up(&email(), &password(), Handles::new())
      .await
      .unwrap_err();
    assert_eq!(err.kind(), Some(AuthErrorKind::UserAlreadyHasAccount));
    assert!(auth.current_session().await.is_none());
  }

  #[tokio::test]
  async fn test_sign_in_loads_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signInWithPassword"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .mount(&server)
      .await;

    let (auth, users) = setup(&server, false);
    users
      .create_user(&User::new("uid-1", "Alice", "alice@example.com"))
      .await
      .unwrap();

    let user = auth.sign_in(&email(), &password()).await.unwrap();

    assert_eq!(user.name(), "Alice");
    assert_eq!(auth.current_session().await.unwrap().user_id, "uid-1");
  }

  #[tokio::test]
  async fn test_sign_in_maps_provider_codes() {
    let cases = [
      ("EMAIL_NOT_FOUND", Some(AuthErrorKind::UserNotFound)),
      ("INVALID_PASSWORD", Some(AuthErrorKind::InvalidCredentials)),
      ("INVALID_LOGIN_CREDENTIALS", Some(AuthErrorKind::InvalidCredentials)),
      ("USER_DISABLED", Some(AuthErrorKind::UserNotActive)),
      ("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled", None),
    ];

    for (code, expected) in cases {
      let server = MockServer::start().await;
      Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(provider_failure(code))
        .mount(&server)
        .await;

      let (auth, _) = setup(&server, false);
      let err = auth.sign_in(&email(), &password()).await.unwrap_err();

      assert_eq!(err.kind(), expected, "code {}", code);
    }
  }

  #[tokio::test]
  async fn test_sign_in_requires_verified_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signInWithPassword"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/accounts:lookup"))
      .and(body_partial_json(json!({ "idToken": "id-token" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "users": [{ "localId": "uid-1", "email": "alice@example.com", "emailVerified": false }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let (auth, _) = setup(&server, true);

    let err = auth.sign_in(&email(), &password()).await.unwrap_err();
    assert!(matches!(
      err,
      AuthError::UserNotVerified { ref email } if email == "alice@example.com"
    ));
    assert!(auth.current_session().await.is_none());
  }

  #[tokio::test]
  async fn test_sign_in_without_record_is_repository_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signInWithPassword"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .mount(&server)
      .await;

    let (auth, _) = setup(&server, false);

    let err = auth.sign_in(&email(), &password()).await.unwrap_err();
    assert!(matches!(err, AuthError::Repository(_)));
  }

  #[tokio::test]
  async fn test_sign_out_requires_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:signUp"))
      .respond_with(ResponseTemplate::new(200).set_body_json(tokens()))
      .mount(&server)
      .await;

    let (auth, _) = setup(&server, false);

    assert!(matches!(auth.sign_out().await, Err(AuthError::UserNotSignedIn)));

    auth
      .sign_up(&email(), &password(), Handles::new())
      .await
      .unwrap();
    auth.sign_out().await.unwrap();
    assert!(matches!(auth.sign_out().await, Err(AuthError::UserNotSignedIn)));
  }

  #[tokio::test]
  async fn test_reset_password_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/accounts:sendOobCode"))
      .and(body_partial_json(json!({
        "requestType": "PASSWORD_RESET",
        "email": "alice@example.com"
      })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "email": "alice@example.com" })),
      )
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/accounts:resetPassword"))
      .and(body_partial_json(json!({ "oobCode": "stale" })))
      .respond_with(provider_failure("EXPIRED_OOB_CODE"))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/accounts:resetPassword"))
      .and(body_partial_json(json!({ "oobCode": "bogus" })))
      .respond_with(provider_failure("INVALID_OOB_CODE"))
      .mount(&server)
      .await;

    let (auth, _) = setup(&server, false);

    auth.reset_password(&email()).await.unwrap();
    assert!(matches!(
      auth.confirm_password_reset("stale", &password()).await,
      Err(AuthError::PasswordResetLinkExpired)
    ));
    assert!(matches!(
      auth.confirm_password_reset("bogus", &password()).await,
      Err(AuthError::PasswordResetLinkInvalid)
    ));
  }

  #[test]
  fn test_provider_error_keeps_unknown_message() {
    let err = provider_error("WEAK_PASSWORD : Password should be at least 6 characters", "a@x.com");

    assert!(matches!(err, AuthError::Provider(ref m) if m.starts_with("WEAK_PASSWORD")));
  }
}
