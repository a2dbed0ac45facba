//! Identity provider adapters implementing `Authentication`

mod firebase_authentication;
mod mock_authentication;

pub use firebase_authentication::FirebaseAuthentication;
pub use mock_authentication::MockAuthentication;

/// A signed-in session as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user_id: String,
  pub email: String,
  pub id_token: String,
  pub refresh_token: Option<String>,
}
