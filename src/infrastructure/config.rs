use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::domain::account::services::USERS_COLLECTION;

// Default value functions
fn default_collection() -> String {
  USERS_COLLECTION.to_string()
}

fn default_firestore_database() -> String {
  "(default)".to_string()
}

fn default_firestore_base_url() -> String {
  "https://firestore.googleapis.com/v1".to_string()
}

fn default_identity_base_url() -> String {
  "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_timeout() -> u64 {
  10
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub firestore: Option<FirestoreConfig>,
  #[serde(default)]
  pub identity: Option<IdentityConfig>,
}

/// Which document store backs the user records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
  #[default]
  Memory,
  Firestore,
}

/// Document store selection
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  #[serde(default)]
  pub backend: StoreBackend,
  #[serde(default = "default_collection")]
  pub collection: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend: StoreBackend::default(),
      collection: default_collection(),
    }
  }
}

/// Firestore REST configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
  pub project_id: String,
  #[serde(default = "default_firestore_database")]
  pub database: String,
  /// Point this at the emulator (e.g. `http://localhost:8080/v1`) for local runs
  #[serde(default = "default_firestore_base_url")]
  pub base_url: String,
  /// OAuth bearer token; the emulator needs none
  #[serde(default)]
  pub access_token: Option<String>,
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

/// Identity Toolkit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
  pub api_key: String,
  #[serde(default = "default_identity_base_url")]
  pub base_url: String,
  /// Refuse sign-in until the account's email is verified
  #[serde(default)]
  pub require_verified_email: bool,
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

impl Config {
  /// Load configuration from files and environment variables
  ///
  /// Sources, later ones overriding earlier ones:
  /// 1. config/default.toml
  /// 2. config/local.toml (if exists)
  /// 3. config/{RUN_MODE}.toml (if exists)
  /// 4. Environment variables with the CPCOMPANION_ prefix
  ///
  /// # Environment Variables
  ///
  /// Nested keys are separated by double underscores:
  /// - `CPCOMPANION_STORE__BACKEND=firestore`
  /// - `CPCOMPANION_FIRESTORE__PROJECT_ID=my-project`
  /// - `CPCOMPANION_FIRESTORE__ACCESS_TOKEN=ya29...`
  /// - `CPCOMPANION_IDENTITY__API_KEY=AIza...`
  ///
  /// # Errors
  ///
  /// Returns a `ConfigError` if a file is malformed or a value has the wrong type.
  pub fn load() -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    let config = ConfigBuilder::builder()
      .add_source(File::with_name("config/default").required(false))
      .add_source(File::with_name("config/local").required(false))
      .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
      .add_source(
        Environment::with_prefix("CPCOMPANION")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;

    config.try_deserialize()
  }

  /// The Firestore section, required when the backend is `firestore`
  pub fn firestore(&self) -> Result<&FirestoreConfig, ConfigError> {
    self
      .firestore
      .as_ref()
      .ok_or_else(|| ConfigError::NotFound("firestore".to_string()))
  }

  pub fn identity(&self) -> Result<&IdentityConfig, ConfigError> {
    self
      .identity
      .as_ref()
      .ok_or_else(|| ConfigError::NotFound("identity".to_string()))
  }
}
