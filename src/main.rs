use anyhow::Context;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cpcompanion::{
  domain::account::{DocumentStore, FirestoreUserService, User, UserRepository},
  infrastructure::{
    config::{Config, StoreBackend},
    persistence::{FirestoreRestStore, InMemoryDocumentStore},
  },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cpcompanion=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!(
    backend = ?config.store.backend,
    collection = %config.store.collection,
    "Configuration loaded"
  );

  let store: Arc<dyn DocumentStore> = match config.store.backend {
    StoreBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
    StoreBackend::Firestore => {
      let firestore = config.firestore()?;
      tracing::info!(
        project_id = %firestore.project_id,
        base_url = %firestore.base_url,
        "Using Firestore"
      );
      Arc::new(FirestoreRestStore::new(firestore)?)
    }
  };
  let users = FirestoreUserService::with_collection(store, config.store.collection.as_str());

  // One full record lifecycle on a throwaway id
  let user_id = format!("smoke-{}", uuid::Uuid::new_v4());
  let mut user = User::new(user_id.as_str(), "Smoke Test", "smoke@example.com");
  user.add_handle("codeforces", "smoke_cf");

  users.create_user(&user).await?;
  tracing::info!(%user_id, "Created user");

  let loaded = users.get_user(&user_id).await?;
  tracing::info!("Loaded user\n{}", loaded);

  users
    .edit_user_field(&user_id, "bookmarks", json!(["two-pointers"]))
    .await?;
  let bookmarks = users.get_user_field(&user_id, "bookmarks").await?;
  tracing::info!(%bookmarks, "Edited bookmarks");

  users.remove_user(&user_id).await?;
  tracing::info!(%user_id, "Removed user");

  Ok(())
}
