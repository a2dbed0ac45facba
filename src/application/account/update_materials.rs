use std::sync::Arc;

use crate::domain::account::entities::{User, UserField};
use crate::domain::account::errors::UserStoreError;
use crate::domain::account::ports::UserRepository;

/// Which material list to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialList {
  History,
  Bookmarks,
  Favorites,
}

impl MaterialList {
  fn field(self) -> UserField {
    match self {
      MaterialList::History => UserField::History,
      MaterialList::Bookmarks => UserField::Bookmarks,
      MaterialList::Favorites => UserField::Favorites,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialAction {
  Add,
  Remove,
}

/// Command for adding or removing one material identifier
#[derive(Debug, Clone)]
pub struct UpdateMaterialsCommand {
  pub user_id: String,
  pub list: MaterialList,
  pub action: MaterialAction,
  pub material: String,
}

/// Use case for maintaining history, bookmarks and favorites
pub struct UpdateMaterialsUseCase {
  users: Arc<dyn UserRepository>,
}

impl UpdateMaterialsUseCase {
  pub fn new(users: Arc<dyn UserRepository>) -> Self {
    Self { users }
  }

  /// Applies the change and persists the affected list
  ///
  /// Adding appends (duplicates are kept); removing drops the first match.
  /// Removing an absent material writes nothing. Returns the list after the change.
  pub async fn execute(
    &self,
    command: UpdateMaterialsCommand,
  ) -> Result<Vec<String>, UserStoreError> {
    let mut user = self.users.get_user(&command.user_id).await?;

    let changed = match (command.action, command.list) {
      (MaterialAction::Add, MaterialList::History) => {
        user.add_history(command.material);
        true
      }
      (MaterialAction::Add, MaterialList::Bookmarks) => {
        user.add_bookmark(command.material);
        true
      }
      (MaterialAction::Add, MaterialList::Favorites) => {
        user.add_favorite(command.material);
        true
      }
      (MaterialAction::Remove, MaterialList::History) => user.remove_history(&command.material),
      (MaterialAction::Remove, MaterialList::Bookmarks) => user.remove_bookmark(&command.material),
      (MaterialAction::Remove, MaterialList::Favorites) => user.remove_favorite(&command.material),
    };

    let field = command.list.field();
    if changed {
      self
        .users
        .edit_user_field(&command.user_id, field.as_str(), user.field_value(field))
        .await?;
      tracing::debug!(user_id = %command.user_id, field = field.as_str(), "Materials updated");
    }

    Ok(materials(&user, command.list).to_vec())
  }
}

fn materials(user: &User, list: MaterialList) -> &[String] {
  match list {
    MaterialList::History => user.history(),
    MaterialList::Bookmarks => user.bookmarks(),
    MaterialList::Favorites => user.favorites(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::account::services::FirestoreUserService;
  use crate::infrastructure::persistence::InMemoryDocumentStore;

  async fn setup() -> (UpdateMaterialsUseCase, Arc<FirestoreUserService>) {
    let users = Arc::new(FirestoreUserService::new(Arc::new(InMemoryDocumentStore::new())));
    users
      .create_user(&User::new("u1", "A", "a@x.com"))
      .await
      .unwrap();
    (UpdateMaterialsUseCase::new(users.clone()), users)
  }

  fn command(list: MaterialList, action: MaterialAction, material: &str) -> UpdateMaterialsCommand {
    UpdateMaterialsCommand {
      user_id: "u1".to_string(),
      list,
      action,
      material: material.to_string(),
    }
  }

  #[tokio::test]
  async fn test_add_and_remove_bookmarks() {
    let (use_case, users) = setup().await;

    use_case
      .execute(command(MaterialList::Bookmarks, MaterialAction::Add, "m1"))
      .await
      .unwrap();
    use_case
      .execute(command(MaterialList::Bookmarks, MaterialAction::Add, "m2"))
      .await
      .unwrap();
    let bookmarks = use_case
      .execute(command(MaterialList::Bookmarks, MaterialAction::Remove, "m1"))
      .await
      .unwrap();

    assert_eq!(bookmarks, ["m2"]);
    let stored = users.get_user("u1").await.unwrap();
    assert_eq!(stored.bookmarks(), ["m2"]);
    assert!(stored.history().is_empty());
  }

  #[tokio::test]
  async fn test_history_keeps_duplicates() {
    let (use_case, _) = setup().await;

    for _ in 0..2 {
      use_case
        .execute(command(MaterialList::History, MaterialAction::Add, "m1"))
        .await
        .unwrap();
    }
    let history = use_case
      .execute(command(MaterialList::History, MaterialAction::Remove, "m1"))
      .await
      .unwrap();

    assert_eq!(history, ["m1"]);
  }

  #[tokio::test]
  async fn test_remove_absent_favorite() {
    let (use_case, users) = setup().await;

    let favorites = use_case
      .execute(command(MaterialList::Favorites, MaterialAction::Remove, "m9"))
      .await
      .unwrap();

    assert!(favorites.is_empty());
    assert!(users.get_user("u1").await.unwrap().favorites().is_empty());
  }
}
