use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::errors::ValidationError;
use super::ports::Document;

/// Platform name (e.g. "codeforces") to the user's handle on that platform
pub type Handles = BTreeMap<String, String>;

/// Top-level keys of a stored user document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
  UserId,
  Name,
  Email,
  Handles,
  History,
  Bookmarks,
  Favorites,
}

impl UserField {
  /// Every key, in document order
  pub const ALL: [UserField; 7] = [
    UserField::UserId,
    UserField::Name,
    UserField::Email,
    UserField::Handles,
    UserField::History,
    UserField::Bookmarks,
    UserField::Favorites,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      UserField::UserId => "user_id",
      UserField::Name => "name",
      UserField::Email => "email",
      UserField::Handles => "handles",
      UserField::History => "history",
      UserField::Bookmarks => "bookmarks",
      UserField::Favorites => "favorites",
    }
  }

  /// Checks that `value` has the shape this field is stored with
  pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
    match self {
      UserField::UserId | UserField::Name | UserField::Email => {
        decode::<String>(*self, value).map(|_| ())
      }
      UserField::Handles => decode::<Handles>(*self, value).map(|_| ()),
      UserField::History | UserField::Bookmarks | UserField::Favorites => {
        decode::<Vec<String>>(*self, value).map(|_| ())
      }
    }
  }
}

impl fmt::Display for UserField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for UserField {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    UserField::ALL
      .into_iter()
      .find(|field| field.as_str() == s)
      .ok_or_else(|| ValidationError::InvalidField {
        field: s.to_string(),
        reason: "not a user field".to_string(),
      })
  }
}

/// A user account record
///
/// The identifier is fixed at construction: nothing on this type changes it,
/// and `parse_data` leaves it alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  user_id: String,
  name: String,
  email: String,
  handles: Handles,
  history: Vec<String>,
  bookmarks: Vec<String>,
  favorites: Vec<String>,
}

impl User {
  /// Creates a user with no handles and empty material lists
  pub fn new(
    user_id: impl Into<String>,
    name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      user_id: user_id.into(),
      name: name.into(),
      email: email.into(),
      handles: Handles::new(),
      history: Vec::new(),
      bookmarks: Vec::new(),
      favorites: Vec::new(),
    }
  }

  /// Replaces the handle map
  pub fn with_handles(mut self, handles: Handles) -> Self {
    self.handles = handles;
    self
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = name.into();
  }

  pub fn email(&self) -> &str {
    &self.email
  }

  pub fn set_email(&mut self, email: impl Into<String>) {
    self.email = email.into();
  }

  // Handles

  /// Sets the handle for a platform, replacing any previous one
  pub fn add_handle(&mut self, platform: impl Into<String>, handle: impl Into<String>) {
    self.handles.insert(platform.into(), handle.into());
  }

  /// Removes the handle for a platform, returning it if there was one
  pub fn remove_handle(&mut self, platform: &str) -> Option<String> {
    self.handles.remove(platform)
  }

  pub fn handle(&self, platform: &str) -> Option<&str> {
    self.handles.get(platform).map(String::as_str)
  }

  pub fn handles(&self) -> &Handles {
    &self.handles
  }

  // Materials

  pub fn add_history(&mut self, material: impl Into<String>) {
    self.history.push(material.into());
  }

  /// Removes the first matching entry; returns false if there was none
  pub fn remove_history(&mut self, material: &str) -> bool {
    remove_first(&mut self.history, material)
  }

  pub fn history(&self) -> &[String] {
    &self.history
  }

  pub fn add_bookmark(&mut self, material: impl Into<String>) {
    self.bookmarks.push(material.into());
  }

  pub fn remove_bookmark(&mut self, material: &str) -> bool {
    remove_first(&mut self.bookmarks, material)
  }

  pub fn bookmarks(&self) -> &[String] {
    &self.bookmarks
  }

  pub fn add_favorite(&mut self, material: impl Into<String>) {
    self.favorites.push(material.into());
  }

  pub fn remove_favorite(&mut self, material: &str) -> bool {
    remove_first(&mut self.favorites, material)
  }

  pub fn favorites(&self) -> &[String] {
    &self.favorites
  }

  // Document conversion

  /// Builds a user from a stored document.
  ///
  /// All seven keys must be present; the first absent one is reported as
  /// `ValidationError::MissingField`. Unknown keys are ignored.
  pub fn from_dict(data: &Document) -> Result<Self, ValidationError> {
    for field in UserField::ALL {
      require(data, field)?;
    }

    let mut user = Self::new(
      decode::<String>(UserField::UserId, require(data, UserField::UserId)?)?,
      String::new(),
      String::new(),
    );
    user.parse_data(data)?;
    Ok(user)
  }

  /// Overwrites every field except the identifier from `data`.
  ///
  /// On error the user is left unchanged.
  pub fn parse_data(&mut self, data: &Document) -> Result<(), ValidationError> {
    let name = decode(UserField::Name, require(data, UserField::Name)?)?;
    let email = decode(UserField::Email, require(data, UserField::Email)?)?;
    let handles = decode(UserField::Handles, require(data, UserField::Handles)?)?;
    let history = decode(UserField::History, require(data, UserField::History)?)?;
    let bookmarks = decode(UserField::Bookmarks, require(data, UserField::Bookmarks)?)?;
    let favorites = decode(UserField::Favorites, require(data, UserField::Favorites)?)?;

    self.name = name;
    self.email = email;
    self.handles = handles;
    self.history = history;
    self.bookmarks = bookmarks;
    self.favorites = favorites;
    Ok(())
  }

  /// Serializes the user into the stored document layout
  pub fn to_dict(&self) -> Document {
    UserField::ALL
      .into_iter()
      .map(|field| (field.to_string(), self.field_value(field)))
      .collect()
  }

  /// The stored value of a single field
  pub fn field_value(&self, field: UserField) -> Value {
    match field {
      UserField::UserId => Value::String(self.user_id.clone()),
      UserField::Name => Value::String(self.name.clone()),
      UserField::Email => Value::String(self.email.clone()),
      UserField::Handles => Value::Object(
        self
          .handles
          .iter()
          .map(|(platform, handle)| (platform.clone(), Value::String(handle.clone())))
          .collect(),
      ),
      UserField::History => string_list(&self.history),
      UserField::Bookmarks => string_list(&self.bookmarks),
      UserField::Favorites => string_list(&self.favorites),
    }
  }
}

impl fmt::Display for User {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Name: {}", self.name)?;
    writeln!(f, "Email: {}", self.email)?;
    writeln!(f, "Handles: {:?}", self.handles)?;
    writeln!(f, "History: {:?}", self.history)?;
    writeln!(f, "Bookmarks: {:?}", self.bookmarks)?;
    write!(f, "Favorites: {:?}", self.favorites)
  }
}

fn require(data: &Document, field: UserField) -> Result<&Value, ValidationError> {
  data
    .get(field.as_str())
    .ok_or_else(|| ValidationError::MissingField {
      field: field.to_string(),
    })
}

fn decode<T: DeserializeOwned>(field: UserField, value: &Value) -> Result<T, ValidationError> {
  T::deserialize(value).map_err(|e| ValidationError::InvalidField {
    field: field.to_string(),
    reason: e.to_string(),
  })
}

fn string_list(items: &[String]) -> Value {
  Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn remove_first(items: &mut Vec<String>, material: &str) -> bool {
  match items.iter().position(|item| item == material) {
    Some(index) => {
      items.remove(index);
      true
    }
    None => false,
  }
}
