use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

use super::value::{decode_fields, encode_fields, field_path};
use crate::domain::account::{
  errors::DocumentStoreError,
  ports::{Document, DocumentStore},
};
use crate::infrastructure::config::FirestoreConfig;

/// Longest document id Firestore accepts, in bytes
const MAX_DOCUMENT_ID_BYTES: usize = 1500;

/// Firestore document store over the REST v1 API
pub struct FirestoreRestStore {
  client: Client,
  documents_url: Url,
  access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
  #[serde(default)]
  fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: String,
}

impl FirestoreRestStore {
  /// Creates a store for the configured project and database
  pub fn new(config: &FirestoreConfig) -> Result<Self, DocumentStoreError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_seconds))
      .build()
      .map_err(|e| DocumentStoreError::ConnectionFailed(e.to_string()))?;

    let documents_url = Url::parse(&format!(
      "{}/projects/{}/databases/{}/documents",
      config.base_url.trim_end_matches('/'),
      config.project_id,
      config.database
    ))
    .map_err(|e| DocumentStoreError::ConnectionFailed(format!("Invalid Firestore URL: {}", e)))?;

    Ok(Self {
      client,
      documents_url,
      access_token: config.access_token.clone(),
    })
  }

  fn document_url(&self, collection: &str, id: &str) -> Result<Url, DocumentStoreError> {
    if !is_addressable(id) {
      return Err(DocumentStoreError::InvalidDocumentId(id.to_string()));
    }

    let mut url = self.documents_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| {
        DocumentStoreError::ConnectionFailed("Firestore URL cannot be a base".to_string())
      })?
      .push(collection)
      .push(id);
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let request = self.client.request(method, url);
    match &self.access_token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  /// Turns a non-success response into `RequestFailed`, preferring the API's own message
  async fn failure(response: Response) -> DocumentStoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
      .map(|envelope| envelope.error.message)
      .unwrap_or(body);

    DocumentStoreError::RequestFailed { status, message }
  }
}

/// Whether `id` can name a document: non-empty, no path separator, not a
/// relative path segment, not a reserved `__name__` and within the size limit.
fn is_addressable(id: &str) -> bool {
  !id.is_empty()
    && id.len() <= MAX_DOCUMENT_ID_BYTES
    && !id.contains('/')
    && id != "."
    && id != ".."
    && !(id.len() >= 4 && id.starts_with("__") && id.ends_with("__"))
}

#[async_trait]
impl DocumentStore for FirestoreRestStore {
  #[tracing::instrument(skip(self))]
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentStoreError> {
    let url = self.document_url(collection, id)?;
    let response = self.request(Method::GET, url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }

    let document: FirestoreDocument = response.json().await?;
    decode_fields(&document.fields).map(Some)
  }

  #[tracing::instrument(skip(self, data))]
  async fn set(
    &self,
    collection: &str,
    id: &str,
    data: Document,
  ) -> Result<(), DocumentStoreError> {
    let url = self.document_url(collection, id)?;
    let response = self
      .request(Method::PATCH, url)
      .json(&json!({ "fields": encode_fields(&data)? }))
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    Ok(())
  }

  #[tracing::instrument(skip(self, fields))]
  async fn update(
    &self,
    collection: &str,
    id: &str,
    fields: Document,
  ) -> Result<(), DocumentStoreError> {
    let url = self.document_url(collection, id)?;
    let mut query: Vec<(&str, String)> = fields
      .keys()
      .map(|name| ("updateMask.fieldPaths", field_path(name)))
      .collect();
    query.push(("currentDocument.exists", "true".to_string()));

    let response = self
      .request(Method::PATCH, url)
      .query(&query)
      .json(&json!({ "fields": encode_fields(&fields)? }))
      .send()
      .await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Err(DocumentStoreError::NotFound(format!("{}/{}", collection, id)));
    }
    if !response.status().is_success() {
      return Err(Self::failure(response).await);
    }
    Ok(())
  }

  #[tracing::instrument(skip(self))]
  async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentStoreError> {
    let url = self.document_url(collection, id)?;
    let response = self.request(Method::DELETE, url).send().await?;

    if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
      return Ok(());
    }
    Err(Self::failure(response).await)
  }
}
