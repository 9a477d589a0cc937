//! Remote per-user document stores.
//!
//! Both implementations share the merge contract of [`DocumentStore`]:
//! an upsert only replaces the top-level fields it carries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};

use charpick_domain::{SelectionDocument, UserId};

use crate::infrastructure::ports::{DocumentStore, DocumentStoreError};

// =============================================================================
// In-memory
// =============================================================================

/// Document store held in process memory.
///
/// Documents are kept as raw JSON objects so fields written by other clients
/// survive merges untouched.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Map<String, Value>>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw document, replacing any existing one.
    pub fn insert_raw(&self, user_id: &UserId, document: Map<String, Value>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.as_str().to_string(), document);
    }

    pub fn raw(&self, user_id: &UserId) -> Option<Map<String, Value>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id.as_str())
            .cloned()
    }

    /// Number of successful upserts since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate an outage: every call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, operation: &'static str) -> Result<(), DocumentStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::request(operation, "store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SelectionDocument>, DocumentStoreError> {
        self.check_available("get_document")?;
        let Some(raw) = self.raw(user_id) else {
            return Ok(None);
        };
        serde_json::from_value(Value::Object(raw))
            .map(Some)
            .map_err(|e| DocumentStoreError::invalid_document(user_id, e))
    }

    async fn upsert_document(
        &self,
        user_id: &UserId,
        fields: SelectionDocument,
    ) -> Result<(), DocumentStoreError> {
        self.check_available("upsert_document")?;
        let Value::Object(fields) = serde_json::to_value(&fields)
            .map_err(|e| DocumentStoreError::invalid_document(user_id, e))?
        else {
            return Err(DocumentStoreError::invalid_document(
                user_id,
                "document did not serialize to an object",
            ));
        };

        {
            let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
            let document = documents.entry(user_id.as_str().to_string()).or_default();
            document.extend(fields);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// REST document store: `GET` / `PATCH` on `{base}/users/{user_id}`.
///
/// `PATCH` bodies carry only the fields being written; the server merges
/// them into the stored document. A 404 on `GET` means no document yet.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn document_url(
        &self,
        operation: &'static str,
        user_id: &UserId,
    ) -> Result<Url, DocumentStoreError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| DocumentStoreError::request(operation, e))?;
        url.path_segments_mut()
            .map_err(|_| DocumentStoreError::request(operation, "base URL cannot have a path"))?
            .pop_if_empty()
            .push("users")
            .push(user_id.as_str());
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SelectionDocument>, DocumentStoreError> {
        const OP: &str = "get_document";
        let url = self.document_url(OP, user_id)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| DocumentStoreError::request(OP, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocumentStoreError::request(
                OP,
                format!("{}: {}", status, error_text),
            ));
        }

        response
            .json::<SelectionDocument>()
            .await
            .map(Some)
            .map_err(|e| DocumentStoreError::invalid_document(user_id, e))
    }

    async fn upsert_document(
        &self,
        user_id: &UserId,
        fields: SelectionDocument,
    ) -> Result<(), DocumentStoreError> {
        const OP: &str = "upsert_document";
        let url = self.document_url(OP, user_id)?;
        let response = self
            .authorize(self.client.patch(url).json(&fields))
            .send()
            .await
            .map_err(|e| DocumentStoreError::request(OP, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocumentStoreError::request(
                OP,
                format!("{}: {}", status, error_text),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charpick_domain::{CharacterId, SelectionSet};
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("u1").expect("valid user id")
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.get_document(&user()).await.expect("get"), None);
    }

    #[tokio::test]
    async fn upsert_merges_top_level_fields() {
        let store = InMemoryDocumentStore::new();
        let Value::Object(seed) = json!({ "displayName": "Vash", "cachedAnimesData": {} }) else {
            unreachable!()
        };
        store.insert_raw(&user(), seed);

        let selection: SelectionSet = [CharacterId::new(7)].into_iter().collect();
        store
            .upsert_document(&user(), SelectionDocument::selection_only(selection.clone()))
            .await
            .expect("upsert");

        let raw = store.raw(&user()).expect("document exists");
        assert_eq!(raw.get("displayName"), Some(&json!("Vash")));
        assert_eq!(raw.get("cachedAnimesData"), Some(&json!({})));
        assert_eq!(raw.get("selectedCharacterIds"), Some(&json!([7])));
        assert_eq!(store.write_count(), 1);

        let doc = store.get_document(&user()).await.expect("get").expect("some");
        assert_eq!(doc.selected_character_ids, Some(selection));
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryDocumentStore::new();
        store.set_unavailable(true);

        assert!(store.get_document(&user()).await.is_err());
        assert!(store
            .upsert_document(&user(), SelectionDocument::default())
            .await
            .is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn document_url_escapes_user_id() {
        let store = HttpDocumentStore::new("https://db.example.com/v1/", Duration::from_secs(1));
        let user_id = UserId::new("a/b c").expect("valid user id");
        let url = store.document_url("get_document", &user_id).expect("url");
        assert_eq!(url.as_str(), "https://db.example.com/v1/users/a%2Fb%20c");
    }
}
