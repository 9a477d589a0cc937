//! Reads and writes of the two persisted fields.
//!
//! Each field is written independently, locally always and remotely when a
//! user is attached. Local writes are awaited; remote writes run as tracked
//! background tasks so a slow document store never delays a mutation. Per
//! field and destination (and per user remotely), a write older than the last
//! one that landed is dropped, so the newest snapshot always wins. Failures
//! are logged; in-memory state stays authoritative.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use charpick_domain::{
    AnimeCache, SelectionDocument, SelectionSet, SelectionState, UserId, CACHED_ANIMES_DATA_FIELD,
    SELECTED_CHARACTER_IDS_FIELD,
};

use super::store::{PendingSave, Revisioned};
use crate::infrastructure::ports::{storage_keys, DocumentStore, DocumentStoreError, DurableStore};

type RevisionSlot = Arc<Mutex<u64>>;

struct FieldSlot {
    key: &'static str,
    field: &'static str,
    /// Last revision written locally.
    local_revision: Mutex<u64>,
    /// Last revision written remotely, per user.
    remote_revisions: std::sync::Mutex<HashMap<UserId, RevisionSlot>>,
}

impl FieldSlot {
    fn new(key: &'static str, field: &'static str) -> Self {
        Self {
            key,
            field,
            local_revision: Mutex::new(0),
            remote_revisions: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn remote_revision(&self, user: &UserId) -> RevisionSlot {
        let mut slots = self
            .remote_revisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(user.clone()).or_default())
    }
}

/// Background writes that have not finished yet.
#[derive(Default)]
struct InFlight {
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl InFlight {
    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Waits for every tracked write, including ones started while waiting.
    async fn drain(&self) {
        loop {
            let handles = std::mem::take(
                &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Background write task failed");
                }
            }
        }
    }
}

pub(crate) struct SelectionPersistence {
    durable: Arc<dyn DurableStore>,
    documents: Arc<dyn DocumentStore>,
    remote_timeout: Duration,
    selection: FieldSlot,
    cache: FieldSlot,
    local_tasks: InFlight,
    remote_tasks: InFlight,
}

impl SelectionPersistence {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        documents: Arc<dyn DocumentStore>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            durable,
            documents,
            remote_timeout,
            selection: FieldSlot::new(
                storage_keys::SELECTED_CHARACTER_IDS,
                SELECTED_CHARACTER_IDS_FIELD,
            ),
            cache: FieldSlot::new(storage_keys::CACHED_ANIMES_DATA, CACHED_ANIMES_DATA_FIELD),
            local_tasks: InFlight::default(),
            remote_tasks: InFlight::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Saving
    // -------------------------------------------------------------------------

    /// Writes the changed fields locally, then hands remote writes to
    /// background tasks and returns without waiting for them.
    pub async fn save(self: &Arc<Self>, pending: PendingSave) {
        let PendingSave {
            user,
            selection,
            cache,
        } = pending;

        let local_selection = async {
            if let Some(selection) = &selection {
                self.write_local(&self.selection, selection).await;
            }
        };
        let local_cache = async {
            if let Some(cache) = &cache {
                self.write_local(&self.cache, cache).await;
            }
        };
        tokio::join!(local_selection, local_cache);

        let Some(user) = user else {
            return;
        };
        if let Some(selection) = selection {
            self.spawn_remote(
                |this| &this.selection,
                selection.revision,
                user.clone(),
                SelectionDocument::selection_only(selection.value),
            );
        }
        if let Some(cache) = cache {
            self.spawn_remote(
                |this| &this.cache,
                cache.revision,
                user,
                SelectionDocument::cache_only(cache.value),
            );
        }
    }

    /// Runs the whole save in a background task that outlives the caller.
    pub fn save_detached(self: &Arc<Self>, pending: PendingSave) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.save(pending).await });
        self.local_tasks.track(handle);
    }

    /// Waits until every write started so far has landed or failed.
    pub async fn flush(&self) {
        self.local_tasks.drain().await;
        self.remote_tasks.drain().await;
    }

    fn spawn_remote(
        self: &Arc<Self>,
        slot: fn(&Self) -> &FieldSlot,
        revision: u64,
        user: UserId,
        document: SelectionDocument,
    ) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.write_remote(slot(&this), revision, &user, document)
                .await;
        });
        self.remote_tasks.track(handle);
    }

    async fn write_local<T: Serialize>(&self, slot: &FieldSlot, snapshot: &Revisioned<T>) {
        let bytes = match serde_json::to_vec(&snapshot.value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(field = slot.field, error = %e, "Failed to encode field");
                return;
            }
        };
        let mut written = slot.local_revision.lock().await;
        if *written >= snapshot.revision {
            tracing::debug!(
                field = slot.field,
                revision = snapshot.revision,
                latest = *written,
                "Skipping stale local write"
            );
            return;
        }
        if let Err(e) = self.durable.set(slot.key, &bytes).await {
            tracing::warn!(field = slot.field, error = %e, "Failed to persist field locally");
        }
        *written = snapshot.revision;
    }

    async fn write_remote(
        &self,
        slot: &FieldSlot,
        revision: u64,
        user: &UserId,
        document: SelectionDocument,
    ) {
        let tracker = slot.remote_revision(user);
        let mut written = tracker.lock().await;
        if *written >= revision {
            tracing::debug!(field = slot.field, revision, latest = *written, "Skipping stale remote write");
            return;
        }
        let result = self
            .bounded("upsert_document", self.documents.upsert_document(user, document))
            .await;
        if let Err(e) = result {
            tracing::warn!(
                field = slot.field,
                user_id = %user,
                error = %e,
                "Failed to persist field remotely"
            );
        }
        *written = revision;
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Local contents, with any unreadable field degraded to empty.
    /// Waits for detached local writes first, so a reload sees them.
    pub async fn load_local(&self) -> SelectionState {
        self.local_tasks.drain().await;
        let selection: SelectionSet = self.read_local(&self.selection).await.unwrap_or_default();
        let cache: AnimeCache = self.read_local(&self.cache).await.unwrap_or_default();
        SelectionState::from_parts(selection, cache)
    }

    async fn read_local<T: DeserializeOwned>(&self, slot: &FieldSlot) -> Option<T> {
        match self.durable.get(slot.key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(field = slot.field, error = %e, "Discarding undecodable local field");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(field = slot.field, error = %e, "Failed to read local field");
                None
            }
        }
    }

    pub async fn fetch_document(
        &self,
        user: &UserId,
    ) -> Result<Option<SelectionDocument>, DocumentStoreError> {
        self.bounded("get_document", self.documents.get_document(user))
            .await
    }

    /// One-time copy of guest data into a user's new remote document.
    pub async fn migrate_guest(
        &self,
        user: &UserId,
        state: &SelectionState,
    ) -> Result<(), DocumentStoreError> {
        self.bounded(
            "upsert_document",
            self.documents
                .upsert_document(user, SelectionDocument::full(state)),
        )
        .await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, DocumentStoreError>>,
    ) -> Result<T, DocumentStoreError> {
        match tokio::time::timeout(self.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DocumentStoreError::timeout(operation, self.remote_timeout)),
        }
    }
}
