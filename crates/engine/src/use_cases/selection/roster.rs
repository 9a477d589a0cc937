//! Anime roster cache: fetch-or-populate over the metadata source.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use charpick_domain::{
    is_resolved_title, queries, AnimeCacheEntry, AnimeId, AnimeMetadata, CharacterId,
    CharacterRef, DetailedCharacterRef, UNRESOLVED_ANIME_TITLE,
};

use super::store::SelectionStore;
use crate::infrastructure::ports::{MetadataFetchError, MetadataSource};

fn resolved_title(hint: Option<&str>) -> Option<&str> {
    hint.filter(|t| is_resolved_title(t))
}

fn present_image(hint: Option<&str>) -> Option<&str> {
    hint.filter(|url| !url.trim().is_empty())
}

pub(crate) struct RosterCache {
    store: Arc<SelectionStore>,
    metadata: Arc<dyn MetadataSource>,
    remote_timeout: Duration,
}

impl RosterCache {
    pub fn new(
        store: Arc<SelectionStore>,
        metadata: Arc<dyn MetadataSource>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            store,
            metadata,
            remote_timeout,
        }
    }

    /// Main-character roster for `anime_id`, fetched at most once.
    ///
    /// Never fails: on a metadata error the previously cached roster (maybe
    /// empty) comes back.
    pub async fn resolve(
        &self,
        anime_id: AnimeId,
        title_hint: Option<&str>,
        image_hint: Option<&str>,
    ) -> Vec<DetailedCharacterRef> {
        let cached = self.store.read(|s| s.entry(anime_id).cloned());
        match cached {
            Some(entry) if entry.has_roster() => {
                self.serve_cached(entry, title_hint, image_hint).await
            }
            previous => {
                self.fetch_and_store(anime_id, previous, title_hint, image_hint)
                    .await
            }
        }
    }

    /// Cached roster, refreshing sentinel metadata in place when possible.
    async fn serve_cached(
        &self,
        entry: AnimeCacheEntry,
        title_hint: Option<&str>,
        image_hint: Option<&str>,
    ) -> Vec<DetailedCharacterRef> {
        if entry.has_resolved_title() && entry.has_image() {
            return entry.detailed_roster();
        }

        let mut title = entry.title.clone();
        let mut image_url = entry.image_url.clone();

        if !entry.has_resolved_title() {
            if let Some(hint) = resolved_title(title_hint) {
                title = hint.to_string();
            } else if let Some(meta) = self.lookup_metadata(entry.id).await {
                if is_resolved_title(&meta.title) {
                    title = meta.title;
                }
                if !entry.has_image() {
                    image_url = meta.image_url;
                }
            }
        }
        if image_url.trim().is_empty() {
            if let Some(hint) = present_image(image_hint) {
                image_url = hint.to_string();
            }
        }

        if title != entry.title || image_url != entry.image_url {
            tracing::debug!(anime_id = %entry.id, %title, "Refreshing cached anime metadata");
            self.store
                .commit(|s| s.update_metadata(entry.id, &title, &image_url))
                .await;
        }
        entry.detailed_roster_titled(&title)
    }

    async fn fetch_and_store(
        &self,
        anime_id: AnimeId,
        previous: Option<AnimeCacheEntry>,
        title_hint: Option<&str>,
        image_hint: Option<&str>,
    ) -> Vec<DetailedCharacterRef> {
        let previous_title = previous
            .as_ref()
            .map(|e| e.title.as_str())
            .filter(|t| is_resolved_title(t));
        let previous_image = previous
            .as_ref()
            .map(|e| e.image_url.as_str())
            .filter(|url| !url.trim().is_empty());

        let mut title = resolved_title(title_hint)
            .or(previous_title)
            .map(str::to_string);
        let mut image_url = present_image(image_hint)
            .or(previous_image)
            .map(str::to_string);

        if title.is_none() {
            if let Some(meta) = self.lookup_metadata(anime_id).await {
                if is_resolved_title(&meta.title) {
                    title = Some(meta.title);
                }
                if image_url.is_none() && !meta.image_url.trim().is_empty() {
                    image_url = Some(meta.image_url);
                }
            }
        }

        let title = title.unwrap_or_else(|| UNRESOLVED_ANIME_TITLE.to_string());
        let image_url = image_url.unwrap_or_default();

        let fetched = self
            .bounded(self.metadata.get_anime_roster(anime_id))
            .await;
        match fetched {
            Ok(members) => {
                let mut seen = HashSet::new();
                let roster: Vec<CharacterRef> = members
                    .into_iter()
                    .filter(|m| m.is_main())
                    .map(|m| m.character)
                    .filter(|c| seen.insert(c.id))
                    .collect();
                tracing::debug!(anime_id = %anime_id, characters = roster.len(), "Fetched anime roster");

                let entry = AnimeCacheEntry::new(anime_id, title, image_url, roster);
                let detailed = entry.detailed_roster();
                self.store.commit(|s| s.store_entry(entry)).await;
                detailed
            }
            Err(e) => {
                tracing::warn!(anime_id = %anime_id, error = %e, "Failed to fetch anime roster");

                let mut detailed = Vec::new();
                self.store
                    .commit(|s| {
                        let roster = s
                            .entry(anime_id)
                            .map(|existing| existing.roster.clone())
                            .unwrap_or_default();
                        let entry = AnimeCacheEntry::new(anime_id, title, image_url, roster);
                        detailed = entry.detailed_roster();
                        s.store_entry(entry)
                    })
                    .await;
                detailed
            }
        }
    }

    async fn lookup_metadata(&self, anime_id: AnimeId) -> Option<AnimeMetadata> {
        match self.bounded(self.metadata.get_anime_by_id(anime_id)).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(anime_id = %anime_id, error = %e, "Failed to look up anime metadata");
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, MetadataFetchError>>,
    ) -> Result<T, MetadataFetchError> {
        match tokio::time::timeout(self.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(MetadataFetchError::Timeout(self.remote_timeout)),
        }
    }

    /// Deselect the whole cached roster if any of it is selected, otherwise
    /// resolve the roster and select all of it.
    pub async fn toggle_all(
        &self,
        anime_id: AnimeId,
        title_hint: Option<&str>,
        image_hint: Option<&str>,
    ) {
        let selected =
            !self.store.is_loading() && self.store.read(|s| queries::is_anime_selected(s, anime_id));

        if selected {
            self.store
                .commit(|s| {
                    let ids: Vec<CharacterId> = s
                        .entry(anime_id)
                        .map(|e| e.roster_ids().collect())
                        .unwrap_or_default();
                    s.deselect_all(ids)
                })
                .await;
            return;
        }

        let roster = self.resolve(anime_id, title_hint, image_hint).await;
        self.store
            .commit(|s| s.select_all(roster.iter().map(|c| c.id)))
            .await;
    }
}
