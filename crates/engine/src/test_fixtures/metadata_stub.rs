//! In-memory metadata source for engine tests.
//!
//! ```rust,ignore
//! let metadata = StubMetadataSource::new().with_anime(42, "Trigun", &[(1, "Vash", "Main")]);
//! engine.resolve_anime_roster(AnimeId::new(42), None, None).await;
//! assert_eq!(metadata.roster_calls(), 1);
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use charpick_domain::{AnimeId, AnimeMetadata, CharacterId, CharacterRef, RosterMember};

use crate::infrastructure::ports::{MetadataFetchError, MetadataSource};

#[derive(Clone)]
struct StubAnime {
    metadata: AnimeMetadata,
    roster: Vec<RosterMember>,
}

/// Serves configured animes and counts every call.
#[derive(Default)]
pub struct StubMetadataSource {
    animes: RwLock<HashMap<AnimeId, StubAnime>>,
    metadata_calls: AtomicUsize,
    roster_calls: AtomicUsize,
    failing: AtomicBool,
}

impl StubMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anime whose roster is `(character id, name, role)` triples.
    pub fn with_anime(self, id: i64, title: &str, roster: &[(i64, &str, &str)]) -> Self {
        self.set_anime(id, title, roster);
        self
    }

    pub fn set_anime(&self, id: i64, title: &str, roster: &[(i64, &str, &str)]) {
        let anime = StubAnime {
            metadata: AnimeMetadata::new(title, format!("https://img.example/{id}.jpg")),
            roster: roster
                .iter()
                .map(|(cid, name, role)| {
                    RosterMember::new(CharacterRef::new(CharacterId::new(*cid), *name), *role)
                })
                .collect(),
        };
        self.animes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(AnimeId::new(id), anime);
    }

    /// Make every call fail with a transient error while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn roster_calls(&self) -> usize {
        self.roster_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, id: AnimeId) -> Result<StubAnime, MetadataFetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MetadataFetchError::status(503, "Service Unavailable"));
        }
        self.animes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(MetadataFetchError::NotFound(id))
    }
}

#[async_trait]
impl MetadataSource for StubMetadataSource {
    async fn get_anime_by_id(&self, id: AnimeId) -> Result<AnimeMetadata, MetadataFetchError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(id).map(|anime| anime.metadata)
    }

    async fn get_anime_roster(
        &self,
        id: AnimeId,
    ) -> Result<Vec<RosterMember>, MetadataFetchError> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(id).map(|anime| anime.roster)
    }
}
