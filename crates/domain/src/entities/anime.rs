//! Anime cache entries and the metadata used to populate them.

use serde::{Deserialize, Serialize};

use crate::entities::character::{CharacterRef, DetailedCharacterRef};
use crate::ids::{AnimeId, CharacterId};

/// Placeholder title for an anime whose metadata has not been resolved yet.
pub const UNRESOLVED_ANIME_TITLE: &str = "Anime";

/// Whether `title` carries real data rather than the placeholder.
pub fn is_resolved_title(title: &str) -> bool {
    let title = title.trim();
    !title.is_empty() && title != UNRESOLVED_ANIME_TITLE
}

fn unresolved_title() -> String {
    UNRESOLVED_ANIME_TITLE.to_string()
}

/// Display metadata for one anime, as returned by the metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimeMetadata {
    pub title: String,
    pub image_url: String,
}

impl AnimeMetadata {
    pub fn new(title: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image_url: image_url.into(),
        }
    }
}

/// Last-known-good snapshot of one anime's metadata and main-character roster.
///
/// An empty roster means either no fetch has succeeded yet or the source
/// genuinely listed no main characters; the two cannot be told apart here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeCacheEntry {
    #[serde(rename = "mal_id")]
    pub id: AnimeId,
    #[serde(default = "unresolved_title")]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, rename = "characters")]
    pub roster: Vec<CharacterRef>,
}

impl AnimeCacheEntry {
    pub fn new(
        id: AnimeId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        roster: Vec<CharacterRef>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            roster,
        }
    }

    /// An entry with sentinel metadata and no roster.
    pub fn placeholder(id: AnimeId) -> Self {
        Self::new(id, UNRESOLVED_ANIME_TITLE, "", Vec::new())
    }

    pub fn has_roster(&self) -> bool {
        !self.roster.is_empty()
    }

    pub fn has_resolved_title(&self) -> bool {
        is_resolved_title(&self.title)
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.trim().is_empty()
    }

    pub fn roster_ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.roster.iter().map(|c| c.id)
    }

    pub fn detailed_roster(&self) -> Vec<DetailedCharacterRef> {
        self.detailed_roster_titled(&self.title)
    }

    pub fn detailed_roster_titled(&self, title: &str) -> Vec<DetailedCharacterRef> {
        self.roster
            .iter()
            .map(|c| c.detailed(self.id, title))
            .collect()
    }
}
