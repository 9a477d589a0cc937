//! Character references as they appear in an anime roster.

use serde::{Deserialize, Serialize};

use crate::ids::{AnimeId, CharacterId};

/// A character as cached inside an anime roster.
///
/// Immutable once fetched. Field names on the wire match the persisted
/// document layout (`mal_id`, `image_url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRef {
    #[serde(rename = "mal_id")]
    pub id: CharacterId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CharacterRef {
    pub fn new(id: CharacterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Project this character together with its owning anime.
    pub fn detailed(&self, anime_id: AnimeId, anime_title: &str) -> DetailedCharacterRef {
        DetailedCharacterRef {
            id: self.id,
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            anime_id,
            anime_title: anime_title.to_string(),
        }
    }
}

/// Transient view of a character joined with the anime it was listed under.
///
/// Never stored; rebuilt from the roster cache whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedCharacterRef {
    pub id: CharacterId,
    pub name: String,
    pub image_url: Option<String>,
    pub anime_id: AnimeId,
    pub anime_title: String,
}

/// Role label the metadata source uses for protagonists.
pub const MAIN_ROLE: &str = "Main";

/// One roster line as returned by the metadata source, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    pub character: CharacterRef,
    pub role: String,
}

impl RosterMember {
    pub fn new(character: CharacterRef, role: impl Into<String>) -> Self {
        Self {
            character,
            role: role.into(),
        }
    }

    /// Only main characters take part in the game.
    pub fn is_main(&self) -> bool {
        self.role == MAIN_ROLE
    }
}
