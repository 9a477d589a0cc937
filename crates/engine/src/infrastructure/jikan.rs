//! Jikan (MyAnimeList) metadata client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use charpick_domain::{AnimeId, AnimeMetadata, CharacterId, CharacterRef, RosterMember};

use crate::infrastructure::ports::{MetadataFetchError, MetadataSource};

/// Default Jikan API base URL.
pub const DEFAULT_JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Client for the public Jikan REST API.
#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl JikanClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create client with a per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        id: AnimeId,
        path: &str,
    ) -> Result<T, MetadataFetchError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(MetadataFetchError::request)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MetadataFetchError::NotFound(id));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MetadataFetchError::status(status.as_u16(), error_text));
        }

        response.json().await.map_err(MetadataFetchError::invalid)
    }
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new(DEFAULT_JIKAN_BASE_URL)
    }
}

#[async_trait]
impl MetadataSource for JikanClient {
    async fn get_anime_by_id(&self, id: AnimeId) -> Result<AnimeMetadata, MetadataFetchError> {
        let envelope: JikanEnvelope<JikanAnime> = self.get(id, &format!("/anime/{}", id)).await?;
        Ok(convert_anime(envelope.data))
    }

    async fn get_anime_roster(
        &self,
        id: AnimeId,
    ) -> Result<Vec<RosterMember>, MetadataFetchError> {
        let envelope: JikanEnvelope<Vec<JikanCharacterEntry>> =
            self.get(id, &format!("/anime/{}/characters", id)).await?;
        Ok(envelope.data.into_iter().map(convert_roster_entry).collect())
    }
}

/// English title wins over the romanized default when present.
fn convert_anime(anime: JikanAnime) -> AnimeMetadata {
    let title = [anime.title_english, anime.title]
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty())
        .unwrap_or_default();

    AnimeMetadata::new(title, jpg_url(anime.images).unwrap_or_default())
}

fn convert_roster_entry(entry: JikanCharacterEntry) -> RosterMember {
    let mut character = CharacterRef::new(
        CharacterId::new(entry.character.mal_id),
        entry.character.name,
    );
    character.image_url = jpg_url(entry.character.images);
    RosterMember::new(character, entry.role)
}

fn jpg_url(images: Option<JikanImages>) -> Option<String> {
    images
        .and_then(|i| i.jpg)
        .and_then(|jpg| jpg.image_url)
        .filter(|url| !url.trim().is_empty())
}

// =============================================================================
// Jikan API types
// =============================================================================

#[derive(Debug, Deserialize)]
struct JikanEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct JikanAnime {
    title: Option<String>,
    title_english: Option<String>,
    images: Option<JikanImages>,
}

#[derive(Debug, Deserialize)]
struct JikanImages {
    jpg: Option<JikanImage>,
}

#[derive(Debug, Deserialize)]
struct JikanImage {
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanCharacterEntry {
    character: JikanCharacter,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct JikanCharacter {
    mal_id: i64,
    name: String,
    images: Option<JikanImages>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_sub_second_timeout() {
        let client = JikanClient::with_timeout("http://localhost:1/", Duration::from_millis(250));
        assert_eq!(client.timeout(), Duration::from_millis(250));
        assert_eq!(client.base_url, "http://localhost:1");
    }

    #[test]
    fn anime_prefers_english_title() {
        let envelope: JikanEnvelope<JikanAnime> = serde_json::from_str(
            r#"{"data": {
                "mal_id": 5114,
                "title": "Hagane no Renkinjutsushi: Fullmetal Alchemist",
                "title_english": "Fullmetal Alchemist: Brotherhood",
                "images": {"jpg": {"image_url": "https://cdn/5114.jpg"}}
            }}"#,
        )
        .expect("parse");

        let meta = convert_anime(envelope.data);
        assert_eq!(meta.title, "Fullmetal Alchemist: Brotherhood");
        assert_eq!(meta.image_url, "https://cdn/5114.jpg");
    }

    #[test]
    fn anime_falls_back_to_default_title() {
        let envelope: JikanEnvelope<JikanAnime> = serde_json::from_str(
            r#"{"data": {"title": "Mushishi", "title_english": "", "images": null}}"#,
        )
        .expect("parse");

        let meta = convert_anime(envelope.data);
        assert_eq!(meta.title, "Mushishi");
        assert_eq!(meta.image_url, "");
    }

    #[test]
    fn roster_entries_keep_role_and_image() {
        let envelope: JikanEnvelope<Vec<JikanCharacterEntry>> = serde_json::from_str(
            r#"{"data": [
                {"character": {"mal_id": 11, "name": "Elric, Edward",
                    "images": {"jpg": {"image_url": "https://cdn/c11.jpg"}}}, "role": "Main"},
                {"character": {"mal_id": 12, "name": "Hughes, Maes", "images": {"jpg": {}}},
                    "role": "Supporting"}
            ]}"#,
        )
        .expect("parse");

        let roster: Vec<RosterMember> = envelope
            .data
            .into_iter()
            .map(convert_roster_entry)
            .collect();

        assert_eq!(roster.len(), 2);
        assert!(roster[0].is_main());
        assert_eq!(
            roster[0].character.image_url.as_deref(),
            Some("https://cdn/c11.jpg")
        );
        assert!(!roster[1].is_main());
        assert!(roster[1].character.image_url.is_none());
    }
}
