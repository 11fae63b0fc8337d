use crate::error::{GeniusError, Result};
use crate::models::*;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.genius.com";

/// Connection settings for the catalog client
#[derive(Debug, Clone)]
pub struct GeniusConfig {
    /// API root, overridable so tests can point at a local server
    pub base_url: String,
    /// Client access token sent as a bearer token
    pub access_token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GeniusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl GeniusConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct GeniusApi {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl GeniusApi {
    pub fn new(config: GeniusConfig) -> Result<Self> {
        info!("Initializing Genius API client for {}", config.base_url);

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            GeniusError::InvalidRequest(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GeniusError::InvalidRequest(format!(
                "Base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        if config.access_token.is_empty() {
            warn!("No access token configured, catalog requests will likely be rejected");
        }

        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("song-station/", env!("CARGO_PKG_VERSION")))
                .timeout(config.timeout)
                .build()?,
            base_url,
            access_token: config.access_token,
        })
    }

    /// Get a single song by id
    #[instrument(skip(self), fields(service = "genius"))]
    pub async fn get_song(&self, song_id: &str) -> Result<CatalogSong> {
        let song_id = required("song id", song_id)?;
        info!("Fetching song: {}", song_id);

        let response: SongResponse = self.send_get(&["songs", song_id], &[]).await?;
        Ok(response.song)
    }

    /// Get one page of an artist's songs
    #[instrument(skip(self), fields(service = "genius"))]
    pub async fn get_artist_songs(
        &self,
        artist_id: &str,
        options: &ArtistSongsOptions,
    ) -> Result<ArtistSongsResponse> {
        let artist_id = required("artist id", artist_id)?;
        info!("Fetching songs for artist: {}", artist_id);

        let response: ArtistSongsResponse = self
            .send_get(&["artists", artist_id, "songs"], &options.query_pairs())
            .await?;

        info!(
            "Fetched {} songs for artist {} (next page: {:?})",
            response.songs.len(),
            artist_id,
            response.next_page
        );
        Ok(response)
    }

    /// Free-text search
    #[instrument(skip(self), fields(service = "genius"))]
    pub async fn search(&self, query: &str) -> Result<Vec<CatalogHit>> {
        let query = required("search query", query)?;
        info!("Searching for '{}'", query);

        let response: SearchResponse = self
            .send_get(&["search"], &[("q", query.to_string())])
            .await?;

        info!("Search successful, found {} hits", response.hits.len());
        Ok(response.hits)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeniusError::InvalidRequest("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("GET request to: {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Response received ({}), length: {} bytes", status, text.len());

        if status == StatusCode::NOT_FOUND {
            warn!("Catalog has no resource at {}", url.path());
            return Err(GeniusError::NotFound(url.path().to_string()));
        }

        let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                error!("Catalog request failed with status {}", status);
                return Err(GeniusError::Api {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("Unexpected status")
                        .to_string(),
                });
            }
            Err(e) => {
                error!("Failed to parse catalog response: {}", e);
                return Err(e.into());
            }
        };

        match envelope.meta.status {
            200 => envelope.response.ok_or_else(|| GeniusError::Api {
                status: 200,
                message: "Response body is missing".to_string(),
            }),
            404 => Err(GeniusError::NotFound(url.path().to_string())),
            other => {
                warn!("Catalog answered with meta status {}", other);
                Err(GeniusError::Api {
                    status: other,
                    message: envelope
                        .meta
                        .message
                        .unwrap_or_else(|| "Unknown catalog error".to_string()),
                })
            }
        }
    }
}

fn required<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GeniusError::InvalidRequest(format!("{} is required", what)));
    }
    Ok(value)
}
