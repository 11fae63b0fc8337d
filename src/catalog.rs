//! Catalog gateway: the station's view of the external song catalog.

use async_trait::async_trait;
use genius_rs::{
    ArtistSongsOptions, CatalogHit, CatalogSong, GeniusApi, GeniusConfig, GeniusError,
};

use crate::error::{Result, SongError};

/// Song lookups against the external catalog.
///
/// Implementations must report a missing song or artist as
/// [`SongError::NotFound`] and every other catalog failure as
/// [`SongError::ExternalLookupFailed`].
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn fetch_by_id(&self, song_id: &str) -> Result<CatalogSong>;

    async fn fetch_by_artist(
        &self,
        artist_id: &str,
        options: &ArtistSongsOptions,
    ) -> Result<Vec<CatalogSong>>;

    async fn search_by_query(&self, query: &str) -> Result<Vec<CatalogHit>>;
}

impl From<GeniusError> for SongError {
    fn from(err: GeniusError) -> Self {
        match err {
            GeniusError::NotFound(what) => SongError::NotFound(what),
            GeniusError::InvalidRequest(reason) => SongError::InvalidInput(reason),
            other => SongError::ExternalLookupFailed(other.to_string()),
        }
    }
}

/// Gateway backed by the Genius API
pub struct GeniusCatalog {
    api: GeniusApi,
}

impl GeniusCatalog {
    pub fn new(config: GeniusConfig) -> anyhow::Result<Self> {
        let api = GeniusApi::new(config)
            .map_err(|e| anyhow::anyhow!("Failed to create Genius API client: {}", e))?;
        Ok(Self { api })
    }
}

#[async_trait]
impl CatalogGateway for GeniusCatalog {
    async fn fetch_by_id(&self, song_id: &str) -> Result<CatalogSong> {
        tracing::debug!("Catalog lookup for song {}", song_id);
        Ok(self.api.get_song(song_id).await?)
    }

    async fn fetch_by_artist(
        &self,
        artist_id: &str,
        options: &ArtistSongsOptions,
    ) -> Result<Vec<CatalogSong>> {
        tracing::debug!("Catalog lookup for artist {} ({:?})", artist_id, options);
        let listing = self.api.get_artist_songs(artist_id, options).await?;
        Ok(listing.songs)
    }

    async fn search_by_query(&self, query: &str) -> Result<Vec<CatalogHit>> {
        tracing::debug!("Catalog search for '{}'", query);
        Ok(self.api.search(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_errors_stay_distinguishable() {
        assert!(matches!(
            SongError::from(GeniusError::NotFound("/songs/1".into())),
            SongError::NotFound(_)
        ));
        assert!(matches!(
            SongError::from(GeniusError::Api {
                status: 500,
                message: "boom".into()
            }),
            SongError::ExternalLookupFailed(_)
        ));
        assert!(matches!(
            SongError::from(GeniusError::InvalidRequest("song id is required".into())),
            SongError::InvalidInput(_)
        ));
    }
}
