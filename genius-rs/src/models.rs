use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope every Genius endpoint answers with
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub meta: Meta,
    pub response: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
}

/// A song record exactly as the catalog returned it.
///
/// The catalog schema is wide and changes without notice, so the record is
/// kept as an open JSON object and projected by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSong(pub Map<String, Value>);

impl CatalogSong {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The song id, which the catalog sends as a JSON number
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }
}

impl From<Map<String, Value>> for CatalogSong {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// One search hit: the song plus the catalog's ranking metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogHit {
    #[serde(rename = "type", default)]
    pub hit_type: String,
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub highlights: Vec<Value>,
    pub result: CatalogSong,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongResponse {
    pub song: CatalogSong,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistSongsResponse {
    #[serde(default)]
    pub songs: Vec<CatalogSong>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<CatalogHit>,
}

/// Sort order for an artist's song listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongSort {
    Title,
    Popularity,
}

impl SongSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            SongSort::Title => "title",
            SongSort::Popularity => "popularity",
        }
    }
}

/// Paging and ordering for `/artists/:id/songs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSongsOptions {
    #[serde(default)]
    pub sort: Option<SongSort>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl ArtistSongsOptions {
    pub const MAX_PER_PAGE: u32 = 50;

    /// Query pairs for the request; unset options are not sent
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.clamp(1, Self::MAX_PER_PAGE).to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.max(1).to_string()));
        }
        pairs
    }
}
