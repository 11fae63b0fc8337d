use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::engagement::{Comment, Heart};
use crate::normalize::Projection;

/// Catalog song identifier.
///
/// The catalog sends numeric ids; the wire form is kept as received so
/// clients get back exactly what the catalog gave. Engagement records
/// store ids as text, see [`SongId::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SongId {
    Numeric(u64),
    Text(String),
}

impl SongId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(SongId::Numeric),
            Value::String(s) if !s.trim().is_empty() => Some(SongId::Text(s.trim().to_string())),
            _ => None,
        }
    }

    /// Text form used to match engagement records
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SongId::Numeric(n) => write!(f, "{}", n),
            SongId::Text(s) => f.write_str(s),
        }
    }
}

/// A song cut down to the detail field set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongDetail {
    pub id: SongId,
    pub title: Option<String>,
    pub full_title: Option<String>,
    #[serde(rename = "song_art_image_url")]
    pub art_image_url: Option<String>,
    #[serde(rename = "release_date_for_display")]
    pub release_date_display: Option<String>,
    pub primary_artist: Option<Value>,
}

impl SongDetail {
    /// Build from a detail projection; `None` when the record has no usable id
    pub fn from_projection(mut projection: Projection) -> Option<Self> {
        let id = projection.get("id").and_then(SongId::from_value)?;
        Some(Self {
            id,
            title: projection.take_string("title"),
            full_title: projection.take_string("full_title"),
            art_image_url: projection.take_string("song_art_image_url"),
            release_date_display: projection.take_string("release_date_for_display"),
            primary_artist: projection.take("primary_artist"),
        })
    }
}

/// A song cut down to the summary field set, as returned by search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongSummary {
    pub id: SongId,
    pub title: Option<String>,
    #[serde(rename = "song_art_image_url")]
    pub art_image_url: Option<String>,
    pub primary_artist: Option<Value>,
}

impl SongSummary {
    pub fn from_projection(mut projection: Projection) -> Option<Self> {
        let id = projection.get("id").and_then(SongId::from_value)?;
        Some(Self {
            id,
            title: projection.take_string("title"),
            art_image_url: projection.take_string("song_art_image_url"),
            primary_artist: projection.take("primary_artist"),
        })
    }
}

/// A song with the station's hearts and comments attached.
///
/// `hearts` and `comments` are always present, empty when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSong {
    pub id: SongId,
    pub title: Option<String>,
    pub full_title: Option<String>,
    #[serde(rename = "song_art_image_url")]
    pub art_image_url: Option<String>,
    #[serde(rename = "release_date_for_display")]
    pub release_date_display: Option<String>,
    pub primary_artist: Option<Value>,
    pub hearts: Vec<Heart>,
    pub comments: Vec<Comment>,
}

impl AnnotatedSong {
    pub fn new(song: SongDetail, hearts: Vec<Heart>, comments: Vec<Comment>) -> Self {
        Self {
            id: song.id,
            title: song.title,
            full_title: song.full_title,
            art_image_url: song.art_image_url,
            release_date_display: song.release_date_display,
            primary_artist: song.primary_artist,
            hearts,
            comments,
        }
    }
}
