//! Song aggregation.
//!
//! Joins catalog songs with the station's hearts and comments. The catalog
//! decides which songs exist; the engagement store decides who liked or
//! commented on what. Nothing is cached between requests.

use genius_rs::{ArtistSongsOptions, CatalogSong};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::CatalogGateway;
use crate::engagement::{Comment, EngagementError, EngagementRepository, Heart};
use crate::error::{Result, SongError};
use crate::identity::Identity;
use crate::normalize::{DETAIL_FIELDS, SUMMARY_FIELDS, normalize};
use crate::song::{AnnotatedSong, SongDetail, SongSummary};

pub const MAX_COMMENT_LEN: usize = 2000;

/// Records that belong to one song
pub trait SongKeyed {
    fn song_key(&self) -> &str;
}

impl SongKeyed for Heart {
    fn song_key(&self) -> &str {
        &self.song_id
    }
}

impl SongKeyed for Comment {
    fn song_key(&self) -> &str {
        &self.song_id
    }
}

/// Partition records by song id, keeping their relative order
pub fn group_by_song<T: SongKeyed>(records: Vec<T>) -> HashMap<String, Vec<T>> {
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for record in records {
        groups
            .entry(record.song_key().to_string())
            .or_default()
            .push(record);
    }
    groups
}

/// Whether a user currently likes a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartState {
    Unliked,
    Liked,
}

/// Result of an unlike; both variants leave the pair `Unliked`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlikeOutcome {
    Removed(Heart),
    /// There was no heart to remove
    NoOp,
}

impl UnlikeOutcome {
    pub fn state(&self) -> HeartState {
        HeartState::Unliked
    }

    pub fn removed(&self) -> Option<&Heart> {
        match self {
            UnlikeOutcome::Removed(heart) => Some(heart),
            UnlikeOutcome::NoOp => None,
        }
    }
}

pub struct Aggregator {
    catalog: Arc<dyn CatalogGateway>,
    engagement: Arc<dyn EngagementRepository>,
}

impl Aggregator {
    pub fn new(catalog: Arc<dyn CatalogGateway>, engagement: Arc<dyn EngagementRepository>) -> Self {
        Self {
            catalog,
            engagement,
        }
    }

    /// One song with every heart and comment on it
    pub async fn song(&self, song_id: &str) -> Result<AnnotatedSong> {
        let song_id = required("song id", song_id)?;
        let song = detail(self.catalog.fetch_by_id(song_id).await?)?;

        let ids = HashSet::from([song.id.key()]);
        let (hearts, comments) = futures::try_join!(
            self.engagement.find_hearts_for_songs(&ids, None),
            self.engagement.find_comments_for_songs(&ids),
        )?;

        tracing::debug!(
            "Song {} has {} hearts and {} comments",
            song.id,
            hearts.len(),
            comments.len()
        );
        Ok(AnnotatedSong::new(song, hearts, comments))
    }

    /// An artist's songs, each with other listeners' hearts and all comments.
    ///
    /// The caller's own hearts are left out; clients show those separately.
    pub async fn artist_songs(
        &self,
        artist_id: &str,
        options: &ArtistSongsOptions,
        identity: &Identity,
    ) -> Result<Vec<AnnotatedSong>> {
        let artist_id = required("artist id", artist_id)?;
        let songs = self
            .catalog
            .fetch_by_artist(artist_id, options)
            .await?
            .into_iter()
            .map(detail)
            .collect::<Result<Vec<_>>>()?;

        let ids: HashSet<String> = songs.iter().map(|song| song.id.key()).collect();
        let (hearts, comments) = futures::try_join!(
            self.engagement
                .find_hearts_for_songs(&ids, identity.user_id()),
            self.engagement.find_comments_for_songs(&ids),
        )?;

        let hearts = group_by_song(hearts);
        let comments = group_by_song(comments);

        let annotated: Vec<AnnotatedSong> = songs
            .into_iter()
            .map(|song| {
                let key = song.id.key();
                // A song listed twice gets its engagement both times
                let song_hearts = hearts.get(&key).cloned().unwrap_or_default();
                let song_comments = comments.get(&key).cloned().unwrap_or_default();
                AnnotatedSong::new(song, song_hearts, song_comments)
            })
            .collect();

        tracing::debug!(
            "Annotated {} songs for artist {} (caller: {:?})",
            annotated.len(),
            artist_id,
            identity.user_id()
        );
        Ok(annotated)
    }

    /// Catalog search, summary fields only and no engagement
    pub async fn search(&self, query: &str) -> Result<Vec<SongSummary>> {
        let query = required("search query", query)?;
        let hits = self.catalog.search_by_query(query).await?;

        hits.into_iter()
            .map(|hit| {
                SongSummary::from_projection(normalize(SUMMARY_FIELDS, hit.result.fields()))
                    .ok_or_else(missing_id)
            })
            .collect()
    }

    /// Every heart on one song
    pub async fn song_hearts(&self, song_id: &str) -> Result<Vec<Heart>> {
        let song_id = required("song id", song_id)?;
        let ids = HashSet::from([song_id.to_string()]);
        Ok(self.engagement.find_hearts_for_songs(&ids, None).await?)
    }

    /// Every heart the user has given
    pub async fn user_hearts(&self, user_id: &str) -> Result<Vec<Heart>> {
        let user_id = required("user id", user_id)?;
        Ok(self.engagement.find_hearts_for_user(user_id).await?)
    }

    /// `Unliked -> Liked`; an existing heart is reported as [`SongError::AlreadyLiked`]
    pub async fn like(&self, user_id: &str, song_id: &str) -> Result<Heart> {
        let user_id = required("user id", user_id)?;
        let song_id = required("song id", song_id)?;

        if self.engagement.find_heart(user_id, song_id).await?.is_some() {
            tracing::warn!("User {} already likes song {}", user_id, song_id);
            return Err(already_liked(song_id));
        }

        match self.engagement.create_heart(user_id, song_id).await {
            Ok(heart) => {
                tracing::info!("User {} liked song {}", user_id, song_id);
                Ok(heart)
            }
            // Lost a race with a concurrent like for the same pair
            Err(EngagementError::AlreadyExists { .. }) => Err(already_liked(song_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// `Liked -> Unliked`; unliking an unliked song is a no-op
    pub async fn unlike(&self, user_id: &str, song_id: &str) -> Result<UnlikeOutcome> {
        let user_id = required("user id", user_id)?;
        let song_id = required("song id", song_id)?;

        match self.engagement.delete_heart(user_id, song_id).await? {
            Some(heart) => {
                tracing::info!("User {} unliked song {}", user_id, song_id);
                Ok(UnlikeOutcome::Removed(heart))
            }
            None => {
                tracing::debug!("User {} had no heart on song {}", user_id, song_id);
                Ok(UnlikeOutcome::NoOp)
            }
        }
    }

    pub async fn heart_state(&self, user_id: &str, song_id: &str) -> Result<HeartState> {
        let user_id = required("user id", user_id)?;
        let song_id = required("song id", song_id)?;

        Ok(match self.engagement.find_heart(user_id, song_id).await? {
            Some(_) => HeartState::Liked,
            None => HeartState::Unliked,
        })
    }

    /// Add a comment; the body is trimmed and must not be empty
    pub async fn comment(&self, user_id: &str, song_id: &str, body: &str) -> Result<Comment> {
        let user_id = required("user id", user_id)?;
        let song_id = required("song id", song_id)?;
        let body = required("comment body", body)?;
        if body.chars().count() > MAX_COMMENT_LEN {
            return Err(SongError::InvalidInput(format!(
                "comment body is longer than {} characters",
                MAX_COMMENT_LEN
            )));
        }

        Ok(self.engagement.create_comment(user_id, song_id, body).await?)
    }
}

fn detail(song: CatalogSong) -> Result<SongDetail> {
    SongDetail::from_projection(normalize(DETAIL_FIELDS, song.fields())).ok_or_else(missing_id)
}

fn missing_id() -> SongError {
    SongError::ExternalLookupFailed("catalog returned a song without an id".to_string())
}

fn already_liked(song_id: &str) -> SongError {
    SongError::AlreadyLiked {
        song_id: song_id.to_string(),
    }
}

fn required<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SongError::InvalidInput(format!("{} is required", what)));
    }
    Ok(value)
}
