use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::CookieJar;
use genius_rs::ArtistSongsOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::aggregator::{Aggregator, HeartState};
use crate::engagement::{Comment, Heart};
use crate::error::SongError;
use crate::identity::{ACCESS_TOKEN_COOKIE, IdentityResolver};
use crate::song::{AnnotatedSong, SongSummary};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub identity: IdentityResolver,
}

pub fn create_router(aggregator: Aggregator, identity: IdentityResolver) -> Router {
    let state = AppState {
        aggregator: Arc::new(aggregator),
        identity,
    };

    Router::new()
        .route("/", get(root))
        .route("/song/id/:id", get(get_song))
        .route("/song/artist-songs/:id", get(get_artist_songs))
        .route("/song/hearts/:id", get(get_song_hearts))
        .route("/song/state/:id", get(get_heart_state))
        .route("/song/search", post(search_songs))
        .route("/song/like", post(like_song))
        .route("/song/unlike", post(unlike_song))
        .route("/song/comment", post(add_comment))
        .route("/me/hearts", get(get_my_hearts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Access token from the cookie, falling back to `Authorization: Bearer`
fn credential(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|token| token.to_string())
        })
}

/// Root endpoint
async fn root() -> &'static str {
    "Song Station API v0.1.0"
}

/// Get a song with all its hearts and comments
async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnnotatedSong>, SongError> {
    tracing::debug!("Fetching song with id: {}", id);
    let song = state.aggregator.song(&id).await?;
    tracing::debug!("Song {} found", id);
    Ok(Json(song))
}

/// Get an artist's songs, leaving out the caller's own hearts
async fn get_artist_songs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Query(options), _): WithRejection<Query<ArtistSongsOptions>, SongError>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<Vec<AnnotatedSong>>, SongError> {
    let identity = state
        .identity
        .resolve(credential(&jar, &headers).as_deref());
    tracing::debug!(
        "Fetching songs for artist {} (caller: {:?})",
        id,
        identity.user_id()
    );

    let songs = state
        .aggregator
        .artist_songs(&id, &options, &identity)
        .await?;
    tracing::debug!("Returning {} songs for artist {}", songs.len(), id);
    Ok(Json(songs))
}

/// Get every heart on a song
async fn get_song_hearts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Heart>>, SongError> {
    tracing::debug!("Fetching hearts for song: {}", id);
    let hearts = state.aggregator.song_hearts(&id).await?;
    tracing::debug!("Returning {} hearts for song {}", hearts.len(), id);
    Ok(Json(hearts))
}

#[derive(Debug, Serialize)]
struct HeartStateResponse {
    state: HeartState,
}

/// Whether the caller likes a song
async fn get_heart_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<HeartStateResponse>, SongError> {
    let user_id = state
        .identity
        .require(credential(&jar, &headers).as_deref())?;
    let heart_state = state.aggregator.heart_state(&user_id, &id).await?;
    Ok(Json(HeartStateResponse { state: heart_state }))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    q: String,
}

/// Search the catalog
async fn search_songs(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<SearchRequest>, SongError>,
) -> Result<Json<Vec<SongSummary>>, SongError> {
    tracing::debug!("Searching songs: query='{}'", request.q);
    let results = state.aggregator.search(&request.q).await?;
    tracing::debug!("Found {} search results", results.len());
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartRequest {
    song_id: String,
}

/// Like a song as the authenticated caller
async fn like_song(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    WithRejection(Json(request), _): WithRejection<Json<HeartRequest>, SongError>,
) -> Result<Json<Heart>, SongError> {
    let user_id = state
        .identity
        .require(credential(&jar, &headers).as_deref())?;
    tracing::debug!("User {} liking song {}", user_id, request.song_id);

    let heart = state.aggregator.like(&user_id, &request.song_id).await?;
    Ok(Json(heart))
}

#[derive(Debug, Serialize)]
struct UnlikeResponse {
    state: HeartState,
    /// The removed heart, `null` when there was nothing to remove
    heart: Option<Heart>,
}

/// Unlike a song as the authenticated caller
async fn unlike_song(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    WithRejection(Json(request), _): WithRejection<Json<HeartRequest>, SongError>,
) -> Result<Json<UnlikeResponse>, SongError> {
    let user_id = state
        .identity
        .require(credential(&jar, &headers).as_deref())?;
    tracing::debug!("User {} unliking song {}", user_id, request.song_id);

    let outcome = state.aggregator.unlike(&user_id, &request.song_id).await?;
    Ok(Json(UnlikeResponse {
        state: outcome.state(),
        heart: outcome.removed().cloned(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest {
    song_id: String,
    body: String,
}

/// Comment on a song as the authenticated caller
async fn add_comment(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    WithRejection(Json(request), _): WithRejection<Json<CommentRequest>, SongError>,
) -> Result<Json<Comment>, SongError> {
    let user_id = state
        .identity
        .require(credential(&jar, &headers).as_deref())?;
    tracing::debug!("User {} commenting on song {}", user_id, request.song_id);

    let comment = state
        .aggregator
        .comment(&user_id, &request.song_id, &request.body)
        .await?;
    Ok(Json(comment))
}

/// The caller's own hearts
async fn get_my_hearts(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<Vec<Heart>>, SongError> {
    let user_id = state
        .identity
        .require(credential(&jar, &headers).as_deref())?;
    let hearts = state.aggregator.user_hearts(&user_id).await?;
    tracing::debug!("Returning {} hearts for user {}", hearts.len(), user_id);
    Ok(Json(hearts))
}
