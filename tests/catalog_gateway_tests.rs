use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use genius_rs::{ArtistSongsOptions, GeniusConfig, SongSort};
use serde_json::json;
use song_station::catalog::{CatalogGateway, GeniusCatalog};
use song_station::error::SongError;
use std::collections::HashMap;

const TOKEN: &str = "test-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", TOKEN).as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"meta": {"status": 401, "message": "invalid_token"}})),
    )
        .into_response()
}

async fn song(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match id.as_str() {
        "404" => (
            StatusCode::NOT_FOUND,
            Json(json!({"meta": {"status": 404, "message": "Not found"}})),
        )
            .into_response(),
        "meta-404" => Json(json!({"meta": {"status": 404}})).into_response(),
        "500" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        "garbage" => "this is not json".into_response(),
        _ => Json(json!({
            "meta": {"status": 200},
            "response": {
                "song": {
                    "id": id.parse::<u64>().unwrap_or(0),
                    "title": "Song",
                    "full_title": "Song by Artist",
                    "primary_artist": {"id": 5, "name": "Artist"},
                    "stats": {"pageviews": 1000}
                }
            }
        }))
        .into_response(),
    }
}

async fn artist_songs(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id == "404" {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut echoed: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    echoed.sort();

    Json(json!({
        "meta": {"status": 200},
        "response": {
            "songs": [
                {"id": 1, "title": echoed.join("&")},
                {"id": 2, "title": "Second"}
            ],
            "next_page": 2
        }
    }))
    .into_response()
}

async fn search(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let q = params.get("q").cloned().unwrap_or_default();
    Json(json!({
        "meta": {"status": 200},
        "response": {
            "hits": [{
                "highlights": [],
                "index": "song",
                "type": "song",
                "result": {"id": 1, "title": q, "extra": "x"}
            }]
        }
    }))
    .into_response()
}

/// Serve a fake catalog on an ephemeral port and return its base URL
async fn spawn_catalog() -> String {
    let app = Router::new()
        .route("/songs/:id", get(song))
        .route("/artists/:id/songs", get(artist_songs))
        .route("/search", get(search));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn gateway(base_url: &str, token: &str) -> GeniusCatalog {
    GeniusCatalog::new(GeniusConfig::new(token).with_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn test_fetch_by_id_returns_raw_record() {
    let base_url = spawn_catalog().await;
    let catalog = gateway(&base_url, TOKEN);

    let song = catalog.fetch_by_id("42").await.unwrap();
    assert_eq!(song.id(), Some(&json!(42)));
    assert_eq!(song.get("full_title"), Some(&json!("Song by Artist")));
    // Unprojected fields are still there at this layer
    assert!(song.get("stats").is_some());
}

#[tokio::test]
async fn test_not_found_is_distinct_from_lookup_failure() {
    let base_url = spawn_catalog().await;
    let catalog = gateway(&base_url, TOKEN);

    assert!(matches!(
        catalog.fetch_by_id("404").await,
        Err(SongError::NotFound(_))
    ));
    assert!(matches!(
        catalog.fetch_by_id("meta-404").await,
        Err(SongError::NotFound(_))
    ));
    assert!(matches!(
        catalog
            .fetch_by_artist("404", &ArtistSongsOptions::default())
            .await,
        Err(SongError::NotFound(_))
    ));
    assert!(matches!(
        catalog.fetch_by_id("500").await,
        Err(SongError::ExternalLookupFailed(_))
    ));
    assert!(matches!(
        catalog.fetch_by_id("garbage").await,
        Err(SongError::ExternalLookupFailed(_))
    ));
}

#[tokio::test]
async fn test_rejected_token_is_a_lookup_failure() {
    let base_url = spawn_catalog().await;
    let catalog = gateway(&base_url, "wrong-token");

    let err = catalog.fetch_by_id("1").await.unwrap_err();
    assert!(matches!(err, SongError::ExternalLookupFailed(_)));
    assert!(err.to_string().contains("invalid_token"));
}

#[tokio::test]
async fn test_unreachable_catalog_is_a_lookup_failure() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let catalog = gateway(&format!("http://{}", addr), TOKEN);
    assert!(matches!(
        catalog.search_by_query("love").await,
        Err(SongError::ExternalLookupFailed(_))
    ));
}

#[tokio::test]
async fn test_artist_options_are_forwarded() {
    let base_url = spawn_catalog().await;
    let catalog = gateway(&base_url, TOKEN);

    let options = ArtistSongsOptions {
        sort: Some(SongSort::Popularity),
        per_page: Some(2),
        page: None,
    };
    let songs = catalog.fetch_by_artist("16775", &options).await.unwrap();

    assert_eq!(songs.len(), 2);
    assert_eq!(
        songs[0].get("title"),
        Some(&json!("per_page=2&sort=popularity"))
    );
}

#[tokio::test]
async fn test_search_returns_hits_with_embedded_song() {
    let base_url = spawn_catalog().await;
    let catalog = gateway(&base_url, TOKEN);

    let hits = catalog.search_by_query("love").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, "song");
    assert_eq!(hits[0].result.get("title"), Some(&json!("love")));
}

#[tokio::test]
async fn test_blank_input_is_rejected() {
    let base_url = spawn_catalog().await;
    let catalog = gateway(&base_url, TOKEN);

    assert!(matches!(
        catalog.search_by_query("   ").await,
        Err(SongError::InvalidInput(_))
    ));
}
