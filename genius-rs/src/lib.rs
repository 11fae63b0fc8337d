//! Client for the Genius song catalog.
//!
//! Only the three lookups the song station needs are covered: a song by id,
//! an artist's songs, and free-text search. Song records are returned as
//! open JSON objects so callers decide which fields they keep.

pub mod api;
pub mod error;
pub mod models;

pub use api::{GeniusApi, GeniusConfig, DEFAULT_BASE_URL};
pub use error::{GeniusError, Result};
pub use models::*;
