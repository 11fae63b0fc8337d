//! Hearts and comments, stored locally in SQLite.
//!
//! Both are keyed by the catalog's song id as a string and are never
//! checked against the catalog.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// A like: one user, one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heart {
    pub id: String,
    pub user_id: String,
    pub song_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub song_id: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Error, Debug)]
pub enum EngagementError {
    #[error("User {user_id} already has a heart on song {song_id}")]
    AlreadyExists { user_id: String, song_id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, EngagementError>;

/// Storage for hearts and comments.
///
/// Multi-song lookups take the whole id set and must answer with a single
/// query. Results come back in insertion order.
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Hearts on any of `song_ids`, skipping those owned by `exclude_user_id`
    async fn find_hearts_for_songs(
        &self,
        song_ids: &HashSet<String>,
        exclude_user_id: Option<&str>,
    ) -> Result<Vec<Heart>>;

    async fn find_comments_for_songs(&self, song_ids: &HashSet<String>) -> Result<Vec<Comment>>;

    async fn find_heart(&self, user_id: &str, song_id: &str) -> Result<Option<Heart>>;

    /// Fails with [`EngagementError::AlreadyExists`] if the pair already has a heart
    async fn create_heart(&self, user_id: &str, song_id: &str) -> Result<Heart>;

    /// Returns the removed heart, or `None` if there was nothing to remove
    async fn delete_heart(&self, user_id: &str, song_id: &str) -> Result<Option<Heart>>;

    async fn find_hearts_for_user(&self, user_id: &str) -> Result<Vec<Heart>>;

    async fn create_comment(&self, user_id: &str, song_id: &str, body: &str) -> Result<Comment>;
}

type HeartRow = (String, String, String, String);
type CommentRow = (String, String, String, String, String);

fn heart_from_row((id, user_id, song_id, created_at): HeartRow) -> Heart {
    Heart {
        id,
        user_id,
        song_id,
        created_at,
    }
}

fn comment_from_row((id, user_id, song_id, body, created_at): CommentRow) -> Comment {
    Comment {
        id,
        user_id,
        song_id,
        body,
        created_at,
    }
}

/// SQLite-backed engagement storage
#[derive(Debug, Clone)]
pub struct SqliteEngagementStore {
    pool: SqlitePool,
}

impl SqliteEngagementStore {
    /// Open (or create) the engagement database
    pub async fn new<P: AsRef<Path>>(db_path: P) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let connection_string = format!("sqlite:{}", db_path.display());
        tracing::debug!("Connecting to engagement database: {}", connection_string);

        let options = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to engagement database at: {}",
                    db_path.display()
                )
            })?;

        let store = Self { pool };
        store.initialize().await?;

        tracing::info!("Engagement database initialized: {}", db_path.display());
        Ok(store)
    }

    /// Initialize database schema
    async fn initialize(&self) -> anyhow::Result<()> {
        // One heart per (user, song) is enforced here so that racing likes
        // cannot both insert.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hearts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                song_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, song_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create hearts table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                song_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create comments table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hearts_song_id ON hearts(song_id)")
            .execute(&self.pool)
            .await
            .context("Failed to create hearts index")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_song_id ON comments(song_id)")
            .execute(&self.pool)
            .await
            .context("Failed to create comments index")?;

        Ok(())
    }
}

/// Append `(?, ?, ...)` binding every id
fn push_id_set(builder: &mut QueryBuilder<'_, Sqlite>, song_ids: &HashSet<String>) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for song_id in song_ids {
        separated.push_bind(song_id.clone());
    }
    separated.push_unseparated(")");
}

#[async_trait]
impl EngagementRepository for SqliteEngagementStore {
    async fn find_hearts_for_songs(
        &self,
        song_ids: &HashSet<String>,
        exclude_user_id: Option<&str>,
    ) -> Result<Vec<Heart>> {
        if song_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, user_id, song_id, created_at FROM hearts WHERE song_id IN ",
        );
        push_id_set(&mut builder, song_ids);
        if let Some(user_id) = exclude_user_id {
            builder.push(" AND user_id != ").push_bind(user_id.to_string());
        }
        builder.push(" ORDER BY rowid");

        let rows = builder
            .build_query_as::<HeartRow>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            "Found {} hearts for {} songs (excluding user: {:?})",
            rows.len(),
            song_ids.len(),
            exclude_user_id
        );
        Ok(rows.into_iter().map(heart_from_row).collect())
    }

    async fn find_comments_for_songs(&self, song_ids: &HashSet<String>) -> Result<Vec<Comment>> {
        if song_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, user_id, song_id, body, created_at FROM comments WHERE song_id IN ",
        );
        push_id_set(&mut builder, song_ids);
        builder.push(" ORDER BY rowid");

        let rows = builder
            .build_query_as::<CommentRow>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Found {} comments for {} songs", rows.len(), song_ids.len());
        Ok(rows.into_iter().map(comment_from_row).collect())
    }

    async fn find_heart(&self, user_id: &str, song_id: &str) -> Result<Option<Heart>> {
        let row = sqlx::query_as::<_, HeartRow>(
            r#"
            SELECT id, user_id, song_id, created_at
            FROM hearts
            WHERE user_id = ? AND song_id = ?
            "#,
        )
        .bind(user_id)
        .bind(song_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(heart_from_row))
    }

    async fn create_heart(&self, user_id: &str, song_id: &str) -> Result<Heart> {
        let heart = Heart {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            song_id: song_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO hearts (id, user_id, song_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&heart.id)
        .bind(&heart.user_id)
        .bind(&heart.song_id)
        .bind(&heart.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!("Created heart {} for user {} on song {}", heart.id, user_id, song_id);
                Ok(heart)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(EngagementError::AlreadyExists {
                    user_id: user_id.to_string(),
                    song_id: song_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_heart(&self, user_id: &str, song_id: &str) -> Result<Option<Heart>> {
        let row = sqlx::query_as::<_, HeartRow>(
            r#"
            DELETE FROM hearts
            WHERE user_id = ? AND song_id = ?
            RETURNING id, user_id, song_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(song_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(heart_from_row))
    }

    async fn find_hearts_for_user(&self, user_id: &str) -> Result<Vec<Heart>> {
        let rows = sqlx::query_as::<_, HeartRow>(
            r#"
            SELECT id, user_id, song_id, created_at
            FROM hearts
            WHERE user_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(heart_from_row).collect())
    }

    async fn create_comment(&self, user_id: &str, song_id: &str, body: &str) -> Result<Comment> {
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            song_id: song_id.to_string(),
            body: body.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO comments (id, user_id, song_id, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.user_id)
        .bind(&comment.song_id)
        .bind(&comment.body)
        .bind(&comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteEngagementStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEngagementStore::new(dir.path().join("engagement.db"))
            .await
            .unwrap();
        (dir, store)
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_find_heart() {
        let (_dir, store) = store().await;

        assert!(store.find_heart("u1", "A").await.unwrap().is_none());
        let heart = store.create_heart("u1", "A").await.unwrap();
        assert_eq!(heart.user_id, "u1");
        assert_eq!(heart.song_id, "A");

        let found = store.find_heart("u1", "A").await.unwrap();
        assert_eq!(found, Some(heart));
    }

    #[tokio::test]
    async fn test_duplicate_heart_is_rejected() {
        let (_dir, store) = store().await;

        store.create_heart("u1", "A").await.unwrap();
        let second = store.create_heart("u1", "A").await;
        assert!(matches!(second, Err(EngagementError::AlreadyExists { .. })));

        let hearts = store.find_hearts_for_songs(&ids(&["A"]), None).await.unwrap();
        assert_eq!(hearts.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_likes_insert_once() {
        let (_dir, store) = store().await;

        let attempts = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.create_heart("u1", "A").await })
        });
        let results = futures::future::join_all(attempts).await;

        let created = results
            .into_iter()
            .map(|joined| joined.unwrap())
            .filter(|result| result.is_ok())
            .count();
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_delete_heart_is_idempotent() {
        let (_dir, store) = store().await;

        let heart = store.create_heart("u1", "A").await.unwrap();
        assert_eq!(store.delete_heart("u1", "A").await.unwrap(), Some(heart));
        assert_eq!(store.delete_heart("u1", "A").await.unwrap(), None);
        assert!(store.find_heart("u1", "A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_hearts_for_songs_filters_and_excludes() {
        let (_dir, store) = store().await;

        store.create_heart("u1", "A").await.unwrap();
        store.create_heart("u2", "A").await.unwrap();
        store.create_heart("u2", "B").await.unwrap();
        store.create_heart("u3", "C").await.unwrap();

        let all = store
            .find_hearts_for_songs(&ids(&["A", "B"]), None)
            .await
            .unwrap();
        let pairs: Vec<(&str, &str)> = all
            .iter()
            .map(|h| (h.user_id.as_str(), h.song_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("u1", "A"), ("u2", "A"), ("u2", "B")]);

        let others = store
            .find_hearts_for_songs(&ids(&["A", "B"]), Some("u2"))
            .await
            .unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_empty_id_set_returns_nothing() {
        let (_dir, store) = store().await;
        store.create_heart("u1", "A").await.unwrap();
        store.create_comment("u1", "A", "nice").await.unwrap();

        assert!(store.find_hearts_for_songs(&HashSet::new(), None).await.unwrap().is_empty());
        assert!(store.find_comments_for_songs(&HashSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comments_keep_insertion_order() {
        let (_dir, store) = store().await;

        store.create_comment("u1", "A", "first").await.unwrap();
        store.create_comment("u1", "A", "second").await.unwrap();
        store.create_comment("u2", "B", "other song").await.unwrap();
        store.create_comment("u2", "Z", "not asked for").await.unwrap();

        let comments = store
            .find_comments_for_songs(&ids(&["A", "B"]))
            .await
            .unwrap();
        let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "other song"]);
    }

    #[tokio::test]
    async fn test_find_hearts_for_user() {
        let (_dir, store) = store().await;

        store.create_heart("u1", "A").await.unwrap();
        store.create_heart("u2", "A").await.unwrap();
        store.create_heart("u1", "B").await.unwrap();

        let hearts = store.find_hearts_for_user("u1").await.unwrap();
        let songs: Vec<&str> = hearts.iter().map(|h| h.song_id.as_str()).collect();
        assert_eq!(songs, vec!["A", "B"]);
    }

    #[test]
    fn test_heart_serializes_camel_case() {
        let heart = Heart {
            id: "h1".into(),
            user_id: "u1".into(),
            song_id: "A".into(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
        };
        let value = serde_json::to_value(&heart).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["songId"], "A");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00+00:00");
    }
}
