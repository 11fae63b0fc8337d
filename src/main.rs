use anyhow::{Context, Result};
use clap::Parser;
use genius_rs::{DEFAULT_BASE_URL, GeniusConfig};
use song_station::aggregator::Aggregator;
use song_station::catalog::GeniusCatalog;
use song_station::engagement::SqliteEngagementStore;
use song_station::identity::IdentityResolver;
use song_station::server;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "song-station")]
#[command(about = "Song Station Server", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Path to the hearts and comments database
    #[arg(short, long, env = "SONG_STATION_DB", default_value = "data/engagement.db")]
    database: PathBuf,

    /// Genius API client access token
    #[arg(long, env = "GENIUS_ACCESS_TOKEN")]
    catalog_token: String,

    /// Genius API root
    #[arg(long, env = "GENIUS_API_URL", default_value = DEFAULT_BASE_URL)]
    catalog_url: String,

    /// Timeout for a single catalog request, in seconds
    #[arg(long, default_value = "10")]
    catalog_timeout_secs: u64,

    /// Secret used to verify access tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default info level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    if cli.secret_key.is_empty() {
        anyhow::bail!("Secret key must not be empty");
    }

    tracing::info!("Starting Song Station");
    tracing::info!("Engagement database: {}", cli.database.display());
    tracing::info!("Catalog: {}", cli.catalog_url);

    let store = SqliteEngagementStore::new(&cli.database)
        .await
        .context("Failed to open engagement database")?;

    let catalog = GeniusCatalog::new(
        GeniusConfig::new(cli.catalog_token)
            .with_base_url(cli.catalog_url)
            .with_timeout(Duration::from_secs(cli.catalog_timeout_secs)),
    )
    .context("Failed to initialize catalog gateway")?;

    let aggregator = Aggregator::new(Arc::new(catalog), Arc::new(store));
    let identity = IdentityResolver::new(cli.secret_key.as_bytes());

    let app = server::create_router(aggregator, identity);
    let addr = format!("0.0.0.0:{}", cli.port);

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /song/id/:id           - Song with hearts and comments");
    tracing::info!("  GET  /song/artist-songs/:id - Artist songs with others' hearts");
    tracing::info!("  GET  /song/hearts/:id       - Hearts on a song");
    tracing::info!("  GET  /song/state/:id        - Caller's like state (auth)");
    tracing::info!("  POST /song/search           - Catalog search");
    tracing::info!("  POST /song/like             - Like a song (auth)");
    tracing::info!("  POST /song/unlike           - Unlike a song (auth)");
    tracing::info!("  POST /song/comment          - Comment on a song (auth)");
    tracing::info!("  GET  /me/hearts             - Caller's hearts (auth)");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
