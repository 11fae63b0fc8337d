use clap::{Parser, ValueEnum};
use genius_rs::{ArtistSongsOptions, CatalogSong, GeniusApi, GeniusConfig, SongSort, DEFAULT_BASE_URL};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Genius Catalog Lookup
///
/// Search songs, show one song, or list an artist's songs from the Genius catalog.
#[derive(Parser, Debug)]
#[command(name = "catalog_search")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Client access token (can also be set via GENIUS_ACCESS_TOKEN env var)
    #[arg(short, long, env = "GENIUS_ACCESS_TOKEN", value_name = "TOKEN")]
    token: String,

    /// API root
    #[arg(long, env = "GENIUS_API_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Free-text search query
    #[arg(short, long, value_name = "QUERY", conflicts_with_all = ["song", "artist"])]
    query: Option<String>,

    /// Show a single song by id
    #[arg(short, long, value_name = "SONG_ID", conflicts_with = "artist")]
    song: Option<String>,

    /// List songs of an artist by id
    #[arg(short, long, value_name = "ARTIST_ID")]
    artist: Option<String>,

    /// Sort order for artist listings
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Page size for artist listings
    #[arg(long)]
    per_page: Option<u32>,

    /// Page number for artist listings
    #[arg(long)]
    page: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Popularity,
}

impl From<SortArg> for SongSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => SongSort::Title,
            SortArg::Popularity => SongSort::Popularity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG controls verbosity, warnings and errors only by default
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let api = GeniusApi::new(GeniusConfig::new(args.token).with_base_url(args.base_url))?;

    if let Some(song_id) = args.song {
        let song = api.get_song(&song_id).await?;
        println!("{}", serde_json::to_string_pretty(&song)?);
        return Ok(());
    }

    if let Some(artist_id) = args.artist {
        let options = ArtistSongsOptions {
            sort: args.sort.map(SongSort::from),
            per_page: args.per_page,
            page: args.page,
        };
        let listing = api.get_artist_songs(&artist_id, &options).await?;
        print_songs(listing.songs.iter());
        if let Some(next) = listing.next_page {
            println!("\nMore songs available, use --page {}", next);
        }
        return Ok(());
    }

    let query = match args.query {
        Some(q) => q,
        None => {
            print!("Enter song name or artist to search: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    if query.is_empty() {
        eprintln!("Search query cannot be empty. Exiting.");
        return Ok(());
    }

    println!("\nSearching for '{}'...\n", query);
    let hits = api.search(&query).await?;

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    print_songs(hits.iter().map(|hit| &hit.result));
    Ok(())
}

fn print_songs<'a>(songs: impl Iterator<Item = &'a CatalogSong>) {
    println!("{:<4} {:<10} {:<40} {:<30}", "No.", "Id", "Song", "Artist");
    println!("{}", "-".repeat(86));

    for (idx, song) in songs.enumerate() {
        let id = song.id().map(|v| v.to_string()).unwrap_or_default();
        let title = song
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");
        let artist = song
            .get("primary_artist")
            .and_then(|a| a.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");

        println!(
            "{:<4} {:<10} {:<40} {:<30}",
            idx + 1,
            id,
            truncate(title, 38),
            truncate(artist, 28)
        );
    }
}

/// Truncate by character count so multi-byte titles stay valid UTF-8
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let truncated: String = text.chars().take(max - 3).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
