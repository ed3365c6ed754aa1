use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

mod auth;
mod catalog;
mod client;
mod config;
mod locator;
mod models;
mod ordering;
mod reorder;

use crate::client::SpotifyClient;
use crate::config::load_config;
use crate::locator::parse_playlist_locator;
use crate::ordering::{EvaluationMode, Feature, FeatureSchema, TrackOrderer};
use crate::reorder::{DEFAULT_NAME_SUFFIX, PlaylistReorderer};

#[derive(Parser)]
#[command(name = "playlist-flow")]
#[command(about = "Reorder a Spotify playlist so that neighbouring tracks sound alike")]
#[command(version)]
struct Args {
    /// Playlist share URL, spotify:playlist URI or playlist id
    playlist: String,

    /// Print the computed order instead of creating the new playlist
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,

    /// Quiet mode - only report warnings and errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Evaluate starting tracks in parallel
    #[arg(short = 'p', long = "parallel")]
    parallel: bool,

    /// Text appended to the source playlist's name
    #[arg(short = 's', long = "suffix", default_value = DEFAULT_NAME_SUFFIX)]
    suffix: String,

    /// Comma-separated audio features to compare (default: all)
    #[arg(short = 'f', long = "features", value_delimiter = ',')]
    features: Vec<Feature>,
}

fn init_logging(quiet: bool) {
    let level = if quiet { LevelFilter::Warn } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let playlist_id = parse_playlist_locator(&args.playlist)?;
    debug!("Resolved playlist id {playlist_id}");

    // Load configuration from .env
    let config = load_config()?;

    println!("Connecting to Spotify...");
    let client = match SpotifyClient::connect(config) {
        Ok(client) => {
            println!("✓ Authenticated");
            client
        }
        Err(e) => {
            eprintln!("✗ Could not authenticate: {e:#}");
            return Err(e);
        }
    };

    let mode = if args.parallel {
        EvaluationMode::Parallel
    } else {
        EvaluationMode::Sequential
    };
    let schema = if args.features.is_empty() {
        FeatureSchema::default()
    } else {
        FeatureSchema::new(args.features)?
    };
    let orderer = TrackOrderer::new(schema, mode);
    let reorderer = PlaylistReorderer::new(client, orderer).with_name_suffix(args.suffix);

    println!("\nFetching tracks and audio features...");
    let ordering = reorderer.generate_track_ordering(&playlist_id)?;

    println!(
        "Ordered {} tracks from '{}' (path length {:.3})",
        ordering.tracks.len(),
        ordering.details.name,
        ordering.path_length
    );
    if ordering.skipped > 0 {
        println!(
            "Skipped {} tracks without a catalog id (local files or unavailable)",
            ordering.skipped
        );
    }

    if args.dry_run {
        println!("\n🔍 DRY RUN: new order (nothing uploaded)");
        for (i, track) in ordering.tracks.iter().enumerate() {
            println!("  {:>3}. {} ({})", i + 1, track.name, track.id);
        }
        return Ok(());
    }

    let new_name = reorderer.copy_name(&ordering.details);
    println!("\n🎵 Creating playlist '{new_name}'...");
    match reorderer.upload(&ordering.details, &ordering.track_ids()) {
        Ok(playlist_id) => {
            println!(
                "✓ Created '{}' with {} tracks (ID: {})",
                new_name,
                ordering.tracks.len(),
                playlist_id
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Failed to create '{new_name}': {e:#}");
            Err(e)
        }
    }
}
