//! # Encore - Listening-Driven Recommendations
//!
//! Command-line front end. Every invocation opens the database, loads the
//! stored preference profiles, runs one command, and writes the profiles back
//! if the command changed them.
//!
//! ## Usage
//!
//! ```bash
//! # Create the database and load a catalog
//! encore init-db
//! encore import catalog.json
//!
//! # Teach it
//! encore play alice s1 --times 3
//! encore dislike alice s7
//!
//! # Ask it
//! encore top-genres alice
//! encore recommend alice artists-by-genre-overlap --limit 5
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use encore::catalog::{Catalog, CatalogItem};
use encore::cli::{self, Command};
use encore::completion;
use encore::config::RuntimeConfig;
use encore::db::{self, CatalogImport, Database};
use encore::recommend::{RecommendationKind, ScoredCandidate};
use encore::recorder::Feedback;
use encore::service::MusicRecommender;
use encore::snapshot::SnapshotScope;
use encore::store::PreferenceStore;
use log::{debug, info};
use std::path::PathBuf;

/// Main entry point for the Encore application.
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug encore recommend alice songs-by-genre`
/// - `RUST_LOG=encore::recommend=trace encore ...` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    // Commands that never touch the database
    if let Command::Completion { shell } = &args.command {
        let mut cmd = cli::Args::command();
        completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        return Ok(());
    }

    let config = RuntimeConfig::load()?.override_db_path(args.db.as_deref())?;
    debug!("Using database at {}", config.db_path.display());

    if let Command::InitDb { force } = args.command {
        db::init_database(&config.db_path, force)?;
        println!("Created database at {}", config.db_path.display());
        return Ok(());
    }

    let database = Database::open(&config.db_path)?;
    let store = PreferenceStore::new();
    store.replace_profiles(
        database
            .load_profiles()
            .context("Failed to load stored preference profiles")?,
    );
    let recommender = MusicRecommender::with_store(database, store);

    if run(&recommender, &config, args.command)? {
        let profiles = recommender.store().all_profiles();
        recommender
            .catalog()
            .save_profiles(&profiles)
            .context("Failed to save preference profiles")?;
        debug!("Saved {} profile(s)", profiles.len());
    }

    Ok(())
}

/// Execute one command. Returns whether preference profiles changed.
fn run(recommender: &MusicRecommender<Database>, config: &RuntimeConfig, command: Command) -> Result<bool> {
    match command {
        Command::InitDb { .. } | Command::Completion { .. } => {
            bail!("init-db and completion run without an open database")
        }
        Command::Import { path } => {
            info!("Importing catalog from {}", path.display());
            let import = CatalogImport::from_json_file(&path)?;
            let summary = recommender.catalog().import_catalog(&import)?;
            println!(
                "Imported {} artist(s), {} album(s), {} song(s)",
                summary.artists, summary.albums, summary.songs
            );
            Ok(false)
        }
        Command::List => {
            for song in recommender.catalog().list_all_songs()? {
                println!(
                    "{:<12} {:<12} {:<12} {}",
                    song.id,
                    song.artist_id().unwrap_or("-"),
                    song.genre().unwrap_or("-"),
                    song.title
                );
            }
            Ok(false)
        }
        Command::Play { user, song, times } => {
            for _ in 0..times {
                recommender.record_play(&user, &song);
            }
            let plays = recommender.profile(&user).play_counts().get(&song).unwrap_or(0);
            println!("{user} has played {song} {plays} time(s)");
            Ok(true)
        }
        Command::Like { user, song } => {
            recommender.record_feedback(&user, &song, Feedback::Like);
            Ok(true)
        }
        Command::Dislike { user, song } => {
            recommender.record_feedback(&user, &song, Feedback::Dislike);
            Ok(true)
        }
        Command::AdjustGenre { user, genre, delta } => {
            recommender.adjust_genre_preference(&user, &genre, delta);
            Ok(true)
        }
        Command::AdjustArtist { user, artist, delta } => {
            recommender.adjust_artist_preference(&user, &artist, delta);
            Ok(true)
        }
        Command::TopGenres { user, json } => {
            print_ranking(&recommender.top_genres(&user), json)?;
            Ok(false)
        }
        Command::TopArtists { user, json } => {
            print_ranking(&recommender.top_artists(&user), json)?;
            Ok(false)
        }
        Command::Profile { user } => {
            let profile = recommender.profile(&user);
            println!("Genres:");
            for (genre, score) in profile.genre_scores().iter() {
                println!("  {genre:<20} {score:>6}");
            }
            println!("Artists:");
            for (artist, score) in profile.artist_scores().iter() {
                println!("  {artist:<20} {score:>6}");
            }
            println!("Plays:");
            for (song, count) in profile.play_counts().iter() {
                println!("  {song:<20} {count:>6}");
            }
            Ok(false)
        }
        Command::Recommend { user, kind, limit, json } => {
            let kind = RecommendationKind::from(kind);
            let results = recommender.recommend(&user, kind, limit.unwrap_or(config.default_limit));
            print_recommendations(kind, &results, json)?;
            Ok(false)
        }
        Command::Export { path, user } => {
            let path = snapshot_path(path, config)?;
            let scope = user.map_or(SnapshotScope::All, SnapshotScope::User);
            recommender
                .save_snapshot_file(&scope, &path)
                .with_context(|| format!("Failed to export profiles to {}", path.display()))?;
            println!("Exported profiles to {}", path.display());
            Ok(false)
        }
        Command::ImportProfiles { path } => {
            let path = snapshot_path(path, config)?;
            let count = recommender
                .load_snapshot_file(&path)
                .with_context(|| format!("Failed to import profiles from {}", path.display()))?;
            println!("Restored {count} profile(s)");
            Ok(count > 0)
        }
        Command::CompleteSongs => {
            completion::print_song_completions(recommender.catalog());
            Ok(false)
        }
    }
}

fn snapshot_path(explicit: Option<PathBuf>, config: &RuntimeConfig) -> Result<PathBuf> {
    match explicit.or_else(|| config.snapshot_path.clone()) {
        Some(path) => Ok(path),
        None => bail!("No snapshot path given and none configured (set `snapshot_path` in config.json)"),
    }
}

fn print_ranking(ranking: &[(String, i64)], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(ranking)?);
        return Ok(());
    }
    if ranking.is_empty() {
        println!("Nothing recorded yet.");
    }
    for (i, (name, score)) in ranking.iter().enumerate() {
        println!("{:>3}. {name:<24} {score:>6}", i + 1);
    }
    Ok(())
}

fn print_recommendations(kind: RecommendationKind, results: &[ScoredCandidate], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No recommendations available yet, keep listening.");
        return Ok(());
    }
    println!("{kind}:");
    for (i, candidate) in results.iter().enumerate() {
        let kind_label = match &candidate.item {
            CatalogItem::Song(_) => "song",
            CatalogItem::Album(_) => "album",
            CatalogItem::Artist(_) => "artist",
        };
        println!(
            "{:>3}. [{kind_label}] {} ({}) score {}",
            i + 1,
            candidate.item.label(),
            candidate.item.id(),
            candidate.score
        );
    }
    Ok(())
}
