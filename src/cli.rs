//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `encore` binary.
//!
//! ## Commands
//!
//! - `init-db` / `import` / `list`: set up and inspect the catalog
//! - `play`, `like`, `dislike`, `adjust-genre`, `adjust-artist`: feed the
//!   preference profile
//! - `top-genres`, `top-artists`, `profile`: inspect a profile
//! - `recommend`: ranked suggestions of one kind
//! - `export` / `import-profiles`: snapshot round-trip
//!
//! ## Examples
//!
//! ```bash
//! encore import catalog.json
//! encore play alice song-42
//! encore recommend alice songs-by-genre --limit 5
//! ```

use crate::recommend::RecommendationKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Recommendation kinds as accepted on the command line.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum KindArg {
    /// Unplayed songs in your favourite genres
    SongsByGenre,
    /// Unplayed songs by your favourite artists
    SongsByArtist,
    /// Albums you have not played from, in your favourite genres
    AlbumsByGenre,
    /// Albums you have not played from, by your favourite artists
    AlbumsByArtist,
    /// New artists whose songs overlap your favourite genres
    ArtistsByGenreOverlap,
}

impl From<KindArg> for RecommendationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::SongsByGenre => Self::SongsByGenre,
            KindArg::SongsByArtist => Self::SongsByArtist,
            KindArg::AlbumsByGenre => Self::AlbumsByGenre,
            KindArg::AlbumsByArtist => Self::AlbumsByArtist,
            KindArg::ArtistsByGenreOverlap => Self::ArtistsByGenreOverlap,
        }
    }
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore: music recommendations learned from what you play")]
#[command(version)]
pub struct Args {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "ENCORE_DB", value_hint = clap::ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty database
    InitDb {
        /// Delete and recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Import artists, albums and songs from a JSON file
    ///
    /// The file holds `artists`, `albums` and `songs` arrays. Existing ids are
    /// updated in place and keep their position in the catalog order.
    Import {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },

    /// List all songs in the catalog
    List,

    /// Record that a user played a song
    Play {
        user: String,
        song: String,
        /// Record the play this many times
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Like a song: +1 for its genre and artist
    Like { user: String, song: String },

    /// Dislike a song: -1 for its genre and artist
    Dislike { user: String, song: String },

    /// Adjust a user's score for a genre
    AdjustGenre {
        user: String,
        genre: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Adjust a user's score for an artist
    AdjustArtist {
        user: String,
        artist: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Show a user's genres, best first
    TopGenres {
        user: String,
        #[arg(long)]
        json: bool,
    },

    /// Show a user's artists, best first
    TopArtists {
        user: String,
        #[arg(long)]
        json: bool,
    },

    /// Show a user's full preference profile
    Profile { user: String },

    /// Recommend songs, albums or artists for a user
    Recommend {
        user: String,
        #[arg(value_enum)]
        kind: KindArg,
        /// Maximum number of results (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },

    /// Write preference profiles to a snapshot file
    Export {
        /// Snapshot file (defaults to the configured snapshot path)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: Option<PathBuf>,
        /// Only export this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Restore preference profiles from a snapshot file
    ImportProfiles {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: Option<PathBuf>,
    },

    /// Generate shell completions
    ///
    /// Usage: encore completion bash > ~/.local/share/bash-completion/completions/encore
    Completion { shell: Shell },

    /// List song ids for completion (hidden command)
    #[command(hide = true)]
    CompleteSongs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_recommend() {
        let args = Args::try_parse_from([
            "encore", "--db", "/tmp/x.db", "recommend", "alice", "albums-by-artist", "-l", "3",
        ])
        .expect("valid arguments");
        assert_eq!(args.db, Some(PathBuf::from("/tmp/x.db")));
        match args.command {
            Command::Recommend { user, kind, limit, json } => {
                assert_eq!(user, "alice");
                assert_eq!(RecommendationKind::from(kind), RecommendationKind::AlbumsByArtist);
                assert_eq!(limit, Some(3));
                assert!(!json);
            }
            _ => panic!("expected recommend"),
        }
    }

    #[test]
    fn test_negative_delta_parses() {
        let args = Args::try_parse_from(["encore", "adjust-genre", "bob", "Polka", "-2"])
            .expect("negative delta accepted");
        assert!(matches!(args.command, Command::AdjustGenre { delta: -2, .. }));
    }

    #[test]
    fn test_kind_names_match_library() {
        for kind in KindArg::value_variants() {
            let name = kind.to_possible_value().expect("visible").get_name().to_string();
            assert_eq!(RecommendationKind::from(*kind).as_str(), name);
        }
    }
}
