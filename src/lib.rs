//! Music recommendations that learn from what you play.
//!
//! Core modules:
//! - [`profile`] - Per-user preference maps (genres, artists, play counts)
//! - [`store`] - Preference store with per-user locking
//! - [`recorder`] - Turns plays and likes into preference updates
//! - [`algorithm`] - Affinity scoring policies
//! - [`recommend`] - Candidate enumeration, exclusion, ranking
//! - [`service`] - The facade tying the above to a catalog
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Songs, albums, artists and the read-only catalog trait
//! - [`db`] - SQLite catalog and profile persistence
//! - [`snapshot`] - Versioned profile snapshots
//! - [`config`] - Data directory and runtime configuration
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use encore::catalog::{Album, MemoryCatalog, Song};
//! use encore::recommend::RecommendationKind;
//! use encore::service::MusicRecommender;
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog
//!     .add_album(Album { id: "al1".into(), artist_id: Some("a1".into()), ..Default::default() })
//!     .add_album(Album { id: "al2".into(), artist_id: Some("a1".into()), ..Default::default() })
//!     .add_song(Song {
//!         id: "s1".into(),
//!         artist_id: Some("a1".into()),
//!         album_id: Some("al1".into()),
//!         genre: Some("Rock".into()),
//!         ..Default::default()
//!     });
//!
//! let recommender = MusicRecommender::new(catalog);
//! recommender.record_play("alice", "s1");
//!
//! // al1 is already known through s1, al2 is by an artist alice plays
//! let albums = recommender.recommend("alice", RecommendationKind::AlbumsByArtist, 10);
//! assert_eq!(albums.len(), 1);
//! assert_eq!(albums[0].item.id(), "al2");
//! ```
//!
//! ## Scoring
//!
//! All scores are integers drawn from the user's profile:
//!
//! - **Genre affinity**: the score of the candidate's genre
//! - **Artist affinity**: the score of the candidate's artist
//! - **Artist discovery**: for an artist the user has no score for, the sum
//!   over genres of (songs in that genre × genre score)
//!
//! Only candidates scoring above zero are recommended. Ties keep catalog
//! order, so identical inputs always give identical lists.
//!
//! ## Error Handling
//!
//! Data-quality problems (unknown ids, missing genres, empty profiles) are not
//! errors: they score zero or yield empty lists, and are logged through the
//! `log` facade. Persistence and configuration return `anyhow::Result`;
//! snapshot decoding returns [`snapshot::SnapshotError`].

pub mod algorithm;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod profile;
pub mod recommend;
pub mod recorder;
pub mod service;
pub mod snapshot;
pub mod store;
