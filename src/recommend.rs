//! # Recommendation Generation
//!
//! Turns a user's [`PreferenceProfile`] into a ranked, truncated list of
//! catalog items. One request runs the same pipeline for every kind:
//!
//! 1. **Profile check**: an empty relevant preference map means no
//!    recommendations (not an error)
//! 2. **Exclusion**: drop items the user already knows
//! 3. **Scoring**: apply the kind's [`ScoringPolicy`] to each candidate
//! 4. **Filtering**: only `score > 0` is eligible
//! 5. **Ranking**: stable sort by score, catalog order breaks ties
//! 6. **Truncation**: at most `limit` items
//!
//! What differs per kind (candidate type, exclusion set, scoring) lives behind
//! the crate-internal `CandidateStrategy` trait.
//!
//! Generation is read-only: the profile is copied under its lock and scored
//! without holding it. Catalog failures are logged and degrade to "no
//! candidates" or "score 0"; they never abort the request.

use crate::algorithm::{self, Affinity, ScoringPolicy};
use crate::catalog::{Catalog, CatalogItem};
use crate::profile::PreferenceProfile;
use crate::store::PreferenceStore;
use anyhow::Result;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// The recommendation lists the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationKind {
    /// Unplayed songs in genres the user favours.
    SongsByGenre,
    /// Unplayed songs by artists the user favours.
    SongsByArtist,
    /// Albums the user has not played from, in favoured genres.
    AlbumsByGenre,
    /// Albums the user has not played from, by favoured artists.
    AlbumsByArtist,
    /// Artists the user has no score for, ranked by how much of their output
    /// falls in favoured genres.
    ArtistsByGenreOverlap,
}

impl RecommendationKind {
    pub const ALL: [Self; 5] = [
        Self::SongsByGenre,
        Self::SongsByArtist,
        Self::AlbumsByGenre,
        Self::AlbumsByArtist,
        Self::ArtistsByGenreOverlap,
    ];

    #[must_use]
    pub const fn policy(self) -> ScoringPolicy {
        match self {
            Self::SongsByGenre | Self::AlbumsByGenre => ScoringPolicy::Affinity(Affinity::Genre),
            Self::SongsByArtist | Self::AlbumsByArtist => ScoringPolicy::Affinity(Affinity::Artist),
            Self::ArtistsByGenreOverlap => ScoringPolicy::ArtistDiscovery,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SongsByGenre => "songs-by-genre",
            Self::SongsByArtist => "songs-by-artist",
            Self::AlbumsByGenre => "albums-by-genre",
            Self::AlbumsByArtist => "albums-by-artist",
            Self::ArtistsByGenreOverlap => "artists-by-genre-overlap",
        }
    }

    fn strategy(self) -> Box<dyn CandidateStrategy> {
        match self {
            Self::SongsByGenre => Box::new(SongStrategy(Affinity::Genre)),
            Self::SongsByArtist => Box::new(SongStrategy(Affinity::Artist)),
            Self::AlbumsByGenre => Box::new(AlbumStrategy(Affinity::Genre)),
            Self::AlbumsByArtist => Box::new(AlbumStrategy(Affinity::Artist)),
            Self::ArtistsByGenreOverlap => Box::new(ArtistDiscoveryStrategy),
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown recommendation kind: {s}"))
    }
}

/// Parameters of one recommendation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub kind: RecommendationKind,
    pub limit: usize,
}

impl RecommendationRequest {
    #[must_use]
    pub fn new(user_id: impl Into<String>, kind: RecommendationKind, limit: usize) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            limit,
        }
    }
}

/// A catalog item with the score it earned. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub item: CatalogItem,
    pub score: i64,
}

/// Per-kind behaviour of the generation pipeline.
pub(crate) trait CandidateStrategy: Send + Sync {
    fn policy(&self) -> ScoringPolicy;

    /// All items of the target type, in catalog order.
    ///
    /// # Errors
    ///
    /// Propagates catalog failures; the generator turns them into an empty
    /// candidate list.
    fn enumerate(&self, catalog: &dyn Catalog) -> Result<Vec<CatalogItem>>;

    /// Ids the user already knows.
    fn exclusions(&self, profile: &PreferenceProfile, catalog: &dyn Catalog) -> HashSet<String>;

    fn score(&self, item: &CatalogItem, profile: &PreferenceProfile, catalog: &dyn Catalog) -> i64;
}

/// Songs, excluding any song already played.
struct SongStrategy(Affinity);

impl CandidateStrategy for SongStrategy {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::Affinity(self.0)
    }

    fn enumerate(&self, catalog: &dyn Catalog) -> Result<Vec<CatalogItem>> {
        Ok(catalog
            .list_all_songs()?
            .into_iter()
            .map(CatalogItem::Song)
            .collect())
    }

    fn exclusions(&self, profile: &PreferenceProfile, _catalog: &dyn Catalog) -> HashSet<String> {
        profile.play_counts().keys().map(str::to_string).collect()
    }

    fn score(&self, item: &CatalogItem, profile: &PreferenceProfile, _catalog: &dyn Catalog) -> i64 {
        match item {
            CatalogItem::Song(song) => algorithm::score_song(song, self.0, profile),
            _ => 0,
        }
    }
}

/// Albums, excluding any album a played song belongs to.
struct AlbumStrategy(Affinity);

impl CandidateStrategy for AlbumStrategy {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::Affinity(self.0)
    }

    fn enumerate(&self, catalog: &dyn Catalog) -> Result<Vec<CatalogItem>> {
        Ok(catalog
            .list_all_albums()?
            .into_iter()
            .map(CatalogItem::Album)
            .collect())
    }

    fn exclusions(&self, profile: &PreferenceProfile, catalog: &dyn Catalog) -> HashSet<String> {
        profile
            .play_counts()
            .keys()
            .filter_map(|song_id| match catalog.find_song_by_id(song_id) {
                Ok(Some(song)) => song.album_id().map(str::to_string),
                Ok(None) => {
                    debug!("Played song `{song_id}' no longer in catalog");
                    None
                }
                Err(e) => {
                    warn!("Failed to resolve album of played song `{song_id}': {e:#}");
                    None
                }
            })
            .collect()
    }

    fn score(&self, item: &CatalogItem, profile: &PreferenceProfile, _catalog: &dyn Catalog) -> i64 {
        match item {
            CatalogItem::Album(album) => algorithm::score_album(album, self.0, profile),
            _ => 0,
        }
    }
}

/// Artists the user has no artist score for, scored by genre overlap.
struct ArtistDiscoveryStrategy;

impl CandidateStrategy for ArtistDiscoveryStrategy {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::ArtistDiscovery
    }

    fn enumerate(&self, catalog: &dyn Catalog) -> Result<Vec<CatalogItem>> {
        Ok(catalog
            .list_all_artists()?
            .into_iter()
            .map(CatalogItem::Artist)
            .collect())
    }

    fn exclusions(&self, profile: &PreferenceProfile, _catalog: &dyn Catalog) -> HashSet<String> {
        profile.artist_scores().keys().map(str::to_string).collect()
    }

    fn score(&self, item: &CatalogItem, profile: &PreferenceProfile, catalog: &dyn Catalog) -> i64 {
        let CatalogItem::Artist(artist) = item else {
            return 0;
        };
        match catalog.list_songs_by_artist(&artist.id) {
            Ok(songs) => algorithm::artist_discovery(&songs, profile),
            Err(e) => {
                warn!("Failed to list songs of artist `{}': {e:#}", artist.id);
                0
            }
        }
    }
}

/// Keep positive scores, order by score (stable), cut to `limit`.
#[must_use]
pub fn rank(mut candidates: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    candidates.retain(|candidate| candidate.score > 0);
    // `sort_by` is stable: equal scores keep catalog order
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(limit);
    candidates
}

/// Runs recommendation requests against a catalog and a preference store.
pub struct RecommendationGenerator<'a> {
    catalog: &'a dyn Catalog,
    store: &'a PreferenceStore,
}

impl<'a> RecommendationGenerator<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn Catalog, store: &'a PreferenceStore) -> Self {
        Self { catalog, store }
    }

    /// Produce at most `request.limit` candidates, best first.
    #[must_use]
    pub fn generate(&self, request: &RecommendationRequest) -> Vec<ScoredCandidate> {
        let profile = self.store.snapshot_of(&request.user_id);
        self.generate_for_profile(&profile, request.kind, request.limit)
    }

    /// Same pipeline against an explicit profile.
    #[must_use]
    pub fn generate_for_profile(
        &self,
        profile: &PreferenceProfile,
        kind: RecommendationKind,
        limit: usize,
    ) -> Vec<ScoredCandidate> {
        let strategy = kind.strategy();
        let preferences_empty = if strategy.policy().uses_genre_scores() {
            profile.genre_scores().is_empty()
        } else {
            profile.artist_scores().is_empty()
        };
        if preferences_empty || limit == 0 {
            debug!("No {kind} recommendations: empty preferences or zero limit");
            return Vec::new();
        }

        let excluded = strategy.exclusions(profile, self.catalog);

        let candidates = match strategy.enumerate(self.catalog) {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to enumerate candidates for {kind}: {e:#}");
                Vec::new()
            }
        };

        let scored: Vec<ScoredCandidate> = candidates
            .into_par_iter()
            .filter(|item| !excluded.contains(item.id()))
            .map(|item| {
                let score = strategy.score(&item, profile, self.catalog);
                ScoredCandidate { item, score }
            })
            .collect();

        let total = scored.len();
        let ranked = rank(scored, limit);
        debug!(
            "{kind}: {} excluded, {total} scored, {} returned",
            excluded.len(),
            ranked.len()
        );
        ranked
    }
}
