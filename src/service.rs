//! # Recommender Service
//!
//! [`MusicRecommender`] is the surface callers (the CLI, tests, an embedding
//! application) use. It owns the preference store and a catalog handle and
//! wires them into the recorder and the generator for each call.
//!
//! Construct one per process and pass it by reference; there is no global
//! instance.
//!
//! ```
//! use encore::catalog::{MemoryCatalog, Song};
//! use encore::recommend::RecommendationKind;
//! use encore::service::MusicRecommender;
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog
//!     .add_song(Song { id: "s1".into(), genre: Some("Rock".into()), ..Default::default() })
//!     .add_song(Song { id: "s2".into(), genre: Some("Rock".into()), ..Default::default() });
//!
//! let recommender = MusicRecommender::new(catalog);
//! recommender.record_play("u1", "s1");
//!
//! let picks = recommender.recommend("u1", RecommendationKind::SongsByGenre, 5);
//! assert_eq!(picks.len(), 1);
//! assert_eq!(picks[0].item.id(), "s2");
//! ```

use crate::catalog::Catalog;
use crate::profile::PreferenceProfile;
use crate::recommend::{RecommendationGenerator, RecommendationKind, RecommendationRequest, ScoredCandidate};
use crate::recorder::{EventRecorder, Feedback};
use crate::snapshot::{self, SnapshotError, SnapshotScope};
use crate::store::PreferenceStore;
use std::path::Path;

pub struct MusicRecommender<C: Catalog> {
    catalog: C,
    store: PreferenceStore,
}

impl<C: Catalog> MusicRecommender<C> {
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self::with_store(catalog, PreferenceStore::new())
    }

    /// Use an already populated store (e.g. profiles loaded from disk).
    #[must_use]
    pub fn with_store(catalog: C, store: PreferenceStore) -> Self {
        Self { catalog, store }
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    #[must_use]
    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    fn recorder(&self) -> EventRecorder<'_> {
        EventRecorder::new(&self.catalog, &self.store)
    }

    pub fn record_play(&self, user_id: &str, song_id: &str) {
        self.recorder().record_play(user_id, song_id);
    }

    pub fn record_feedback(&self, user_id: &str, song_id: &str, feedback: Feedback) {
        self.recorder().record_feedback(user_id, song_id, feedback);
    }

    pub fn adjust_genre_preference(&self, user_id: &str, genre: &str, delta: i64) {
        self.store.adjust_genre(user_id, genre, delta);
    }

    pub fn adjust_artist_preference(&self, user_id: &str, artist_id: &str, delta: i64) {
        self.store.adjust_artist(user_id, artist_id, delta);
    }

    #[must_use]
    pub fn top_genres(&self, user_id: &str) -> Vec<(String, i64)> {
        self.store.top_genres(user_id)
    }

    #[must_use]
    pub fn top_artists(&self, user_id: &str) -> Vec<(String, i64)> {
        self.store.top_artists(user_id)
    }

    /// Copy of the user's full profile (empty for unknown users).
    #[must_use]
    pub fn profile(&self, user_id: &str) -> PreferenceProfile {
        self.store.snapshot_of(user_id)
    }

    #[must_use]
    pub fn recommend(&self, user_id: &str, kind: RecommendationKind, limit: usize) -> Vec<ScoredCandidate> {
        RecommendationGenerator::new(&self.catalog, &self.store)
            .generate(&RecommendationRequest::new(user_id, kind, limit))
    }

    pub fn save_profile_snapshot(&self, scope: &SnapshotScope) -> Result<Vec<u8>, SnapshotError> {
        snapshot::encode(&self.store, scope)
    }

    /// Restore profiles from snapshot bytes. Nothing changes on error.
    pub fn load_profile_snapshot(&self, bytes: &[u8]) -> Result<usize, SnapshotError> {
        snapshot::restore(&self.store, bytes)
    }

    pub fn save_snapshot_file(&self, scope: &SnapshotScope, path: &Path) -> Result<(), SnapshotError> {
        snapshot::save_to_file(&self.store, scope, path)
    }

    pub fn load_snapshot_file(&self, path: &Path) -> Result<usize, SnapshotError> {
        snapshot::load_from_file(&self.store, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, Song};

    fn song(id: &str, artist: &str, genre: &str) -> Song {
        Song {
            id: id.to_string(),
            title: id.to_uppercase(),
            artist_id: Some(artist.to_string()),
            genre: Some(genre.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_song(song("S1", "A1", "Rock"))
            .add_song(song("S2", "A2", "Jazz"))
            .add_song(song("S3", "A3", "Rock"))
            .add_song(song("S4", "A4", "Country"));
        let recommender = MusicRecommender::new(catalog);

        for _ in 0..3 {
            recommender.record_play("u1", "S1");
        }
        recommender.record_play("u1", "S2");

        assert_eq!(
            recommender.top_genres("u1"),
            vec![("Rock".to_string(), 3), ("Jazz".to_string(), 1)]
        );
        let picks = recommender.recommend("u1", RecommendationKind::SongsByGenre, 5);
        assert_eq!(picks.iter().map(|c| c.item.id()).collect::<Vec<_>>(), vec!["S3"]);
        assert_eq!(picks[0].score, 3);
    }

    #[test]
    fn test_explicit_adjustments_feed_recommendations() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_song(song("s1", "a1", "Rock"))
            .add_song(song("s2", "a2", "Rock"));
        let recommender = MusicRecommender::new(catalog);

        recommender.adjust_artist_preference("u1", "a2", 3);
        recommender.adjust_artist_preference("u1", "a1", 1);
        let picks = recommender.recommend("u1", RecommendationKind::SongsByArtist, 10);
        assert_eq!(picks.iter().map(|c| c.item.id()).collect::<Vec<_>>(), vec!["s2", "s1"]);
        assert_eq!(recommender.top_artists("u1")[0], ("a2".to_string(), 3));
    }

    #[test]
    fn test_snapshot_bytes_round_trip() -> Result<(), SnapshotError> {
        let recommender = MusicRecommender::new(MemoryCatalog::new());
        recommender.adjust_genre_preference("u1", "Rock", 2);
        recommender.record_play("u1", "ghost-song");

        let bytes = recommender.save_profile_snapshot(&SnapshotScope::All)?;
        let other = MusicRecommender::new(MemoryCatalog::new());
        other.load_profile_snapshot(&bytes)?;
        assert_eq!(other.profile("u1"), recommender.profile("u1"));
        Ok(())
    }
}
