//! # Event Recorder
//!
//! Translates listening facts into preference updates:
//!
//! - **Play**: play count +1, then genre +1 and artist +1 when the song is
//!   still in the catalog
//! - **Feedback**: explicit like (+1) or dislike (-1) on a song's genre and
//!   artist, without touching play counts
//!
//! Invalid input (empty ids) is logged and ignored. Recording is not
//! idempotent: two calls mean the song was played twice.

use crate::catalog::{Catalog, Song};
use crate::store::PreferenceStore;
use log::{debug, warn};

/// Explicit user reaction to a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Like,
    Dislike,
}

impl Feedback {
    #[must_use]
    pub const fn delta(self) -> i64 {
        match self {
            Self::Like => 1,
            Self::Dislike => -1,
        }
    }
}

pub struct EventRecorder<'a> {
    catalog: &'a dyn Catalog,
    store: &'a PreferenceStore,
}

impl<'a> EventRecorder<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn Catalog, store: &'a PreferenceStore) -> Self {
        Self { catalog, store }
    }

    fn resolve(&self, song_id: &str) -> Option<Song> {
        match self.catalog.find_song_by_id(song_id) {
            Ok(Some(song)) => Some(song),
            Ok(None) => {
                debug!("Song `{song_id}' not in catalog, only its play count is kept");
                None
            }
            Err(e) => {
                warn!("Catalog lookup for song `{song_id}' failed: {e:#}");
                None
            }
        }
    }

    /// Record that `user_id` played `song_id`.
    ///
    /// The catalog lookup happens before the user's profile is locked; the
    /// three updates are then applied under one lock.
    pub fn record_play(&self, user_id: &str, song_id: &str) {
        if user_id.is_empty() || song_id.is_empty() {
            warn!("Ignoring play event with empty user id or song id");
            return;
        }

        let song = self.resolve(song_id);
        self.store.with_profile_mut(user_id, |profile| {
            profile.increment_play(song_id);
            if let Some(song) = &song {
                if let Some(genre) = song.genre() {
                    profile.adjust_genre(genre, 1);
                }
                if let Some(artist_id) = song.artist_id() {
                    profile.adjust_artist(artist_id, 1);
                }
            }
        });
        debug!("Recorded play of `{song_id}' for user `{user_id}'");
    }

    /// Apply a like or dislike to the genre and artist of `song_id`.
    ///
    /// Unknown songs are ignored: without the catalog entry there is nothing
    /// to adjust.
    pub fn record_feedback(&self, user_id: &str, song_id: &str, feedback: Feedback) {
        if user_id.is_empty() || song_id.is_empty() {
            warn!("Ignoring feedback with empty user id or song id");
            return;
        }
        let Some(song) = self.resolve(song_id) else {
            return;
        };

        let delta = feedback.delta();
        self.store.with_profile_mut(user_id, |profile| {
            if let Some(genre) = song.genre() {
                profile.adjust_genre(genre, delta);
            }
            if let Some(artist_id) = song.artist_id() {
                profile.adjust_artist(artist_id, delta);
            }
        });
        debug!("Recorded {feedback:?} of `{song_id}' for user `{user_id}'");
    }
}
