//! # Preference Store
//!
//! Holds one [`PreferenceProfile`] per user id, created on demand.
//!
//! ## Locking
//!
//! The user table sits behind an `RwLock`; each profile has its own `Mutex`.
//! Writers to different users never contend, and every operation on a single
//! user runs under that user's lock, so a user's sequence of plays,
//! adjustments and reads is linearizable. Readers get cloned profiles, never
//! references into a profile being mutated.
//!
//! Poisoned locks are recovered: a profile is plain maps and cannot be left in
//! a state that breaks its own invariants.

use crate::profile::PreferenceProfile;
use log::{trace, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

type SharedProfile = Arc<Mutex<PreferenceProfile>>;

#[derive(Debug, Default)]
pub struct PreferenceStore {
    profiles: RwLock<HashMap<String, SharedProfile>>,
}

fn lock_profile(profile: &SharedProfile) -> MutexGuard<'_, PreferenceProfile> {
    profile.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, user_id: &str) -> Option<SharedProfile> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    fn shared_or_create(&self, user_id: &str) -> SharedProfile {
        if let Some(profile) = self.existing(user_id) {
            return profile;
        }
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        profiles
            .entry(user_id.to_string())
            .or_insert_with(|| {
                trace!("Creating preference profile for user `{user_id}'");
                Arc::new(Mutex::new(PreferenceProfile::new()))
            })
            .clone()
    }

    /// Run `f` with exclusive access to the user's profile, creating it if
    /// needed. All multi-step updates (a recorded play) go through here.
    pub fn with_profile_mut<R>(&self, user_id: &str, f: impl FnOnce(&mut PreferenceProfile) -> R) -> R {
        let shared = self.shared_or_create(user_id);
        let mut guard = lock_profile(&shared);
        f(&mut guard)
    }

    /// Consistent copy of the user's profile, created empty if absent.
    pub fn get_or_create(&self, user_id: &str) -> PreferenceProfile {
        self.with_profile_mut(user_id, |profile| profile.clone())
    }

    /// Consistent copy of the user's profile; an unknown user reads as empty
    /// and is not added to the store.
    #[must_use]
    pub fn snapshot_of(&self, user_id: &str) -> PreferenceProfile {
        self.existing(user_id)
            .map(|shared| lock_profile(&shared).clone())
            .unwrap_or_default()
    }

    pub fn adjust_genre(&self, user_id: &str, genre: &str, delta: i64) {
        if user_id.is_empty() || genre.is_empty() {
            warn!("Ignoring genre adjustment with empty user id or genre");
            return;
        }
        self.with_profile_mut(user_id, |profile| profile.adjust_genre(genre, delta));
    }

    pub fn adjust_artist(&self, user_id: &str, artist_id: &str, delta: i64) {
        if user_id.is_empty() || artist_id.is_empty() {
            warn!("Ignoring artist adjustment with empty user id or artist id");
            return;
        }
        self.with_profile_mut(user_id, |profile| profile.adjust_artist(artist_id, delta));
    }

    /// Genres by score, highest first; ties in first-seen order.
    #[must_use]
    pub fn top_genres(&self, user_id: &str) -> Vec<(String, i64)> {
        self.snapshot_of(user_id).genre_scores().sorted_desc()
    }

    #[must_use]
    pub fn top_artists(&self, user_id: &str) -> Vec<(String, i64)> {
        self.snapshot_of(user_id).artist_scores().sorted_desc()
    }

    /// Known user ids, sorted for reproducible output.
    #[must_use]
    pub fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Copies of every profile, sorted by user id.
    #[must_use]
    pub fn all_profiles(&self) -> Vec<(String, PreferenceProfile)> {
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<(String, PreferenceProfile)> = profiles
            .iter()
            .map(|(user_id, shared)| (user_id.clone(), lock_profile(shared).clone()))
            .collect();
        all.sort_by(|(a, _), (b, _)| a.cmp(b));
        all
    }

    /// Swap in whole profiles. The caller has already validated them; the
    /// table write lock makes the replacement atomic with respect to readers.
    pub fn replace_profiles(&self, incoming: Vec<(String, PreferenceProfile)>) {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        for (user_id, profile) in incoming {
            match profiles.get(&user_id) {
                Some(shared) => *lock_profile(shared) = profile,
                None => {
                    profiles.insert(user_id, Arc::new(Mutex::new(profile)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_or_create_creates_empty_profile() {
        let store = PreferenceStore::new();
        assert!(store.user_ids().is_empty());

        let profile = store.get_or_create("u1");
        assert!(profile.is_empty());
        assert_eq!(store.user_ids(), vec!["u1"]);
    }

    #[test]
    fn test_reads_do_not_create_profiles() {
        let store = PreferenceStore::new();
        assert!(store.top_genres("ghost").is_empty());
        assert!(store.top_artists("ghost").is_empty());
        assert!(store.snapshot_of("ghost").is_empty());
        assert!(store.user_ids().is_empty());
    }

    #[test]
    fn test_adjustments_and_top_lists() {
        let store = PreferenceStore::new();
        store.adjust_genre("u1", "Jazz", 2);
        store.adjust_genre("u1", "Rock", 5);
        store.adjust_genre("u1", "Metal", -1);
        store.adjust_artist("u1", "a1", 1);
        store.adjust_artist("u1", "a2", 1);

        assert_eq!(
            store.top_genres("u1"),
            vec![
                ("Rock".to_string(), 5),
                ("Jazz".to_string(), 2),
                ("Metal".to_string(), -1),
            ]
        );
        assert_eq!(
            store.top_artists("u1"),
            vec![("a1".to_string(), 1), ("a2".to_string(), 1)]
        );
    }

    #[test]
    fn test_invalid_input_is_a_no_op() {
        let store = PreferenceStore::new();
        store.adjust_genre("", "Rock", 1);
        store.adjust_genre("u1", "", 1);
        store.adjust_artist("u1", "", 1);
        assert!(store.user_ids().is_empty());
    }

    #[test]
    fn test_replace_profiles_overwrites_only_named_users() {
        let store = PreferenceStore::new();
        store.adjust_genre("u1", "Rock", 1);
        store.adjust_genre("u2", "Jazz", 1);

        let mut replacement = PreferenceProfile::new();
        replacement.adjust_genre("Folk", 7);
        store.replace_profiles(vec![("u1".to_string(), replacement)]);

        assert_eq!(store.top_genres("u1"), vec![("Folk".to_string(), 7)]);
        assert_eq!(store.top_genres("u2"), vec![("Jazz".to_string(), 1)]);
    }

    #[test]
    fn test_concurrent_adjustments_are_not_lost() {
        let store = Arc::new(PreferenceStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..250 {
                        store.adjust_genre("u1", "Rock", 1);
                        store.with_profile_mut("u1", |p| p.increment_play("s1"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        let profile = store.snapshot_of("u1");
        assert_eq!(profile.genre_scores().get("Rock"), Some(2000));
        assert_eq!(profile.play_counts().get("s1"), Some(2000));
    }
}
