//! # Profile Snapshots
//!
//! Serialises preference profiles to an opaque, versioned JSON document and
//! back. Each map is written as an ordered list of `[key, value]` pairs so the
//! insertion order used for tie-breaking survives a round-trip.
//!
//! Decoding validates the whole document before anything is handed to the
//! store: a snapshot is restored completely or not at all.

use crate::profile::{PreferenceProfile, Score, ScoreMap};
use crate::store::PreferenceStore;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while saving or restoring snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})", expected = SNAPSHOT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("user `{0}' appears more than once in snapshot")]
    DuplicateUser(String),

    #[error("key `{key}' appears more than once in {map} of user `{user_id}'")]
    DuplicateKey {
        user_id: String,
        map: &'static str,
        key: String,
    },
}

/// Which profiles to include in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotScope {
    All,
    User(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    version: u32,
    profiles: Vec<ProfileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRecord {
    user_id: String,
    genre_scores: Vec<(String, i64)>,
    artist_scores: Vec<(String, i64)>,
    play_counts: Vec<(String, u64)>,
}

fn pairs<V: Score>(map: &ScoreMap<V>) -> Vec<(String, V)> {
    map.iter().map(|(key, value)| (key.to_string(), value)).collect()
}

impl ProfileRecord {
    fn from_profile(user_id: &str, profile: &PreferenceProfile) -> Self {
        Self {
            user_id: user_id.to_string(),
            genre_scores: pairs(profile.genre_scores()),
            artist_scores: pairs(profile.artist_scores()),
            play_counts: pairs(profile.play_counts()),
        }
    }

    fn into_profile(self) -> Result<(String, PreferenceProfile), SnapshotError> {
        let user_id = self.user_id;
        let duplicate = |map: &'static str| {
            let user_id = user_id.clone();
            move |key: String| SnapshotError::DuplicateKey { user_id, map, key }
        };
        let genre_scores = ScoreMap::from_pairs(self.genre_scores).map_err(duplicate("genre_scores"))?;
        let artist_scores = ScoreMap::from_pairs(self.artist_scores).map_err(duplicate("artist_scores"))?;
        let play_counts = ScoreMap::from_pairs(self.play_counts).map_err(duplicate("play_counts"))?;
        Ok((
            user_id,
            PreferenceProfile::from_parts(genre_scores, artist_scores, play_counts),
        ))
    }
}

/// Encode the profiles selected by `scope`. An unknown user yields a snapshot
/// with no profiles.
pub fn encode(store: &PreferenceStore, scope: &SnapshotScope) -> Result<Vec<u8>, SnapshotError> {
    let profiles = match scope {
        SnapshotScope::All => store
            .all_profiles()
            .iter()
            .map(|(user_id, profile)| ProfileRecord::from_profile(user_id, profile))
            .collect(),
        SnapshotScope::User(user_id) => store
            .all_profiles()
            .iter()
            .filter(|(id, _)| id == user_id)
            .map(|(id, profile)| ProfileRecord::from_profile(id, profile))
            .collect(),
    };
    let document = SnapshotDocument {
        version: SNAPSHOT_VERSION,
        profiles,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

/// Parse and validate a snapshot without touching any store.
pub fn decode(bytes: &[u8]) -> Result<Vec<(String, PreferenceProfile)>, SnapshotError> {
    let document: SnapshotDocument = serde_json::from_slice(bytes)?;
    if document.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: document.version,
        });
    }

    let mut seen = HashSet::new();
    document
        .profiles
        .into_iter()
        .map(|record| {
            if !seen.insert(record.user_id.clone()) {
                return Err(SnapshotError::DuplicateUser(record.user_id));
            }
            record.into_profile()
        })
        .collect()
}

/// Decode `bytes` and replace the profiles it contains. On error the store is
/// left unchanged. Returns the number of restored profiles.
pub fn restore(store: &PreferenceStore, bytes: &[u8]) -> Result<usize, SnapshotError> {
    let profiles = decode(bytes)?;
    let count = profiles.len();
    store.replace_profiles(profiles);
    info!("Restored {count} preference profile(s) from snapshot");
    Ok(count)
}

/// Write a snapshot to `path` atomically (temp file in the same directory,
/// then rename).
pub fn save_to_file(store: &PreferenceStore, scope: &SnapshotScope, path: &Path) -> Result<(), SnapshotError> {
    let bytes = encode(store, scope)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    info!("Wrote preference snapshot to {}", path.display());
    Ok(())
}

pub fn load_from_file(store: &PreferenceStore, path: &Path) -> Result<usize, SnapshotError> {
    let bytes = std::fs::read(path)?;
    restore(store, &bytes)
}
