//! Per-user preference state.
//!
//! A [`PreferenceProfile`] is three insertion-ordered maps: genre scores,
//! artist scores and play counts. The maps never expose their storage; all
//! mutation goes through `adjust_*` / `increment_play`, and sorted reads break
//! ties by the order in which keys first appeared.

use std::collections::HashMap;

/// Numbers a [`ScoreMap`] can hold. Accumulation saturates at the type's
/// bounds instead of overflowing.
pub trait Score: Copy + Default + Ord {
    #[must_use]
    fn saturating_add(self, rhs: Self) -> Self;
}

impl Score for i64 {
    fn saturating_add(self, rhs: Self) -> Self {
        i64::saturating_add(self, rhs)
    }
}

impl Score for u64 {
    fn saturating_add(self, rhs: Self) -> Self {
        u64::saturating_add(self, rhs)
    }
}

/// Map from string key to a number, remembering first-insertion order.
///
/// Keys are never removed, so the position of a key in `entries` is its
/// insertion rank for the lifetime of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for ScoreMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: Score> ScoreMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from pairs in insertion order.
    ///
    /// Returns the offending key if it appears twice.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, V)>) -> Result<Self, String> {
        let mut map = Self::new();
        for (key, value) in pairs {
            if map.index.contains_key(&key) {
                return Err(key);
            }
            map.index.insert(key.clone(), map.entries.len());
            map.entries.push((key, value));
        }
        Ok(map)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    /// Value for `key`, or zero when absent.
    #[must_use]
    pub fn get_or_zero(&self, key: &str) -> V {
        self.get(key).unwrap_or_default()
    }

    /// Add `delta` to `key`, creating the entry at zero first. Saturates.
    pub fn add(&mut self, key: &str, delta: V) {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        let value = &mut self.entries[i].1;
        *value = value.saturating_add(delta);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, V)> + '_ {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// All entries, highest value first; equal values keep insertion order.
    #[must_use]
    pub fn sorted_desc(&self) -> Vec<(String, V)> {
        let mut sorted = self.entries.clone();
        // `sort_by` is stable
        sorted.sort_by(|(_, a), (_, b)| b.cmp(a));
        sorted
    }
}

/// Accumulated affinity of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceProfile {
    genre_scores: ScoreMap<i64>,
    artist_scores: ScoreMap<i64>,
    play_counts: ScoreMap<u64>,
}

impl PreferenceProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reassemble a profile from its three maps (snapshot restore).
    #[must_use]
    pub fn from_parts(
        genre_scores: ScoreMap<i64>,
        artist_scores: ScoreMap<i64>,
        play_counts: ScoreMap<u64>,
    ) -> Self {
        Self {
            genre_scores,
            artist_scores,
            play_counts,
        }
    }

    #[must_use]
    pub fn genre_scores(&self) -> &ScoreMap<i64> {
        &self.genre_scores
    }

    #[must_use]
    pub fn artist_scores(&self) -> &ScoreMap<i64> {
        &self.artist_scores
    }

    #[must_use]
    pub fn play_counts(&self) -> &ScoreMap<u64> {
        &self.play_counts
    }

    /// No-op for an empty genre. No floor or ceiling is applied.
    pub fn adjust_genre(&mut self, genre: &str, delta: i64) {
        if genre.is_empty() {
            return;
        }
        self.genre_scores.add(genre, delta);
    }

    /// No-op for an empty artist id.
    pub fn adjust_artist(&mut self, artist_id: &str, delta: i64) {
        if artist_id.is_empty() {
            return;
        }
        self.artist_scores.add(artist_id, delta);
    }

    pub fn increment_play(&mut self, song_id: &str) {
        if song_id.is_empty() {
            return;
        }
        self.play_counts.add(song_id, 1);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genre_scores.is_empty() && self.artist_scores.is_empty() && self.play_counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_creates_entry_at_zero() {
        let mut map: ScoreMap<i64> = ScoreMap::new();
        assert_eq!(map.get("Rock"), None);
        assert_eq!(map.get_or_zero("Rock"), 0);

        map.add("Rock", 2);
        map.add("Rock", -5);
        assert_eq!(map.get("Rock"), Some(-3));
        assert_eq!(map.keys().count(), 1);
    }

    #[test]
    fn test_sorted_desc_is_stable() {
        let mut map: ScoreMap<i64> = ScoreMap::new();
        map.add("Jazz", 1);
        map.add("Rock", 3);
        map.add("Blues", 1);
        map.add("Folk", 3);

        let sorted = map.sorted_desc();
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Rock", "Folk", "Jazz", "Blues"]);
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        let ok = ScoreMap::from_pairs(vec![("a".to_string(), 1_i64), ("b".to_string(), 2)]);
        assert!(ok.is_ok());

        let dup = ScoreMap::from_pairs(vec![("a".to_string(), 1_i64), ("a".to_string(), 2)]);
        assert_eq!(dup, Err("a".to_string()));
    }

    #[test]
    fn test_from_pairs_keeps_order() {
        let map = ScoreMap::from_pairs(vec![("z".to_string(), 1_u64), ("a".to_string(), 1)])
            .expect("distinct keys");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn test_add_saturates_at_bounds() {
        let mut map: ScoreMap<i64> = ScoreMap::new();
        map.add("Rock", i64::MAX);
        map.add("Rock", 1);
        assert_eq!(map.get("Rock"), Some(i64::MAX));

        map.add("Polka", i64::MIN);
        map.add("Polka", -1);
        assert_eq!(map.get("Polka"), Some(i64::MIN));

        let mut plays: ScoreMap<u64> = ScoreMap::new();
        plays.add("s1", u64::MAX);
        plays.add("s1", 1);
        assert_eq!(plays.get("s1"), Some(u64::MAX));
    }

    #[test]
    fn test_profile_ignores_empty_keys() {
        let mut profile = PreferenceProfile::new();
        profile.adjust_genre("", 4);
        profile.adjust_artist("", 4);
        profile.increment_play("");
        assert!(profile.is_empty());
    }

    #[test]
    fn test_profile_negative_scores_allowed() {
        let mut profile = PreferenceProfile::new();
        profile.adjust_genre("Polka", -2);
        profile.adjust_artist("a9", -1);
        assert_eq!(profile.genre_scores().get("Polka"), Some(-2));
        assert_eq!(profile.artist_scores().get("a9"), Some(-1));
        assert!(profile.play_counts().is_empty());
    }
}
