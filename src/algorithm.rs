//! Affinity scoring for recommendation candidates.
//!
//! Every function here is pure: it reads a [`PreferenceProfile`] and catalog
//! attributes, and returns an integer score. Unknown or missing attributes
//! score 0, which the generator treats as "not eligible". Scores are only
//! negative when the user has expressed a dislike.

use crate::catalog::{Album, Song};
use crate::profile::PreferenceProfile;
use std::collections::HashMap;

/// Which catalog attribute of a song or album is looked up in the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// `genre_scores[candidate.genre]`
    Genre,
    /// `artist_scores[candidate.artist_id]`
    Artist,
}

/// How a recommendation kind scores its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// Direct lookup of one attribute of a song or album.
    Affinity(Affinity),
    /// Genre distribution of an unknown artist's songs, weighted by
    /// `genre_scores`.
    ArtistDiscovery,
}

impl ScoringPolicy {
    /// Whether the policy reads the genre map (as opposed to the artist map).
    #[must_use]
    pub const fn uses_genre_scores(self) -> bool {
        match self {
            Self::Affinity(Affinity::Genre) | Self::ArtistDiscovery => true,
            Self::Affinity(Affinity::Artist) => false,
        }
    }
}

/// Score for a genre. `None` (missing or empty genre) scores 0.
#[must_use]
pub fn genre_affinity(genre: Option<&str>, profile: &PreferenceProfile) -> i64 {
    genre.map_or(0, |genre| profile.genre_scores().get_or_zero(genre))
}

/// Score for an artist id. `None` scores 0.
#[must_use]
pub fn artist_affinity(artist_id: Option<&str>, profile: &PreferenceProfile) -> i64 {
    artist_id.map_or(0, |artist_id| profile.artist_scores().get_or_zero(artist_id))
}

/// Count songs per genre, skipping songs without one.
#[must_use]
pub fn genre_histogram(songs: &[Song]) -> HashMap<&str, i64> {
    songs
        .iter()
        .filter_map(Song::genre)
        .fold(HashMap::new(), |mut counts, genre| {
            *counts.entry(genre).or_insert(0) += 1;
            counts
        })
}

/// Discovery score for an artist the user does not know yet:
///
/// ```text
/// score(artist) = Σ_genre count(songs of artist in genre) × genre_scores[genre]
/// ```
///
/// Artists whose output concentrates in favoured genres win; an artist with no
/// songs, or only songs in unknown genres, scores 0.
///
/// # Examples
///
/// ```
/// use encore::algorithm::artist_discovery;
/// use encore::catalog::Song;
/// use encore::profile::PreferenceProfile;
///
/// let mut profile = PreferenceProfile::new();
/// profile.adjust_genre("Rock", 3);
///
/// let songs: Vec<Song> = ["Rock", "Rock", "Jazz"]
///     .iter()
///     .enumerate()
///     .map(|(i, genre)| Song {
///         id: format!("s{i}"),
///         genre: Some(genre.to_string()),
///         ..Default::default()
///     })
///     .collect();
///
/// assert_eq!(artist_discovery(&songs, &profile), 6);
/// ```
#[must_use]
pub fn artist_discovery(songs: &[Song], profile: &PreferenceProfile) -> i64 {
    // Each term is below songs.len() * 2^63 in magnitude, so the i128 sum
    // cannot overflow; only the final narrowing can.
    let total: i128 = genre_histogram(songs)
        .into_iter()
        .map(|(genre, count)| i128::from(count) * i128::from(profile.genre_scores().get_or_zero(genre)))
        .sum();
    saturate(total)
}

/// Clamp a wide intermediate into the `i64` score range.
fn saturate(total: i128) -> i64 {
    i64::try_from(total).unwrap_or(if total > 0 { i64::MAX } else { i64::MIN })
}

#[must_use]
pub fn score_song(song: &Song, affinity: Affinity, profile: &PreferenceProfile) -> i64 {
    match affinity {
        Affinity::Genre => genre_affinity(song.genre(), profile),
        Affinity::Artist => artist_affinity(song.artist_id(), profile),
    }
}

#[must_use]
pub fn score_album(album: &Album, affinity: Affinity, profile: &PreferenceProfile) -> i64 {
    match affinity {
        Affinity::Genre => genre_affinity(album.genre(), profile),
        Affinity::Artist => artist_affinity(album.artist_id(), profile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, artist: Option<&str>, genre: Option<&str>) -> Song {
        Song {
            id: id.to_string(),
            title: id.to_string(),
            artist_id: artist.map(str::to_string),
            genre: genre.map(str::to_string),
            ..Default::default()
        }
    }

    fn profile() -> PreferenceProfile {
        let mut profile = PreferenceProfile::new();
        profile.adjust_genre("Rock", 5);
        profile.adjust_genre("Jazz", 2);
        profile.adjust_genre("Polka", -3);
        profile.adjust_artist("a1", 4);
        profile
    }

    #[test]
    fn test_genre_affinity() {
        let p = profile();
        assert_eq!(genre_affinity(Some("Rock"), &p), 5);
        assert_eq!(genre_affinity(Some("Polka"), &p), -3);
        assert_eq!(genre_affinity(Some("Country"), &p), 0);
        assert_eq!(genre_affinity(None, &p), 0);
    }

    #[test]
    fn test_artist_affinity() {
        let p = profile();
        assert_eq!(artist_affinity(Some("a1"), &p), 4);
        assert_eq!(artist_affinity(Some("a2"), &p), 0);
        assert_eq!(artist_affinity(None, &p), 0);
    }

    #[test]
    fn test_empty_genre_song_scores_zero() {
        let p = profile();
        let s = song("s1", Some(""), Some(""));
        assert_eq!(score_song(&s, Affinity::Genre, &p), 0);
        assert_eq!(score_song(&s, Affinity::Artist, &p), 0);
    }

    #[test]
    fn test_artist_discovery_weights_by_count() {
        let p = profile();
        let songs = vec![
            song("s1", Some("a5"), Some("Rock")),
            song("s2", Some("a5"), Some("Rock")),
            song("s3", Some("a5"), Some("Jazz")),
            song("s4", Some("a5"), None),
            song("s5", Some("a5"), Some("Country")),
        ];
        // 2 × 5 + 1 × 2
        assert_eq!(artist_discovery(&songs, &p), 12);
    }

    #[test]
    fn test_artist_discovery_empty_and_disliked() {
        let p = profile();
        assert_eq!(artist_discovery(&[], &p), 0);

        let polka = vec![song("s1", None, Some("Polka")), song("s2", None, Some("Polka"))];
        assert_eq!(artist_discovery(&polka, &p), -6);
    }

    #[test]
    fn test_genre_histogram_skips_missing() {
        let songs = vec![
            song("s1", None, Some("Rock")),
            song("s2", None, Some("")),
            song("s3", None, None),
            song("s4", None, Some("Rock")),
        ];
        let histogram = genre_histogram(&songs);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram.get("Rock"), Some(&2));
    }

    #[test]
    fn test_album_policies() {
        let p = profile();
        let album = Album {
            id: "al1".to_string(),
            title: "Album".to_string(),
            artist_id: Some("a1".to_string()),
            genre: Some("Jazz".to_string()),
            ..Default::default()
        };
        assert_eq!(score_album(&album, Affinity::Artist, &p), 4);
        assert_eq!(score_album(&album, Affinity::Genre, &p), 2);
    }

    #[test]
    fn test_artist_discovery_saturates_instead_of_overflowing() {
        let rock = vec![
            song("s1", Some("a7"), Some("Rock")),
            song("s2", Some("a7"), Some("Rock")),
            song("s3", Some("a7"), Some("Rock")),
        ];

        let mut fan = PreferenceProfile::new();
        fan.adjust_genre("Rock", i64::MAX / 2);
        assert_eq!(artist_discovery(&rock, &fan), i64::MAX);

        let mut hater = PreferenceProfile::new();
        hater.adjust_genre("Rock", i64::MIN / 2);
        assert_eq!(artist_discovery(&rock, &hater), i64::MIN);
    }

    #[test]
    fn test_artist_discovery_mixed_extremes_cancel_exactly() {
        let songs = vec![song("s1", None, Some("Rock")), song("s2", None, Some("Polka"))];
        let mut p = PreferenceProfile::new();
        p.adjust_genre("Rock", i64::MAX);
        p.adjust_genre("Polka", -i64::MAX);
        assert_eq!(artist_discovery(&songs, &p), 0);
    }

    #[test]
    fn test_policy_map_selection() {
        assert!(ScoringPolicy::Affinity(Affinity::Genre).uses_genre_scores());
        assert!(ScoringPolicy::ArtistDiscovery.uses_genre_scores());
        assert!(!ScoringPolicy::Affinity(Affinity::Artist).uses_genre_scores());
    }
}
