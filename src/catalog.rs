//! # Catalog Module
//!
//! Songs, albums and artists as the recommendation engine sees them, plus the
//! read-only [`Catalog`] trait through which every lookup goes.
//!
//! Ownership is one-directional: a song carries the ids of its artist and
//! album, an album carries the id of its artist. Nothing points back down, so
//! "songs by artist" is a query against the catalog, never a stored list.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryCatalog`] - a `Vec`-backed catalog, used by tests and benchmarks
//! - [`crate::db::Database`] - the SQLite catalog used by the CLI

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single track in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub release_year: Option<u32>,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub release_year: Option<u32>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Treats `None` and `Some("")` alike. Every optional attribute read by the
/// engine goes through this.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Song {
    #[must_use]
    pub fn genre(&self) -> Option<&str> {
        non_empty(self.genre.as_deref())
    }

    #[must_use]
    pub fn artist_id(&self) -> Option<&str> {
        non_empty(self.artist_id.as_deref())
    }

    #[must_use]
    pub fn album_id(&self) -> Option<&str> {
        non_empty(self.album_id.as_deref())
    }
}

impl Album {
    #[must_use]
    pub fn genre(&self) -> Option<&str> {
        non_empty(self.genre.as_deref())
    }

    #[must_use]
    pub fn artist_id(&self) -> Option<&str> {
        non_empty(self.artist_id.as_deref())
    }
}

/// Any catalog entity that can be recommended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogItem {
    Song(Song),
    Album(Album),
    Artist(Artist),
}

impl CatalogItem {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Song(song) => &song.id,
            Self::Album(album) => &album.id,
            Self::Artist(artist) => &artist.id,
        }
    }

    /// Human readable label: song/album title or artist name.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Song(song) => &song.title,
            Self::Album(album) => &album.title,
            Self::Artist(artist) => &artist.name,
        }
    }
}

/// Read-only access to the music catalog.
///
/// Implementations must preserve a stable enumeration order across calls:
/// the recommendation generator uses it to break score ties.
///
/// # Errors
///
/// Every method may fail (a database going away, a corrupt row). The
/// recommendation core logs such failures and treats them as missing data.
pub trait Catalog: Send + Sync {
    /// Look up one song. `Ok(None)` means the id is unknown.
    fn find_song_by_id(&self, id: &str) -> Result<Option<Song>>;

    fn list_all_songs(&self) -> Result<Vec<Song>>;

    fn list_all_albums(&self) -> Result<Vec<Album>>;

    fn list_all_artists(&self) -> Result<Vec<Artist>>;

    /// Songs whose `artist_id` equals `artist_id`, in catalog order.
    fn list_songs_by_artist(&self, artist_id: &str) -> Result<Vec<Song>>;
}

/// In-memory catalog, enumerated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    songs: Vec<Song>,
    albums: Vec<Album>,
    artists: Vec<Artist>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_song(&mut self, song: Song) -> &mut Self {
        self.songs.push(song);
        self
    }

    pub fn add_album(&mut self, album: Album) -> &mut Self {
        self.albums.push(album);
        self
    }

    pub fn add_artist(&mut self, artist: Artist) -> &mut Self {
        self.artists.push(artist);
        self
    }

    /// Drop a song, e.g. to simulate catalog churn.
    pub fn remove_song(&mut self, id: &str) -> Option<Song> {
        let index = self.songs.iter().position(|song| song.id == id)?;
        Some(self.songs.remove(index))
    }
}

impl Catalog for MemoryCatalog {
    fn find_song_by_id(&self, id: &str) -> Result<Option<Song>> {
        Ok(self.songs.iter().find(|song| song.id == id).cloned())
    }

    fn list_all_songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.clone())
    }

    fn list_all_albums(&self) -> Result<Vec<Album>> {
        Ok(self.albums.clone())
    }

    fn list_all_artists(&self) -> Result<Vec<Artist>> {
        Ok(self.artists.clone())
    }

    fn list_songs_by_artist(&self, artist_id: &str) -> Result<Vec<Song>> {
        Ok(self
            .songs
            .iter()
            .filter(|song| song.artist_id() == Some(artist_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, artist: Option<&str>, genre: Option<&str>) -> Song {
        Song {
            id: id.to_string(),
            title: format!("Title {id}"),
            artist_id: artist.map(str::to_string),
            genre: genre.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_attributes_read_as_missing() {
        let s = song("s1", Some(""), Some(""));
        assert_eq!(s.genre(), None);
        assert_eq!(s.artist_id(), None);
        assert_eq!(s.album_id(), None);
    }

    #[test]
    fn test_memory_catalog_lookup_and_order() -> Result<()> {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_song(song("s1", Some("a1"), Some("Rock")))
            .add_song(song("s2", Some("a2"), Some("Jazz")))
            .add_song(song("s3", Some("a1"), None));

        assert_eq!(catalog.find_song_by_id("s2")?.map(|s| s.id), Some("s2".to_string()));
        assert!(catalog.find_song_by_id("missing")?.is_none());

        let ids: Vec<String> = catalog.list_all_songs()?.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);

        let by_artist: Vec<String> = catalog
            .list_songs_by_artist("a1")?
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(by_artist, vec!["s1", "s3"]);
        Ok(())
    }

    #[test]
    fn test_remove_song() -> Result<()> {
        let mut catalog = MemoryCatalog::new();
        catalog.add_song(song("s1", None, None));
        assert!(catalog.remove_song("s1").is_some());
        assert!(catalog.remove_song("s1").is_none());
        assert!(catalog.list_all_songs()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_catalog_item_identity() {
        let item = CatalogItem::Artist(Artist {
            id: "a1".to_string(),
            name: "The Band".to_string(),
            ..Default::default()
        });
        assert_eq!(item.id(), "a1");
        assert_eq!(item.label(), "The Band");
    }
}
