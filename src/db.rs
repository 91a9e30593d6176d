//! # Database Module
//!
//! SQLite storage for the catalog and for preference profiles.
//!
//! ## Schema
//!
//! - `artists`, `albums`, `songs`: the catalog. Enumeration follows `rowid`,
//!   i.e. import order, which the recommender uses to break ties.
//! - `profile_entries`: one row per `(user, map, key)` with the key's
//!   insertion `position`, so profiles reload with their tie-break order.
//!
//! [`Database`] implements [`Catalog`]. The connection sits behind a `Mutex`
//! so the database can be shared with the (parallel) scoring code.

use crate::catalog::{Album, Artist, Catalog, Song};
use crate::profile::{PreferenceProfile, ScoreMap};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS artists (
        id       TEXT PRIMARY KEY,
        name     TEXT NOT NULL,
        genre    TEXT,
        owner_id TEXT
    );
    CREATE TABLE IF NOT EXISTS albums (
        id           TEXT PRIMARY KEY,
        title        TEXT NOT NULL,
        artist_id    TEXT,
        genre        TEXT,
        release_year INTEGER,
        owner_id     TEXT
    );
    CREATE TABLE IF NOT EXISTS songs (
        id               TEXT PRIMARY KEY,
        title            TEXT NOT NULL,
        artist_id        TEXT,
        album_id         TEXT,
        genre            TEXT,
        release_year     INTEGER,
        duration_seconds INTEGER NOT NULL DEFAULT 0,
        owner_id         TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs(artist_id);
    CREATE TABLE IF NOT EXISTS profile_entries (
        user_id  TEXT    NOT NULL,
        map      TEXT    NOT NULL,
        position INTEGER NOT NULL,
        key      TEXT    NOT NULL,
        value    INTEGER NOT NULL,
        PRIMARY KEY (user_id, map, key)
    );
";

const GENRE_MAP: &str = "genre";
const ARTIST_MAP: &str = "artist";
const PLAY_MAP: &str = "play";

/// Catalog content as read from a JSON import file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogImport {
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl CatalogImport {
    /// Read an import document from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid catalog JSON in {}", path.display()))
    }
}

/// Row counts written by [`Database::import_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub artists: usize,
    pub albums: usize,
    pub songs: usize,
}

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

/// Create (or with `force`, recreate) the database at `path`.
pub fn init_database(path: &Path, force: bool) -> Result<Database> {
    if path.exists() {
        if !force {
            bail!(
                "Database already exists at {}. Use --force to recreate it.",
                path.display()
            );
        }
        info!("Removing existing database at {}", path.display());
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing database {}", path.display()))?;
    }
    Database::open(path)
}

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist_id: row.get(2)?,
        album_id: row.get(3)?,
        genre: row.get(4)?,
        release_year: row.get(5)?,
        duration_seconds: row.get(6)?,
        owner_id: row.get(7)?,
    })
}

const SONG_COLUMNS: &str =
    "id, title, artist_id, album_id, genre, release_year, duration_seconds, owner_id";

impl Database {
    /// Open (creating if needed) the database file and ensure the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("Failed to open in-memory database")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create database schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or update catalog rows in one transaction. Existing rows keep
    /// their position in the enumeration order.
    pub fn import_catalog(&self, import: &CatalogImport) -> Result<ImportSummary> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO artists (id, name, genre, owner_id) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, genre = excluded.genre,
                     owner_id = excluded.owner_id",
            )?;
            for artist in &import.artists {
                stmt.execute(params![artist.id, artist.name, artist.genre, artist.owner_id])
                    .with_context(|| format!("Failed to import artist {artist:?}"))?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO albums (id, title, artist_id, genre, release_year, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, artist_id = excluded.artist_id,
                     genre = excluded.genre, release_year = excluded.release_year,
                     owner_id = excluded.owner_id",
            )?;
            for album in &import.albums {
                stmt.execute(params![
                    album.id,
                    album.title,
                    album.artist_id,
                    album.genre,
                    album.release_year,
                    album.owner_id
                ])
                .with_context(|| format!("Failed to import album {album:?}"))?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO songs (id, title, artist_id, album_id, genre, release_year, duration_seconds, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, artist_id = excluded.artist_id,
                     album_id = excluded.album_id, genre = excluded.genre,
                     release_year = excluded.release_year,
                     duration_seconds = excluded.duration_seconds, owner_id = excluded.owner_id",
            )?;
            for song in &import.songs {
                stmt.execute(params![
                    song.id,
                    song.title,
                    song.artist_id,
                    song.album_id,
                    song.genre,
                    song.release_year,
                    song.duration_seconds,
                    song.owner_id
                ])
                .with_context(|| format!("Failed to import song {song:?}"))?;
            }
        }
        tx.commit().context("Committing catalog import failed")?;

        let summary = ImportSummary {
            artists: import.artists.len(),
            albums: import.albums.len(),
            songs: import.songs.len(),
        };
        info!("Imported {summary:?}");
        Ok(summary)
    }

    /// Persist the given profiles, replacing any stored rows for those users.
    /// All users are written in one transaction.
    pub fn save_profiles(&self, profiles: &[(String, PreferenceProfile)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut delete = tx.prepare("DELETE FROM profile_entries WHERE user_id = ?1")?;
            let mut insert = tx.prepare(
                "INSERT INTO profile_entries (user_id, map, position, key, value) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (user_id, profile) in profiles {
                delete.execute([user_id])?;

                let signed = [
                    (GENRE_MAP, profile.genre_scores()),
                    (ARTIST_MAP, profile.artist_scores()),
                ];
                for (map, scores) in signed {
                    for (position, (key, value)) in scores.iter().enumerate() {
                        insert.execute(params![user_id, map, position as i64, key, value])?;
                    }
                }
                for (position, (key, value)) in profile.play_counts().iter().enumerate() {
                    let value = i64::try_from(value)
                        .with_context(|| format!("Play count of `{key}' does not fit in SQLite"))?;
                    insert.execute(params![user_id, PLAY_MAP, position as i64, key, value])?;
                }
            }
        }
        tx.commit().context("Committing preference profiles failed")?;
        debug!("Saved {} preference profile(s)", profiles.len());
        Ok(())
    }

    /// Load every stored profile, sorted by user id.
    pub fn load_profiles(&self) -> Result<Vec<(String, PreferenceProfile)>> {
        #[derive(Default)]
        struct Parts {
            genre: Vec<(String, i64)>,
            artist: Vec<(String, i64)>,
            play: Vec<(String, u64)>,
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, map, key, value FROM profile_entries ORDER BY user_id, map, position",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .context("Cannot query preference profiles")?;

        let mut users: BTreeMap<String, Parts> = BTreeMap::new();
        for row in rows {
            let (user_id, map, key, value) = row.context("Reading profile row failed")?;
            let parts = users.entry(user_id).or_default();
            match map.as_str() {
                GENRE_MAP => parts.genre.push((key, value)),
                ARTIST_MAP => parts.artist.push((key, value)),
                PLAY_MAP => {
                    let count = u64::try_from(value)
                        .with_context(|| format!("Negative play count stored for `{key}'"))?;
                    parts.play.push((key, count));
                }
                other => bail!("Unknown preference map `{other}' in database"),
            }
        }

        users
            .into_iter()
            .map(|(user_id, parts)| -> Result<(String, PreferenceProfile)> {
                let duplicate = |key: String| anyhow::anyhow!("Duplicate key `{key}' for user `{user_id}'");
                let profile = PreferenceProfile::from_parts(
                    ScoreMap::from_pairs(parts.genre).map_err(duplicate)?,
                    ScoreMap::from_pairs(parts.artist).map_err(duplicate)?,
                    ScoreMap::from_pairs(parts.play).map_err(duplicate)?,
                );
                Ok((user_id, profile))
            })
            .collect()
    }

    fn query_songs(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Song>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(sql)
            .with_context(|| format!("Invalid SQL statement: {sql}"))?;
        let songs = stmt
            .query_map(params, song_from_row)
            .context("Cannot query songs")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Queried song row failed")?;
        Ok(songs)
    }
}

impl Catalog for Database {
    fn find_song_by_id(&self, id: &str) -> Result<Option<Song>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1"),
            [id],
            song_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to query song `{id}'"))
    }

    fn list_all_songs(&self) -> Result<Vec<Song>> {
        self.query_songs(&format!("SELECT {SONG_COLUMNS} FROM songs ORDER BY rowid"), [])
    }

    fn list_all_albums(&self) -> Result<Vec<Album>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, artist_id, genre, release_year, owner_id FROM albums ORDER BY rowid",
        )?;
        let albums = stmt
            .query_map([], |row| {
                Ok(Album {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    artist_id: row.get(2)?,
                    genre: row.get(3)?,
                    release_year: row.get(4)?,
                    owner_id: row.get(5)?,
                })
            })
            .context("Cannot query albums")?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    fn list_all_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, genre, owner_id FROM artists ORDER BY rowid")?;
        let artists = stmt
            .query_map([], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    genre: row.get(2)?,
                    owner_id: row.get(3)?,
                })
            })
            .context("Cannot query artists")?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    fn list_songs_by_artist(&self, artist_id: &str) -> Result<Vec<Song>> {
        self.query_songs(
            &format!("SELECT {SONG_COLUMNS} FROM songs WHERE artist_id = ?1 ORDER BY rowid"),
            [artist_id],
        )
    }
}
