//! # Encore Performance Benchmarks
//!
//! - **Scoring**: per-item affinity and discovery scoring
//! - **Generation**: full recommendation passes over a synthetic catalog
//! - **Snapshots**: encoding a populated store
//!
//! ```bash
//! cargo bench
//! cargo bench generation
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use encore::algorithm::{self, Affinity};
use encore::catalog::{Album, Artist, MemoryCatalog, Song};
use encore::profile::PreferenceProfile;
use encore::recommend::RecommendationKind;
use encore::service::MusicRecommender;
use encore::snapshot::{self, SnapshotScope};
use std::hint::black_box;

const GENRES: [&str; 8] = ["Rock", "Jazz", "Pop", "Folk", "Metal", "Soul", "Ambient", "Blues"];

/// `songs` songs spread over 50 artists with 4 albums each.
fn synthetic_catalog(songs: usize) -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    for a in 0..50 {
        catalog.add_artist(Artist {
            id: format!("a{a}"),
            name: format!("Artist {a}"),
            ..Default::default()
        });
        for b in 0..4 {
            catalog.add_album(Album {
                id: format!("al{a}-{b}"),
                title: format!("Album {a}-{b}"),
                artist_id: Some(format!("a{a}")),
                genre: Some(GENRES[(a + b) % GENRES.len()].to_string()),
                ..Default::default()
            });
        }
    }
    for s in 0..songs {
        let a = s % 50;
        let b = (s / 50) % 4;
        catalog.add_song(Song {
            id: format!("s{s}"),
            title: format!("Song {s}"),
            artist_id: Some(format!("a{a}")),
            album_id: Some(format!("al{a}-{b}")),
            genre: Some(GENRES[s % GENRES.len()].to_string()),
            ..Default::default()
        });
    }
    catalog
}

fn listened_recommender(songs: usize) -> MusicRecommender<MemoryCatalog> {
    let recommender = MusicRecommender::new(synthetic_catalog(songs));
    for s in (0..songs).step_by(7) {
        recommender.record_play("bench", &format!("s{s}"));
    }
    recommender.adjust_genre_preference("bench", "Metal", -3);
    recommender
}

fn benchmark_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let catalog = synthetic_catalog(1000);
    let songs: Vec<Song> = {
        use encore::catalog::Catalog;
        catalog.list_all_songs().unwrap_or_default()
    };
    let mut profile = PreferenceProfile::new();
    for (i, genre) in GENRES.iter().enumerate() {
        profile.adjust_genre(genre, i as i64 - 2);
    }
    for a in (0..50).step_by(3) {
        profile.adjust_artist(&format!("a{a}"), 2);
    }

    group.bench_function("genre_affinity_1000_songs", |b| {
        b.iter(|| {
            songs
                .iter()
                .map(|song| algorithm::score_song(song, Affinity::Genre, black_box(&profile)))
                .sum::<i64>()
        });
    });

    group.bench_function("artist_discovery_20_songs", |b| {
        let artist_songs = &songs[..20];
        b.iter(|| algorithm::artist_discovery(black_box(artist_songs), black_box(&profile)));
    });

    group.finish();
}

fn benchmark_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    for size in [100, 1000, 5000] {
        let recommender = listened_recommender(size);
        for kind in RecommendationKind::ALL {
            group.bench_with_input(BenchmarkId::new(kind.as_str(), size), &kind, |b, &kind| {
                b.iter(|| recommender.recommend(black_box("bench"), kind, 20));
            });
        }
    }

    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let recommender = listened_recommender(1000);
    c.bench_function("snapshot_encode_all", |b| {
        b.iter(|| snapshot::encode(black_box(recommender.store()), &SnapshotScope::All));
    });
}

criterion_group!(benches, benchmark_scoring, benchmark_generation, benchmark_snapshot);
criterion_main!(benches);
