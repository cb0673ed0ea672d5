use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use linkshelf::classify::ClassificationEngine;
use linkshelf::config::ScanConfig;
use linkshelf::parser::parse;
use linkshelf::tracking::DirectoryScanner;
use std::fs;
use std::hint::black_box;
use tempfile::tempdir;

const NAMES: &[&str] = &[
    "Show.Name.S02E05.1080p.WEB-DL.x264-GROUP.mkv",
    "Movie Title (2021) [tmdb-12345].mkv",
    "2001.A.Space.Odyssey.1968.1080p.BluRay.mkv",
    "[SubsPlease] Some Show - 05 [1080p].mkv",
    "Some Show 3x07 Title.avi",
    "Plain Name.mkv",
];

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for name in NAMES {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| parse(black_box(name)));
        });
    }
    group.finish();
}

fn benchmark_classify(c: &mut Criterion) {
    let engine = ClassificationEngine::default();
    c.bench_function("classify_batch", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(engine.classify(black_box(name)));
            }
        });
    });
}

fn benchmark_scan(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    for show in 0..20 {
        let season = dir.path().join(format!("Show {show}/Season 1"));
        fs::create_dir_all(&season).unwrap();
        for episode in 1..=10 {
            fs::write(season.join(format!("Show.{show}.S01E{episode:02}.mkv")), b"x").unwrap();
            fs::write(season.join(format!("Show.{show}.S01E{episode:02}.nfo")), b"x").unwrap();
        }
    }

    let scanner = DirectoryScanner::from_config(&ScanConfig::default());
    c.bench_function("scan_200_media_files", |b| {
        b.iter(|| scanner.scan(black_box(dir.path())).unwrap());
    });
}

criterion_group!(benches, benchmark_parse, benchmark_classify, benchmark_scan);
criterion_main!(benches);
