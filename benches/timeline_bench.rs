//! Benchmarks for replaying games into heatmap timelines.
//!
//! Run with: cargo bench --bench timeline_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pgn_heatmap::render::raster::rasterize;
use pgn_heatmap::{
    parse_game_str, parse_timelines_native, HeatmapConfig, HeatmapSession, TimelineBuilder,
};
use std::hint::black_box;

const IMMORTAL_GAME: &str = r#"[Event "London"]
[White "Anderssen"]
[Black "Kieseritzky"]
[Result "1-0"]

1. e4 e5 2. f4 exf4 3. Bc4 Qh4+ 4. Kf1 b5 5. Bxb5 Nf6 6. Nf3 Qh6 7. d3 Nh5
8. Nh4 Qg5 9. Nf5 c6 10. g4 Nf6 11. Rg1 cxb5 12. h4 Qg6 13. h5 Qg5 14. Qf3 Ng8
15. Bxf4 Qf6 16. Nc3 Bc5 17. Nd5 Qxb2 18. Bd6 Bxg1 19. e5 Qxa1+ 20. Ke2 Na6
21. Nxg7+ Kd8 22. Qf6+ Nxf6 23. Be7# 1-0"#;

fn bench_parse_and_build(c: &mut Criterion) {
    c.bench_function("timeline/parse", |b| {
        b.iter(|| parse_game_str(black_box(IMMORTAL_GAME)))
    });

    let game = parse_game_str(IMMORTAL_GAME).expect("benchmark game parses");
    let builder = TimelineBuilder::default();
    c.bench_function("timeline/build", |b| b.iter(|| builder.build(black_box(&game))));
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline/parallel");
    let builder = TimelineBuilder::default();

    for n in [16, 128, 1024] {
        let pgns: Vec<String> = std::iter::repeat(IMMORTAL_GAME.to_string()).take(n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &pgns, |b, pgns| {
            b.iter(|| parse_timelines_native(black_box(pgns), &builder, None))
        });
    }

    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let game = parse_game_str(IMMORTAL_GAME).expect("benchmark game parses");
    let timeline = TimelineBuilder::default().build(&game).expect("benchmark game is legal");
    let session = HeatmapSession::new(timeline, &HeatmapConfig::default()).expect("start move 0");

    c.bench_function("frame/session", |b| {
        b.iter(|| session.frame_at(black_box(20), Some(0.25)))
    });

    let frame = session.frame_at(20, Some(0.25)).expect("position 20 exists");
    c.bench_function("frame/rasterize_64px", |b| {
        b.iter(|| rasterize(black_box(&frame), 64))
    });
}

criterion_group!(benches, bench_parse_and_build, bench_parallel, bench_frames);
criterion_main!(benches);
