//! Criterion benchmark: one `Update` of the headless crowd-flow app.
//!
//! Plays the demo timeline so both loops run, and measures a single
//! `App::update` (command intake, frame timer, spawning, motion).
//!
//! Run with: cargo bench -p crowd_flow --bench venue_tick_bench --features bench

use criterion::{criterion_group, criterion_main, Criterion};

use crowd_flow::test_harness::TestVenue;
use crowd_flow::PlaybackCommand;

fn bench_venue_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("venue_update");
    group.sample_size(50);

    let mut venue = TestVenue::demo();
    venue.send(PlaybackCommand::Play);
    // Fill the particle field before measuring.
    venue.run_for_ms(10_000);

    group.bench_function("demo_playing", |b| {
        b.iter(|| {
            // Keep the timeline from ending mid-measurement.
            if !venue.engine().is_frame_timer_running() {
                venue.send(PlaybackCommand::Play);
            }
            venue.tick(1);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_venue_update);
criterion_main!(benches);
