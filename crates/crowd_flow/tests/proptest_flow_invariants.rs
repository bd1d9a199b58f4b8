//! Property-based invariant tests for frame building, spawning and playback.
//!
//! 1. Congestion is always within 0..=100
//! 2. Arrivals frames precede exits frames, each strictly time-ascending
//! 3. Frame building is idempotent
//! 4. Arrivals dots per gate stay within the per-gate range
//! 5. Exit-phase dots stay within the exit-count range
//! 6. Interior samples of a convex polygon land inside it
//! 7. Step never leaves the timeline
//! 8. Scrub end restores the pre-scrub mode

use std::collections::BTreeMap;

use bevy::prelude::Vec2;
use proptest::prelude::*;

use crowd_flow::frames::build_frames;
use crowd_flow::geometry::{point_in_polygon, sample_interior};
use crowd_flow::particles::{dots_for_load, exit_dot_budget};
use crowd_flow::rng::FlowRng;
use crowd_flow::{
    Exit, FlowParams, Forecast, ForecastPoint, ParticleSwarm, Phase, PlaybackController,
    PlaybackMode, VenuePlan, Zone,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn square(id: String, x: f32) -> Zone {
    Zone {
        id,
        name: String::new(),
        layer: 1,
        points: vec![
            Vec2::new(x, 10.0),
            Vec2::new(x + 8.0, 10.0),
            Vec2::new(x + 8.0, 40.0),
            Vec2::new(x, 40.0),
        ],
    }
}

fn plan(zone_count: usize, exit_count: usize) -> VenuePlan {
    VenuePlan {
        sections: zone_count as u32,
        layers: 1,
        zones: (0..zone_count)
            .map(|i| square(format!("z{i}"), 5.0 + i as f32 * 9.0))
            .collect(),
        exits: (0..exit_count)
            .map(|i| Exit {
                id: format!("gate-{i}"),
                name: String::new(),
                position: Vec2::new(i as f32 * 10.0, 60.0),
                capacity: None,
            })
            .collect(),
        facilities: Vec::new(),
    }
}

/// One gate's series: `loads[i]` at 18:00 + 5 * minute_steps[i].
fn series(minute_offsets: &[u32], loads: &[f64]) -> Vec<ForecastPoint> {
    minute_offsets
        .iter()
        .zip(loads)
        .map(|(m, &yhat)| {
            let minute = 18 * 60 + m * 5;
            ForecastPoint::new(
                format!("2024-06-01T{:02}:{:02}:00", minute / 60, minute % 60),
                yhat,
            )
        })
        .collect()
}

fn forecast_strategy() -> impl Strategy<Value = Forecast> {
    let gate_series = (
        prop::collection::vec(0u32..60, 1..12),
        prop::collection::vec(-100.0f64..1e6, 12),
    )
        .prop_map(|(offsets, loads)| series(&offsets, &loads));
    (
        prop::collection::btree_map("gate-[0-3]", gate_series.clone(), 0..4),
        prop::collection::btree_map("gate-[0-3]", gate_series, 0..4),
    )
        .prop_map(|(arrivals, exits)| Forecast { arrivals, exits })
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Frame building
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn congestion_bounded(forecast in forecast_strategy(), zones in 1usize..8) {
        let frames = build_frames(&plan(zones, 2), &forecast);
        for frame in &frames {
            prop_assert_eq!(frame.congestion_by_zone.len(), zones);
            for (id, &c) in &frame.congestion_by_zone {
                prop_assert!(c <= 100, "zone {} congestion {}", id, c);
            }
        }
    }

    #[test]
    fn phases_ordered_and_ascending(forecast in forecast_strategy()) {
        let frames = build_frames(&plan(3, 2), &forecast);
        let first_exit = frames.iter().position(|f| f.phase == Phase::Exits).unwrap_or(frames.len());
        prop_assert!(frames[..first_exit].iter().all(|f| f.phase == Phase::Arrivals));
        prop_assert!(frames[first_exit..].iter().all(|f| f.phase == Phase::Exits));
        for pair in frames[..first_exit].windows(2).chain(frames[first_exit..].windows(2)) {
            prop_assert!(pair[0].time_key < pair[1].time_key);
        }
    }

    #[test]
    fn frame_building_idempotent(forecast in forecast_strategy()) {
        let p = plan(4, 2);
        prop_assert_eq!(build_frames(&p, &forecast), build_frames(&p, &forecast));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-6. Spawning and geometry
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arrivals_dots_per_gate_in_range(load in -1e3f64..1e7) {
        let params = FlowParams::default();
        let dots = dots_for_load(load, &params);
        prop_assert!((params.min_dots_per_gate..=params.max_dots_per_gate).contains(&dots));
    }

    #[test]
    fn exit_dots_in_range(
        total_load in 0.0f64..1e7,
        exit_count in 1usize..6,
        congestion in prop::collection::vec(0u8..=100, 3),
        seed in any::<u64>(),
    ) {
        let params = FlowParams::default();
        let p = plan(3, exit_count);
        let by_zone: BTreeMap<String, u8> = p
            .zones
            .iter()
            .zip(&congestion)
            .map(|(z, &c)| (z.id.clone(), c))
            .collect();
        let mut swarm = ParticleSwarm::new(seed);
        let spawned = swarm.spawn_exits(&p, &by_zone, total_load, 0.0, &params);
        prop_assert_eq!(spawned, exit_dot_budget(total_load, exit_count, &params));
        prop_assert_eq!(swarm.len(), spawned);
        prop_assert!(spawned >= exit_count * params.min_dots_per_gate);
        prop_assert!(spawned <= exit_count * params.max_dots_per_gate);
    }

    #[test]
    fn convex_samples_inside(
        cx in 10.0f32..90.0,
        cy in 10.0f32..50.0,
        r in 1.0f32..10.0,
        sides in 3usize..9,
        seed in any::<u64>(),
    ) {
        let polygon: Vec<Vec2> = (0..sides)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / sides as f32;
                Vec2::new(cx + r * a.cos(), cy + r * a.sin())
            })
            .collect();
        let mut rng = FlowRng::from_seed_u64(seed);
        for _ in 0..200 {
            let p = sample_interior(&polygon, &mut rng.0);
            prop_assert!(p.is_finite());
            prop_assert!(point_in_polygon(p, &polygon), "{:?} outside", p);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7-8. Playback
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn step_stays_in_timeline(
        frame_count in 1usize..50,
        steps in prop::collection::vec(-60i64..60, 0..40),
    ) {
        let mut c = PlaybackController::new(frame_count);
        for delta in steps {
            c.step(delta);
            prop_assert!(c.frame_index() < frame_count);
        }
        c.seek(frame_count - 1);
        prop_assert!(!c.step(1));
        c.seek(0);
        prop_assert!(!c.step(-1));
    }

    #[test]
    fn scrub_restores_mode(
        frame_count in 2usize..50,
        pause_first in any::<bool>(),
        seeks in prop::collection::vec(0usize..80, 0..10),
    ) {
        let mut c = PlaybackController::new(frame_count);
        c.play();
        if pause_first {
            c.pause();
        }
        let before = c.mode();
        c.scrub_start();
        for s in seeks {
            c.seek(s);
            prop_assert!(!c.advance());
        }
        c.scrub_end();
        prop_assert_eq!(c.mode(), before);
        let expected = if pause_first { PlaybackMode::Paused } else { PlaybackMode::Playing };
        prop_assert_eq!(before, expected);
    }
}
