//! Discrete timeline of forecast frames with per-zone congestion.
//!
//! Arrivals and exits are aggregated independently and then concatenated
//! phase by phase: every arrivals frame comes first, in ascending time, then
//! every exits frame in ascending time. Overlapping arrival and exit windows
//! are therefore not interleaved by wall-clock time.
//!
//! Congestion per zone is `round(100 * clamp01(norm * m))`, where `norm` is the
//! frame's total load over the peak load of both series and `m` is a fixed
//! per-zone multiplier in `[0.75, 1.15]` hashed from the zone id.

use std::collections::BTreeMap;

use bevy::prelude::*;
use chrono::NaiveDateTime;
use serde::Serialize;
use xxhash_rust::xxh32::xxh32;

use crate::config::{ZONE_MULTIPLIER_MAX, ZONE_MULTIPLIER_MIN};
use crate::forecast::{aggregate_bands, native_bucket_minutes, Forecast, LoadBand, TimeKey};
use crate::venue::VenuePlan;

/// Which forecast series a frame was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Arrivals,
    Exits,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Arrivals => "arrivals",
            Phase::Exits => "exits",
        }
    }
}

/// Colour band for a congestion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CongestionLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl CongestionLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..=39 => CongestionLevel::Low,
            40..=69 => CongestionLevel::Moderate,
            70..=89 => CongestionLevel::High,
            _ => CongestionLevel::Critical,
        }
    }
}

/// One step of the timeline. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time_key: TimeKey,
    pub phase: Phase,
    /// Aggregate load of all gates at this key.
    pub total_load: f64,
    /// Summed model bounds, carried for display only.
    pub load_lower: Option<f64>,
    pub load_upper: Option<f64>,
    /// Zone id → congestion in `0..=100`.
    pub congestion_by_zone: BTreeMap<String, u8>,
}

impl Frame {
    pub fn time(&self) -> NaiveDateTime {
        self.time_key.datetime()
    }

    pub fn congestion(&self, zone_id: &str) -> u8 {
        self.congestion_by_zone.get(zone_id).copied().unwrap_or(0)
    }

    pub fn congestion_level(&self, zone_id: &str) -> CongestionLevel {
        CongestionLevel::from_percent(self.congestion(zone_id))
    }
}

/// What the renderer and scrubber read for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub time_label: String,
    pub phase: Phase,
    pub congestion_by_zone: BTreeMap<String, u8>,
}

/// Deterministic per-zone multiplier in `[ZONE_MULTIPLIER_MIN, ZONE_MULTIPLIER_MAX)`.
///
/// A pure hash of the id: no seed, no state, identical across runs.
pub fn stable_multiplier(zone_id: &str) -> f64 {
    let h = xxh32(zone_id.as_bytes(), 0);
    let unit = f64::from(h % 10_000) / 10_000.0;
    ZONE_MULTIPLIER_MIN + unit * (ZONE_MULTIPLIER_MAX - ZONE_MULTIPLIER_MIN)
}

/// Congestion percentage of one zone for a normalized load.
pub fn zone_congestion(norm: f64, zone_id: &str) -> u8 {
    (100.0 * (norm * stable_multiplier(zone_id)).clamp(0.0, 1.0)).round() as u8
}

/// Build the ordered frame list for a plan and forecast.
pub fn build_frames(plan: &VenuePlan, forecast: &Forecast) -> Vec<Frame> {
    let arrivals = aggregate_bands(&forecast.arrivals);
    let exits = aggregate_bands(&forecast.exits);

    let max_load = arrivals
        .values()
        .chain(exits.values())
        .map(|b| b.total)
        .fold(0.0_f64, f64::max)
        .max(1.0);

    // BTreeMap iteration is already ascending by key within each phase.
    let rows = arrivals
        .into_iter()
        .map(|(k, b)| (Phase::Arrivals, k, b))
        .chain(exits.into_iter().map(|(k, b)| (Phase::Exits, k, b)));

    rows.map(|(phase, time_key, band): (Phase, TimeKey, LoadBand)| {
        let norm = band.total / max_load;
        let congestion_by_zone = plan
            .zones
            .iter()
            .map(|z| (z.id.clone(), zone_congestion(norm, &z.id)))
            .collect();
        Frame {
            time_key,
            phase,
            total_load: band.total,
            load_lower: band.lower,
            load_upper: band.upper,
            congestion_by_zone,
        }
    })
    .collect()
}

/// The frames of one forecast load plus the figures derived alongside them.
#[derive(Debug, Clone, Default)]
pub struct FrameTimeline {
    frames: Vec<Frame>,
    max_load: f64,
    bucket_minutes: u32,
}

impl FrameTimeline {
    pub fn build(plan: &VenuePlan, forecast: &Forecast) -> Self {
        let frames = build_frames(plan, forecast);
        let max_load = frames
            .iter()
            .map(|f| f.total_load)
            .fold(0.0_f64, f64::max)
            .max(1.0);
        let bucket_minutes = native_bucket_minutes(forecast);
        info!(
            "Built {} crowd-flow frames ({} zones, peak load {:.0}, {} min buckets)",
            frames.len(),
            plan.zones.len(),
            max_load,
            bucket_minutes
        );
        Self {
            frames,
            max_load,
            bucket_minutes,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Peak aggregate load across both phases, floored at 1.
    pub fn max_load(&self) -> f64 {
        self.max_load
    }

    /// Simulated minutes represented by one step.
    pub fn bucket_minutes(&self) -> u32 {
        self.bucket_minutes
    }

    /// Index of the first frame of `phase`.
    pub fn phase_start(&self, phase: Phase) -> Option<usize> {
        self.frames.iter().position(|f| f.phase == phase)
    }

    /// Index of the frame with the highest total load (first on ties).
    pub fn peak_index(&self) -> Option<usize> {
        self.frames
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, f)| match best {
                Some((_, load)) if load >= f.total_load => best,
                _ => Some((i, f.total_load)),
            })
            .map(|(i, _)| i)
    }

    pub fn view(&self, index: usize) -> Option<FrameView> {
        self.frames.get(index).map(|f| FrameView {
            time_label: f.time_key.clock_label(),
            phase: f.phase,
            congestion_by_zone: f.congestion_by_zone.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastPoint;
    use crate::venue::Zone;

    fn plan_with(ids: &[&str]) -> VenuePlan {
        VenuePlan {
            zones: ids
                .iter()
                .map(|id| Zone {
                    id: id.to_string(),
                    name: id.to_string(),
                    layer: 1,
                    points: vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)],
                })
                .collect(),
            ..Default::default()
        }
    }

    fn forecast(arrivals: &[(&str, f64)], exits: &[(&str, f64)]) -> Forecast {
        let to_series = |pts: &[(&str, f64)]| {
            let mut s = crate::forecast::GateSeries::new();
            s.insert(
                "A".to_string(),
                pts.iter().map(|(ds, y)| ForecastPoint::new(*ds, *y)).collect(),
            );
            s
        };
        Forecast {
            arrivals: to_series(arrivals),
            exits: to_series(exits),
        }
    }

    #[test]
    fn test_stable_multiplier_in_range_and_pure() {
        for i in 0..500 {
            let id = format!("zone-{i}");
            let m = stable_multiplier(&id);
            assert!((ZONE_MULTIPLIER_MIN..=ZONE_MULTIPLIER_MAX).contains(&m), "{id}: {m}");
            assert_eq!(m, stable_multiplier(&id));
        }
    }

    #[test]
    fn test_stable_multiplier_varies_between_zones() {
        let distinct: std::collections::HashSet<u64> = (0..50)
            .map(|i| stable_multiplier(&format!("z{i}")).to_bits())
            .collect();
        assert!(distinct.len() > 10);
    }

    #[test]
    fn test_zone_congestion_clamped() {
        assert_eq!(zone_congestion(0.0, "z"), 0);
        assert_eq!(zone_congestion(5.0, "z"), 100);
    }

    #[test]
    fn test_arrivals_precede_exits_even_when_overlapping() {
        // Exits start before the last arrival; still emitted afterwards.
        let f = forecast(
            &[("2024-06-01T18:00", 100.0), ("2024-06-01T21:00", 50.0)],
            &[("2024-06-01T20:00", 80.0), ("2024-06-01T20:30", 20.0)],
        );
        let frames = build_frames(&plan_with(&["z"]), &f);
        let phases: Vec<Phase> = frames.iter().map(|f| f.phase).collect();
        assert_eq!(
            phases,
            vec![Phase::Arrivals, Phase::Arrivals, Phase::Exits, Phase::Exits]
        );
        assert!(frames[0].time() < frames[1].time());
        assert!(frames[2].time() < frames[3].time());
        assert!(frames[1].time() > frames[2].time());
    }

    #[test]
    fn test_zero_load_gives_zero_congestion() {
        let f = forecast(&[("2024-06-01T18:00", 0.0)], &[]);
        let frames = build_frames(&plan_with(&["a", "b"]), &f);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].congestion_by_zone.values().all(|&c| c == 0));
        assert_eq!(frames[0].congestion_level("a"), CongestionLevel::Low);
    }

    #[test]
    fn test_congestion_scales_with_load() {
        let f = forecast(
            &[("2024-06-01T18:00", 100.0), ("2024-06-01T18:05", 400.0)],
            &[],
        );
        let frames = build_frames(&plan_with(&["z"]), &f);
        assert!(frames[0].congestion("z") < frames[1].congestion("z"));
        assert_eq!(
            frames[0].congestion("z"),
            zone_congestion(0.25, "z")
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let f = forecast(
            &[("2024-06-01T18:00", 120.0), ("2024-06-01T18:05", 340.0)],
            &[("2024-06-01T22:00", 260.0)],
        );
        let plan = plan_with(&["north", "south", "east"]);
        assert_eq!(build_frames(&plan, &f), build_frames(&plan, &f));
    }

    #[test]
    fn test_timeline_helpers() {
        let f = forecast(
            &[("2024-06-01T18:00", 120.0), ("2024-06-01T18:05", 340.0)],
            &[("2024-06-01T22:00", 260.0)],
        );
        let timeline = FrameTimeline::build(&plan_with(&["z"]), &f);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.phase_start(Phase::Arrivals), Some(0));
        assert_eq!(timeline.phase_start(Phase::Exits), Some(2));
        assert_eq!(timeline.peak_index(), Some(1));
        assert!((timeline.max_load() - 340.0).abs() < 1e-9);
        assert_eq!(timeline.bucket_minutes(), 5);

        let view = timeline.view(2).unwrap();
        assert_eq!(view.time_label, "22:00");
        assert_eq!(view.phase, Phase::Exits);
        assert!(timeline.view(3).is_none());
    }

    #[test]
    fn test_congestion_levels() {
        assert_eq!(CongestionLevel::from_percent(0), CongestionLevel::Low);
        assert_eq!(CongestionLevel::from_percent(40), CongestionLevel::Moderate);
        assert_eq!(CongestionLevel::from_percent(85), CongestionLevel::High);
        assert_eq!(CongestionLevel::from_percent(100), CongestionLevel::Critical);
    }
}
