use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Width of the normalized venue coordinate space (percentage units).
pub const VIEWPORT_WIDTH: f32 = 100.0;
/// Height of the normalized venue coordinate space. The floor plan is drawn
/// into a 16:10 viewport, so the vertical extent is 62.5 units.
pub const VIEWPORT_HEIGHT: f32 = 62.5;

/// How many people a single particle stands for.
pub const PEOPLE_PER_DOT: f64 = 10.0;
pub const MIN_DOTS_PER_GATE: usize = 30;
pub const MAX_DOTS_PER_GATE: usize = 40;

/// Particle speed in viewport units per millisecond (~12 units/s).
pub const PARTICLE_SPEED: f32 = 0.012;
/// Hard lifetime of a particle, independent of reaching its target.
pub const TIME_TO_LIVE_MS: f64 = 7000.0;
/// Upper bound on live particles; the oldest are dropped first.
pub const PARTICLE_CAP: usize = 2000;
/// A particle closer than this to its target counts as arrived.
pub const ARRIVAL_EPSILON: f32 = 0.6;
/// Maximum jitter applied around a gate or a degenerate polygon.
pub const SPAWN_JITTER: f32 = 1.0;

/// Bounding-box draws before `sample_interior` gives up and uses the centroid.
pub const SAMPLE_ATTEMPTS: usize = 20;

/// Wall-clock milliseconds per forecast bucket while playing.
pub const STEP_INTERVAL_MS: f64 = 900.0;
/// Bucket size assumed when the forecast has too few points to infer one.
pub const DEFAULT_BUCKET_MINUTES: u32 = 5;

/// Stable per-zone multiplier range used to spread congestion around the trend.
pub const ZONE_MULTIPLIER_MIN: f64 = 0.75;
pub const ZONE_MULTIPLIER_MAX: f64 = 1.15;

const DEFAULT_SEED: u64 = 42;

/// Runtime-tunable engine parameters.
///
/// Every field defaults to the matching constant above, so a host can
/// override a subset from JSON (`{"step_interval_ms": 600}`) and keep the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    pub people_per_dot: f64,
    pub min_dots_per_gate: usize,
    pub max_dots_per_gate: usize,
    /// Viewport units per millisecond.
    pub speed: f32,
    pub time_to_live_ms: f64,
    pub particle_cap: usize,
    pub arrival_epsilon: f32,
    pub step_interval_ms: f64,
    /// Seed for the particle RNG. Identical seeds give identical particle runs.
    pub seed: u64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            people_per_dot: PEOPLE_PER_DOT,
            min_dots_per_gate: MIN_DOTS_PER_GATE,
            max_dots_per_gate: MAX_DOTS_PER_GATE,
            speed: PARTICLE_SPEED,
            time_to_live_ms: TIME_TO_LIVE_MS,
            particle_cap: PARTICLE_CAP,
            arrival_epsilon: ARRIVAL_EPSILON,
            step_interval_ms: STEP_INTERVAL_MS,
            seed: DEFAULT_SEED,
        }
    }
}

impl FlowParams {
    /// Parse a (possibly partial) parameter document.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject parameter sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.min_dots_per_gate > self.max_dots_per_gate {
            return Err(FlowError::InvalidParams(format!(
                "min_dots_per_gate ({}) exceeds max_dots_per_gate ({})",
                self.min_dots_per_gate, self.max_dots_per_gate
            )));
        }
        if self.people_per_dot <= 0.0 {
            return Err(FlowError::InvalidParams(
                "people_per_dot must be positive".to_string(),
            ));
        }
        if self.speed <= 0.0 || self.step_interval_ms <= 0.0 {
            return Err(FlowError::InvalidParams(
                "speed and step_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Viewport centre, used as a spawn point when a plan has no exits.
    pub fn viewport_center() -> Vec2 {
        Vec2::new(VIEWPORT_WIDTH / 2.0, VIEWPORT_HEIGHT / 2.0)
    }
}
