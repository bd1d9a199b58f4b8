mod motion;
mod spawn;

pub use spawn::{apportion, dots_for_load, exit_dot_budget, gate_spawn_points, GateSpawn};

use bevy::prelude::*;
use serde::Serialize;

use crate::config::FlowParams;
use crate::frames::Phase;
use crate::rng::FlowRng;

/// One animated marker standing for `people_per_dot` people.
///
/// Velocity is fixed at spawn as the unit vector toward `target` scaled by the
/// configured speed. Particles never re-target: a frame change mid-flight does
/// not redirect the ones already moving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: u64,
    pub position: Vec2,
    pub target: Vec2,
    /// Viewport units per millisecond.
    pub velocity: Vec2,
    /// Engine time (ms) at spawn.
    pub born_at: f64,
    pub time_to_live: f64,
    pub phase: Phase,
}

impl Particle {
    pub fn new(
        id: u64,
        position: Vec2,
        target: Vec2,
        speed: f32,
        born_at: f64,
        time_to_live: f64,
        phase: Phase,
    ) -> Self {
        Self {
            id,
            position,
            target,
            velocity: (target - position).normalize_or_zero() * speed,
            born_at,
            time_to_live,
            phase,
        }
    }

    pub fn has_arrived(&self, epsilon: f32) -> bool {
        self.position.distance_squared(self.target) < epsilon * epsilon
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.born_at > self.time_to_live
    }
}

/// The live particle population. Exclusively owned by the engine; renderers
/// get snapshots.
#[derive(Debug, Clone, Default)]
pub struct ParticleSwarm {
    particles: Vec<Particle>,
    next_id: u64,
    rng: FlowRng,
}

impl ParticleSwarm {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            next_id: 0,
            rng: FlowRng::from_seed_u64(seed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Owned copy for a renderer.
    pub fn snapshot(&self) -> Vec<Particle> {
        self.particles.clone()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn count_phase(&self, phase: Phase) -> usize {
        self.particles.iter().filter(|p| p.phase == phase).count()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn push(&mut self, position: Vec2, target: Vec2, now_ms: f64, phase: Phase, params: &FlowParams) {
        let id = self.next_id;
        self.next_id += 1;
        self.particles.push(Particle::new(
            id,
            position,
            target,
            params.speed,
            now_ms,
            params.time_to_live_ms,
            phase,
        ));
    }

    /// Keep only the most recent `cap` particles, dropping the oldest.
    fn enforce_cap(&mut self, cap: usize) {
        if self.particles.len() > cap {
            let excess = self.particles.len() - cap;
            self.particles.drain(..excess);
            debug!("Particle cap {} reached, dropped {} oldest", cap, excess);
        }
    }
}
