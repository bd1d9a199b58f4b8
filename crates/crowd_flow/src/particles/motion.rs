use super::{Particle, ParticleSwarm};
use crate::config::FlowParams;

impl Particle {
    /// Move along the fixed velocity for `dt_ms`. A step that would carry the
    /// particle past its target lands on the target instead.
    pub fn step(&mut self, dt_ms: f64) {
        let delta = self.velocity * dt_ms as f32;
        let remaining = self.target - self.position;
        if delta.length_squared() >= remaining.length_squared() {
            self.position = self.target;
        } else {
            self.position += delta;
        }
    }
}

impl ParticleSwarm {
    /// One motion tick: move every particle, then retire those that reached
    /// their target or outlived their TTL. Returns the number retired.
    pub fn advance(&mut self, now_ms: f64, dt_ms: f64, params: &FlowParams) -> usize {
        let before = self.particles.len();
        for particle in &mut self.particles {
            particle.step(dt_ms);
        }
        self.particles
            .retain(|p| !p.has_arrived(params.arrival_epsilon) && !p.is_expired(now_ms));
        before - self.particles.len()
    }
}
