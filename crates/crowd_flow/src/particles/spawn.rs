use std::collections::BTreeMap;

use bevy::prelude::*;
use rand::Rng;

use super::ParticleSwarm;
use crate::config::{FlowParams, SPAWN_JITTER};
use crate::frames::Phase;
use crate::geometry::{jitter, nearest_exit, sample_interior};
use crate::venue::VenuePlan;

/// A spawn point on the plan with the forecast load routed through it.
#[derive(Debug, Clone, PartialEq)]
pub struct GateSpawn {
    pub position: Vec2,
    pub load: f64,
}

/// Dots for one gate: `round(load / people_per_dot)` clamped to the per-gate
/// range. Density is not proportional outside the range: small loads still
/// show a visible flow and large ones are capped.
pub fn dots_for_load(load: f64, params: &FlowParams) -> usize {
    let raw = (load.max(0.0) / params.people_per_dot).round() as usize;
    raw.max(params.min_dots_per_gate).min(params.max_dots_per_gate)
}

/// Total exit-phase dots for `exit_count` exits.
pub fn exit_dot_budget(total_load: f64, exit_count: usize, params: &FlowParams) -> usize {
    let raw = (total_load.max(0.0) / params.people_per_dot).round() as usize;
    // An inverted range yields the max instead of panicking.
    raw.max(exit_count * params.min_dots_per_gate)
        .min(exit_count * params.max_dots_per_gate)
}

/// Split `total` across `weights` proportionally with largest-remainder
/// rounding, so the shares always sum to exactly `total`. Zero or negative
/// total weight splits uniformly.
pub fn apportion(total: usize, weights: &[f64]) -> Vec<usize> {
    if weights.is_empty() {
        return Vec::new();
    }
    let weight_sum: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    let quotas: Vec<f64> = if weight_sum > 0.0 {
        weights
            .iter()
            .map(|w| total as f64 * w.max(0.0) / weight_sum)
            .collect()
    } else {
        vec![total as f64 / weights.len() as f64; weights.len()]
    };

    let mut shares: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let assigned: usize = shares.iter().sum();
    let mut by_remainder: Vec<usize> = (0..weights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in by_remainder.iter().take(total.saturating_sub(assigned)) {
        shares[i] += 1;
    }
    shares
}

/// Where arrivals particles appear, one entry per gate.
///
/// Every plan exit is a gate; each forecast gate's load is added to the exit it
/// resolves to (unmatched gates land on the first exit). Forecast gates keyed
/// by a facility id spawn at that facility instead. Without exits, each
/// forecast gate spawns at the viewport centre.
pub fn gate_spawn_points(plan: &VenuePlan, gate_loads: &BTreeMap<String, f64>) -> Vec<GateSpawn> {
    let mut spawns: Vec<GateSpawn> = plan
        .exits
        .iter()
        .map(|e| GateSpawn {
            position: e.position,
            load: 0.0,
        })
        .collect();
    let exit_count = spawns.len();

    for (gate, &load) in gate_loads {
        let is_exit = plan.exits.iter().any(|e| &e.id == gate);
        let facility = plan.facilities.iter().find(|f| &f.id == gate);
        match (is_exit, facility, plan.resolve_gate(gate)) {
            (false, Some(f), _) => spawns.push(GateSpawn {
                position: f.position,
                load,
            }),
            (_, _, Some(i)) => spawns[i].load += load,
            (_, _, None) => spawns.push(GateSpawn {
                position: FlowParams::viewport_center(),
                load,
            }),
        }
    }
    debug_assert!(spawns.len() >= exit_count);
    spawns
}

impl ParticleSwarm {
    /// Spawn arrivals-phase particles for one frame.
    ///
    /// Each gate emits `dots_for_load(load)` particles at its position plus a
    /// small jitter, each heading for the centroid of a uniformly chosen zone.
    /// Returns how many were spawned.
    pub fn spawn_arrivals(
        &mut self,
        plan: &VenuePlan,
        gate_loads: &BTreeMap<String, f64>,
        now_ms: f64,
        params: &FlowParams,
    ) -> usize {
        if plan.zones.is_empty() {
            return 0;
        }
        let centroids: Vec<Vec2> = plan.zones.iter().map(|z| z.centroid()).collect();
        let gates = gate_spawn_points(plan, gate_loads);

        let mut spawned = 0;
        for gate in &gates {
            let dots = dots_for_load(gate.load, params);
            for _ in 0..dots {
                let position = gate.position + jitter(&mut self.rng.0, SPAWN_JITTER);
                let target = centroids[self.rng.0.gen_range(0..centroids.len())];
                self.push(position, target, now_ms, Phase::Arrivals, params);
            }
            spawned += dots;
        }
        self.enforce_cap(params.particle_cap);
        debug!("Spawned {} arrivals particles across {} gates", spawned, gates.len());
        spawned
    }

    /// Spawn exits-phase particles for one frame.
    ///
    /// The frame's total load sets the dot budget, which is split across zones
    /// by congestion weight. Each particle starts at a random point inside its
    /// zone and heads for the nearest exit. Returns how many were spawned.
    pub fn spawn_exits(
        &mut self,
        plan: &VenuePlan,
        congestion_by_zone: &BTreeMap<String, u8>,
        total_load: f64,
        now_ms: f64,
        params: &FlowParams,
    ) -> usize {
        let exits = plan.exit_positions();
        let budget = exit_dot_budget(total_load, exits.len(), params);
        if budget == 0 || plan.zones.is_empty() {
            return 0;
        }
        let weights: Vec<f64> = plan
            .zones
            .iter()
            .map(|z| f64::from(congestion_by_zone.get(&z.id).copied().unwrap_or(0)))
            .collect();
        let shares = apportion(budget, &weights);

        for (zone, &share) in plan.zones.iter().zip(&shares) {
            for _ in 0..share {
                let position = sample_interior(&zone.points, &mut self.rng.0);
                let target = nearest_exit(&exits, position);
                self.push(position, target, now_ms, Phase::Exits, params);
            }
        }
        self.enforce_cap(params.particle_cap);
        debug!("Spawned {} exits particles across {} zones", budget, plan.zones.len());
        budget
    }
}
