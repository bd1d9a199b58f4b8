//! Venue floor plan as authored by the layout editor.
//!
//! The plan is read-only input: zones, exits and facility points in the
//! normalized 100 x 62.5 viewport space.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::geometry::{bounding_box, centroid};

/// A polygonal seating/standing area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// 1-based tier.
    #[serde(default = "default_layer")]
    pub layer: u32,
    /// Ordered polygon vertices. Fewer than 3 points is tolerated.
    #[serde(default)]
    pub points: Vec<Vec2>,
}

fn default_layer() -> u32 {
    1
}

impl Zone {
    pub fn centroid(&self) -> Vec2 {
        centroid(&self.points)
    }

    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub position: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// Toilets and other facility markers. Forecast gates may be keyed by these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub position: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VenuePlan {
    #[serde(default)]
    pub sections: u32,
    #[serde(default)]
    pub layers: u32,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(rename = "exitsList", default)]
    pub exits: Vec<Exit>,
    #[serde(rename = "toiletsList", default)]
    pub facilities: Vec<Facility>,
}

impl VenuePlan {
    /// Parse and validate a plan document.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let plan: Self = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Zone ids must be unique and there must be at least one zone. Every
    /// coordinate must be finite and every zone's bounding box must have a
    /// finite extent.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.zones.is_empty() {
            return Err(FlowError::EmptyPlan);
        }
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.id.as_str()) {
                return Err(FlowError::DuplicateZone(zone.id.clone()));
            }
            let finite_extent = bounding_box(&zone.points)
                .map_or(true, |(lo, hi)| (hi - lo).is_finite());
            if !finite_extent || !zone.points.iter().all(|p| p.is_finite()) {
                return Err(FlowError::InvalidCoordinates(format!("zone {}", zone.id)));
            }
        }
        if let Some(exit) = self.exits.iter().find(|e| !e.position.is_finite()) {
            return Err(FlowError::InvalidCoordinates(format!("exit {}", exit.id)));
        }
        if let Some(f) = self.facilities.iter().find(|f| !f.position.is_finite()) {
            return Err(FlowError::InvalidCoordinates(format!("facility {}", f.id)));
        }
        Ok(())
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn exit_positions(&self) -> Vec<Vec2> {
        self.exits.iter().map(|e| e.position).collect()
    }

    /// Index of the exit a forecast gate refers to.
    ///
    /// Tries, in order: exact id, exact name (case-insensitive), then a suffix
    /// match in either direction (`"gate-A"` ↔ `"A"`). Falls back to the first
    /// exit. `None` only when the plan has no exits.
    pub fn resolve_gate(&self, gate_id: &str) -> Option<usize> {
        if self.exits.is_empty() {
            return None;
        }
        let gate = gate_id.to_ascii_lowercase();
        let by_id = self.exits.iter().position(|e| e.id == gate_id);
        let by_name = || {
            self.exits
                .iter()
                .position(|e| !e.name.is_empty() && e.name.to_ascii_lowercase() == gate)
        };
        let by_suffix = || {
            self.exits.iter().position(|e| {
                let id = e.id.to_ascii_lowercase();
                let name = e.name.to_ascii_lowercase();
                suffix_match(&id, &gate) || (!name.is_empty() && suffix_match(&name, &gate))
            })
        };
        Some(by_id.or_else(by_name).or_else(by_suffix).unwrap_or(0))
    }

    /// Plan position for a forecast gate.
    ///
    /// Exits take precedence; a gate keyed by a facility id resolves to that
    /// facility only when no exit matches it by id. `None` when the plan has
    /// neither a matching facility nor any exit.
    pub fn gate_position(&self, gate_id: &str) -> Option<Vec2> {
        if !self.exits.iter().any(|e| e.id == gate_id) {
            if let Some(f) = self.facilities.iter().find(|f| f.id == gate_id) {
                return Some(f.position);
            }
        }
        self.resolve_gate(gate_id).map(|i| self.exits[i].position)
    }
}

/// True when one identifier ends with the other at a separator boundary
/// (or exactly), e.g. `"north-gate-3"` and `"gate-3"`.
fn suffix_match(a: &str, b: &str) -> bool {
    fn ends_at_boundary(long: &str, short: &str) -> bool {
        if short.is_empty() || !long.ends_with(short) {
            return false;
        }
        let head = &long[..long.len() - short.len()];
        head.is_empty() || head.ends_with(|c: char| !c.is_ascii_alphanumeric())
    }
    ends_at_boundary(a, b) || ends_at_boundary(b, a)
}
