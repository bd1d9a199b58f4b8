//! # TestVenue: headless harness for the crowd-flow plugin
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` and [`CrowdFlowPlugin`] so
//! tests can send transport commands, advance time in fixed steps and assert
//! on the engine resource, without a window or renderer.

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::config::FlowParams;
use crate::engine::CrowdFlowEngine;
use crate::particles::Particle;
use crate::playback::PlaybackMode;
use crate::plugin::{CrowdFlowPlugin, PlaybackCommand};

/// Wall time advanced per [`TestVenue::tick`].
pub const TICK_MS: u64 = 100;

pub struct TestVenue {
    app: App,
}

impl TestVenue {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Venue running the built-in demo dataset.
    pub fn demo() -> Self {
        Self::with_plugin(CrowdFlowPlugin::default())
    }

    /// Venue built from JSON documents (falls back to the demo on bad input).
    pub fn from_json(plan_json: &str, forecast_json: &str) -> Self {
        Self::with_plugin(CrowdFlowPlugin {
            plan_json: Some(plan_json.to_string()),
            forecast_json: Some(forecast_json.to_string()),
            params: FlowParams::default(),
        })
    }

    pub fn with_plugin(plugin: CrowdFlowPlugin) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            TICK_MS,
        )));
        app.add_plugins(plugin);
        // The first update has a zero delta; run it so every later tick
        // advances exactly TICK_MS.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Queue a transport command for the next update.
    pub fn send(&mut self, command: PlaybackCommand) -> &mut Self {
        self.app.world_mut().send_event(command);
        self
    }

    /// Run `n` updates of `TICK_MS` each.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Run enough updates to cover `ms` of wall time.
    pub fn run_for_ms(&mut self, ms: u64) {
        let n = ms.div_ceil(TICK_MS);
        self.tick(u32::try_from(n).unwrap_or(u32::MAX));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn engine(&self) -> &CrowdFlowEngine {
        self.app.world().resource::<CrowdFlowEngine>()
    }

    pub fn engine_mut(&mut self) -> Mut<'_, CrowdFlowEngine> {
        self.app.world_mut().resource_mut::<CrowdFlowEngine>()
    }

    pub fn frame_index(&self) -> usize {
        self.engine().current_index()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.engine().current_mode()
    }

    pub fn particles(&self) -> &[Particle] {
        self.engine().particles()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
