//! Bevy integration: the engine as a resource, transport commands as events,
//! and one `Update` system driving both loops from `Time`.
//!
//! ```text
//! Input  →  Advance
//! ```
//!
//! * **Input** – drains [`PlaybackCommand`] events into the engine.
//! * **Advance** – ticks the engine by the frame's virtual delta.

use bevy::prelude::*;

use crate::config::FlowParams;
use crate::engine::CrowdFlowEngine;

/// Ordered phases for the crowd-flow systems in `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrowdFlowSet {
    Input,
    Advance,
}

/// Transport command sent by the host UI.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Toggle,
    Step(i64),
    Seek(usize),
    ScrubStart,
    ScrubEnd,
    /// The view was closed: stop both loops.
    Close,
}

/// Registers the engine and its systems.
///
/// Data is supplied as JSON documents; leaving either out (or supplying one
/// that does not parse) runs the built-in demo. A `CrowdFlowEngine` already
/// inserted into the app takes precedence.
#[derive(Default)]
pub struct CrowdFlowPlugin {
    pub plan_json: Option<String>,
    pub forecast_json: Option<String>,
    pub params: FlowParams,
}

impl Plugin for CrowdFlowPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<CrowdFlowEngine>() {
            let engine = CrowdFlowEngine::from_json(
                self.plan_json.as_deref(),
                self.forecast_json.as_deref(),
                self.params.clone(),
            );
            app.insert_resource(engine);
        }

        app.add_event::<PlaybackCommand>()
            .configure_sets(Update, (CrowdFlowSet::Input, CrowdFlowSet::Advance).chain())
            .add_systems(Update, apply_playback_commands.in_set(CrowdFlowSet::Input))
            .add_systems(Update, tick_crowd_flow.in_set(CrowdFlowSet::Advance));
    }
}

fn apply_playback_commands(
    mut commands: EventReader<PlaybackCommand>,
    mut engine: ResMut<CrowdFlowEngine>,
) {
    for command in commands.read() {
        match *command {
            PlaybackCommand::Play => engine.play(),
            PlaybackCommand::Pause => engine.pause(),
            PlaybackCommand::Toggle => engine.toggle(),
            PlaybackCommand::Step(delta) => engine.step(delta),
            PlaybackCommand::Seek(index) => engine.seek(index),
            PlaybackCommand::ScrubStart => engine.scrub_start(),
            PlaybackCommand::ScrubEnd => engine.scrub_end(),
            PlaybackCommand::Close => engine.close(),
        }
    }
}

fn tick_crowd_flow(time: Res<Time>, mut engine: ResMut<CrowdFlowEngine>) {
    if engine.is_closed() {
        return;
    }
    let dt_ms = time.delta_secs_f64() * 1000.0;
    engine.tick(dt_ms);
}
