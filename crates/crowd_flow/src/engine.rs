//! The crowd-flow engine: one value owning the plan, the frame timeline, the
//! particle swarm, the transport controller and both loops.
//!
//! Hosts drive it with [`CrowdFlowEngine::tick`] (or [`CrowdFlowEngine::poll`]
//! with a [`Clock`]) and the transport commands, and render from
//! [`CrowdFlowEngine::get_frame`] / [`CrowdFlowEngine::particles`].
//!
//! Within one tick the order is fixed: the frame timer may move the index,
//! particles for a newly committed frame are spawned, then the motion loop
//! moves the just-updated particle list.

use bevy::prelude::*;

use crate::config::FlowParams;
use crate::demo::{demo_forecast, demo_plan};
use crate::error::FlowError;
use crate::forecast::{per_gate_load_at, Forecast};
use crate::frames::{FrameTimeline, FrameView, Phase};
use crate::particles::{Particle, ParticleSwarm};
use crate::playback::{PlaybackController, PlaybackMode};
use crate::scheduler::{Clock, LoopKind, Scheduler};
use crate::venue::VenuePlan;

/// Where the engine's data came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Live,
    /// Built-in demo dataset, with the reason the supplied data was rejected.
    Demo { reason: String },
}

impl DataSource {
    pub fn is_demo(&self) -> bool {
        matches!(self, DataSource::Demo { .. })
    }
}

/// What happened during one [`CrowdFlowEngine::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame_advanced: bool,
    pub spawned: usize,
    pub retired: usize,
}

#[derive(Resource, Debug, Clone)]
pub struct CrowdFlowEngine {
    plan: VenuePlan,
    forecast: Forecast,
    timeline: FrameTimeline,
    swarm: ParticleSwarm,
    playback: PlaybackController,
    scheduler: Scheduler,
    params: FlowParams,
    source: DataSource,
    now_ms: f64,
    /// Spawn for the current frame at the start of the next tick.
    pending_spawn: bool,
    /// Frame index when the current scrub started.
    scrub_origin: Option<usize>,
    closed: bool,
}

impl CrowdFlowEngine {
    pub fn new(plan: VenuePlan, forecast: Forecast, params: FlowParams) -> Self {
        Self::with_source(plan, forecast, params, DataSource::Live)
    }

    fn with_source(
        plan: VenuePlan,
        forecast: Forecast,
        params: FlowParams,
        source: DataSource,
    ) -> Self {
        let params = match params.validate() {
            Ok(()) => params,
            Err(e) => {
                warn!("Invalid crowd-flow parameters, using defaults: {}", e);
                FlowParams::default()
            }
        };
        let timeline = FrameTimeline::build(&plan, &forecast);
        let mut scheduler = Scheduler::new(params.step_interval_ms);
        scheduler.start(LoopKind::ParticleMotion, 0.0);
        Self {
            playback: PlaybackController::new(timeline.len()),
            pending_spawn: !timeline.is_empty(),
            swarm: ParticleSwarm::new(params.seed),
            plan,
            forecast,
            timeline,
            scheduler,
            params,
            source,
            now_ms: 0.0,
            scrub_origin: None,
            closed: false,
        }
    }

    /// Engine over the built-in demo dataset.
    pub fn demo(params: FlowParams, reason: impl Into<String>) -> Self {
        Self::with_source(
            demo_plan(),
            demo_forecast(),
            params,
            DataSource::Demo {
                reason: reason.into(),
            },
        )
    }

    /// Build from the host's JSON documents. Any missing or malformed document
    /// switches the whole engine to the demo dataset (plan and forecast
    /// together, since the demo forecast is keyed to the demo gates).
    pub fn from_json(plan_json: Option<&str>, forecast_json: Option<&str>, params: FlowParams) -> Self {
        match parse_documents(plan_json, forecast_json) {
            Ok((plan, forecast)) => {
                info!(
                    "Loaded venue plan ({} zones, {} exits) and forecast",
                    plan.zones.len(),
                    plan.exits.len()
                );
                Self::new(plan, forecast, params)
            }
            Err(reason) => {
                warn!("Crowd-flow input rejected, showing demo data: {}", reason);
                Self::demo(params, reason)
            }
        }
    }

    /// Replace the forecast (new data arrived). Frames are rebuilt, live
    /// particles are discarded and the index is clamped to the new timeline.
    pub fn load_forecast(&mut self, forecast: Forecast) {
        self.timeline = FrameTimeline::build(&self.plan, &forecast);
        self.forecast = forecast;
        self.swarm.clear();
        self.playback.set_frame_count(self.timeline.len());
        self.pending_spawn = !self.timeline.is_empty();
        self.sync_frame_task();
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    pub fn get_frame(&self, index: usize) -> Option<FrameView> {
        self.timeline.view(index)
    }

    pub fn current_frame(&self) -> Option<FrameView> {
        self.get_frame(self.current_index())
    }

    pub fn particles(&self) -> &[Particle] {
        self.swarm.particles()
    }

    pub fn particle_snapshot(&self) -> Vec<Particle> {
        self.swarm.snapshot()
    }

    pub fn frame_count(&self) -> usize {
        self.timeline.len()
    }

    pub fn current_index(&self) -> usize {
        self.playback.frame_index()
    }

    pub fn current_mode(&self) -> PlaybackMode {
        self.playback.mode()
    }

    pub fn timeline(&self) -> &FrameTimeline {
        &self.timeline
    }

    pub fn plan(&self) -> &VenuePlan {
        &self.plan
    }

    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_frame_timer_running(&self) -> bool {
        self.scheduler.is_active(LoopKind::FrameAdvance)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    pub fn play(&mut self) {
        let before = self.playback.frame_index();
        self.playback.play();
        self.after_index_change(before);
        self.sync_frame_task();
    }

    pub fn pause(&mut self) {
        self.playback.pause();
        self.sync_frame_task();
    }

    pub fn toggle(&mut self) {
        let before = self.playback.frame_index();
        self.playback.toggle();
        self.after_index_change(before);
        self.sync_frame_task();
    }

    pub fn step(&mut self, delta: i64) {
        let before = self.playback.frame_index();
        self.playback.step(delta);
        self.after_index_change(before);
    }

    pub fn seek(&mut self, index: usize) {
        let before = self.playback.frame_index();
        self.playback.seek(index);
        self.after_index_change(before);
    }

    pub fn scrub_start(&mut self) {
        if self.playback.mode() != PlaybackMode::Scrubbing {
            self.scrub_origin = Some(self.playback.frame_index());
        }
        self.playback.scrub_start();
        self.sync_frame_task();
    }

    pub fn scrub_end(&mut self) {
        if self.playback.mode() == PlaybackMode::Scrubbing {
            self.playback.scrub_end();
            if let Some(origin) = self.scrub_origin.take() {
                self.after_index_change(origin);
            }
            self.sync_frame_task();
        }
    }

    /// Stop both loops. The engine keeps its last state for reading but no
    /// longer advances.
    pub fn close(&mut self) {
        self.scheduler.cancel_all();
        self.closed = true;
        info!("Crowd-flow view closed at frame {}", self.current_index());
    }

    // -----------------------------------------------------------------------
    // Clocks
    // -----------------------------------------------------------------------

    /// Advance engine time by `dt_ms` and run whichever loops are due.
    pub fn tick(&mut self, dt_ms: f64) -> TickReport {
        let mut report = TickReport::default();
        if self.closed {
            return report;
        }
        self.now_ms += dt_ms.max(0.0);
        let now = self.now_ms;

        if self.scheduler.poll(LoopKind::FrameAdvance, now).is_some() {
            if self.playback.advance() {
                report.frame_advanced = true;
                self.pending_spawn = true;
            }
            // Reaching the last frame pauses playback.
            self.sync_frame_task();
        }

        if self.pending_spawn {
            report.spawned = self.spawn_current_frame();
            self.pending_spawn = false;
        }

        if let Some(dt) = self.scheduler.poll(LoopKind::ParticleMotion, now) {
            report.retired = self.swarm.advance(now, dt, &self.params);
        }
        report
    }

    /// Catch engine time up to `clock` and tick once.
    pub fn poll(&mut self, clock: &dyn Clock) -> TickReport {
        let dt = clock.now_ms() - self.now_ms;
        self.tick(dt.max(0.0))
    }

    fn after_index_change(&mut self, before: usize) {
        if self.playback.mode() != PlaybackMode::Scrubbing
            && self.playback.frame_index() != before
        {
            self.pending_spawn = true;
        }
    }

    /// The frame timer runs exactly while the controller is playing.
    fn sync_frame_task(&mut self) {
        let should_run = self.playback.is_playing() && !self.closed;
        match (should_run, self.scheduler.is_active(LoopKind::FrameAdvance)) {
            (true, false) => self.scheduler.start(LoopKind::FrameAdvance, self.now_ms),
            (false, true) => self.scheduler.cancel(LoopKind::FrameAdvance),
            _ => {}
        }
    }

    fn spawn_current_frame(&mut self) -> usize {
        let Some(frame) = self.timeline.get(self.playback.frame_index()) else {
            return 0;
        };
        match frame.phase {
            Phase::Arrivals => {
                let loads = per_gate_load_at(&self.forecast.arrivals, frame.time_key);
                self.swarm
                    .spawn_arrivals(&self.plan, &loads, self.now_ms, &self.params)
            }
            Phase::Exits => self.swarm.spawn_exits(
                &self.plan,
                &frame.congestion_by_zone,
                frame.total_load,
                self.now_ms,
                &self.params,
            ),
        }
    }
}

fn parse_documents(
    plan_json: Option<&str>,
    forecast_json: Option<&str>,
) -> Result<(VenuePlan, Forecast), String> {
    let plan_json = plan_json.ok_or("no venue plan supplied")?;
    let forecast_json = forecast_json.ok_or("no forecast supplied")?;
    let plan = VenuePlan::from_json(plan_json).map_err(|e: FlowError| format!("venue plan: {e}"))?;
    let forecast =
        Forecast::from_json(forecast_json).map_err(|e: FlowError| format!("forecast: {e}"))?;
    Ok((plan, forecast))
}
