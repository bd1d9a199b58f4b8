//! Crowd-flow visualization engine for a venue: turns a floor plan and an
//! arrivals/exits forecast into a timeline of congestion frames, drives an
//! animated particle field from it and exposes playback transport.

pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod frames;
pub mod geometry;
pub mod particles;
pub mod playback;
pub mod plugin;
pub mod rng;
pub mod scheduler;
pub mod venue;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use config::FlowParams;
pub use engine::{CrowdFlowEngine, DataSource, TickReport};
pub use error::FlowError;
pub use forecast::{Forecast, ForecastPoint, TimeKey};
pub use frames::{CongestionLevel, Frame, FrameTimeline, FrameView, Phase};
pub use particles::{Particle, ParticleSwarm};
pub use playback::{PlaybackController, PlaybackMode};
pub use plugin::{CrowdFlowPlugin, CrowdFlowSet, PlaybackCommand};
pub use scheduler::{Clock, ManualClock, SystemClock};
pub use venue::{Exit, Facility, VenuePlan, Zone};
