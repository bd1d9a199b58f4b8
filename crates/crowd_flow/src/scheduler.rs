//! Clock and repeating-task abstraction for the two engine loops.
//!
//! The frame-advance loop fires once per `step_interval_ms`; the particle
//! motion loop fires on every poll. Both are plain values polled by the
//! engine, so the same engine runs headless in tests (driven by a
//! [`ManualClock`] or explicit `tick(dt)` calls) or inside a render loop.

use std::time::Instant;

/// Source of monotonic time in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now_ms: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt_ms: f64) {
        self.now_ms += dt_ms.max(0.0);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    FrameAdvance,
    ParticleMotion,
}

/// A cancellable repeating task. `last_run_ms == None` means cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepeatingTask {
    interval_ms: f64,
    last_run_ms: Option<f64>,
}

impl RepeatingTask {
    pub fn every(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            last_run_ms: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.last_run_ms.is_some()
    }

    /// (Re)start the task; its first run is one interval after `now_ms`.
    pub fn start(&mut self, now_ms: f64) {
        self.last_run_ms = Some(now_ms);
    }

    pub fn cancel(&mut self) {
        self.last_run_ms = None;
    }

    /// Fire at most once. Returns the time elapsed since the previous run when
    /// the task is due.
    ///
    /// The schedule keeps its cadence (`last += interval`) while the task is
    /// less than one interval behind; a larger backlog is dropped rather than
    /// replayed as a burst of runs.
    pub fn poll(&mut self, now_ms: f64) -> Option<f64> {
        let last = self.last_run_ms?;
        let elapsed = now_ms - last;
        if elapsed < self.interval_ms {
            return None;
        }
        let next = if self.interval_ms > 0.0 && elapsed < 2.0 * self.interval_ms {
            last + self.interval_ms
        } else {
            now_ms
        };
        self.last_run_ms = Some(next);
        Some(elapsed)
    }
}

/// The engine's two loops.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    frame_advance: RepeatingTask,
    particle_motion: RepeatingTask,
}

impl Scheduler {
    pub fn new(step_interval_ms: f64) -> Self {
        Self {
            frame_advance: RepeatingTask::every(step_interval_ms),
            particle_motion: RepeatingTask::every(0.0),
        }
    }

    fn task_mut(&mut self, kind: LoopKind) -> &mut RepeatingTask {
        match kind {
            LoopKind::FrameAdvance => &mut self.frame_advance,
            LoopKind::ParticleMotion => &mut self.particle_motion,
        }
    }

    pub fn is_active(&self, kind: LoopKind) -> bool {
        match kind {
            LoopKind::FrameAdvance => self.frame_advance.is_active(),
            LoopKind::ParticleMotion => self.particle_motion.is_active(),
        }
    }

    pub fn start(&mut self, kind: LoopKind, now_ms: f64) {
        self.task_mut(kind).start(now_ms);
    }

    pub fn cancel(&mut self, kind: LoopKind) {
        self.task_mut(kind).cancel();
    }

    pub fn cancel_all(&mut self) {
        self.frame_advance.cancel();
        self.particle_motion.cancel();
    }

    pub fn poll(&mut self, kind: LoopKind, now_ms: f64) -> Option<f64> {
        self.task_mut(kind).poll(now_ms)
    }
}
