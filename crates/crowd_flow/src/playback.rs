//! Transport state machine for the frame timeline.
//!
//! ```text
//! idle ──play──▶ playing ◀──play── paused
//!                  │  └────pause────▶ │
//!                  └──scrub_start──▶ scrubbing ◀──scrub_start──┘
//!            scrub_end restores whichever mode scrubbing started from
//! ```
//!
//! The controller only owns the frame index and mode. The repeating timer that
//! calls [`PlaybackController::advance`] lives in the scheduler and runs only
//! while the mode is `Playing`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    #[default]
    Idle,
    Playing,
    Paused,
    Scrubbing,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    frame_index: usize,
    frame_count: usize,
    mode: PlaybackMode,
    /// Mode to restore when the current scrub ends.
    resume_mode: Option<PlaybackMode>,
}

impl PlaybackController {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            ..Default::default()
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playing
    }

    fn last_index(&self) -> usize {
        self.frame_count.saturating_sub(1)
    }

    /// Start or resume playback. Playing from the last frame rewinds to the
    /// first. While scrubbing, this only changes the mode restored at scrub end.
    /// No-op on an empty timeline.
    pub fn play(&mut self) {
        if self.frame_count == 0 {
            return;
        }
        match self.mode {
            PlaybackMode::Idle | PlaybackMode::Paused => {
                if self.frame_index >= self.last_index() {
                    self.frame_index = 0;
                }
                self.mode = PlaybackMode::Playing;
            }
            PlaybackMode::Scrubbing => self.resume_mode = Some(PlaybackMode::Playing),
            PlaybackMode::Playing => {}
        }
    }

    pub fn pause(&mut self) {
        match self.mode {
            PlaybackMode::Playing => self.mode = PlaybackMode::Paused,
            PlaybackMode::Scrubbing if self.resume_mode == Some(PlaybackMode::Playing) => {
                self.resume_mode = Some(PlaybackMode::Paused);
            }
            _ => {}
        }
    }

    pub fn toggle(&mut self) {
        let playing = match self.mode {
            PlaybackMode::Scrubbing => self.resume_mode == Some(PlaybackMode::Playing),
            mode => mode == PlaybackMode::Playing,
        };
        if playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move by `delta` frames, clamped to the timeline. Valid in any mode.
    /// Returns whether the index changed.
    pub fn step(&mut self, delta: i64) -> bool {
        let target = (self.frame_index as i64).saturating_add(delta).max(0);
        self.seek(usize::try_from(target).unwrap_or(usize::MAX))
    }

    /// Jump to `index`, clamped to the timeline. Returns whether the index changed.
    pub fn seek(&mut self, index: usize) -> bool {
        let clamped = index.min(self.last_index());
        let changed = clamped != self.frame_index;
        self.frame_index = clamped;
        changed
    }

    /// Enter scrubbing, remembering the current mode. Repeated calls keep the
    /// originally remembered mode.
    pub fn scrub_start(&mut self) {
        if self.mode != PlaybackMode::Scrubbing {
            self.resume_mode = Some(self.mode);
            self.mode = PlaybackMode::Scrubbing;
        }
    }

    /// Leave scrubbing and restore the remembered mode exactly.
    pub fn scrub_end(&mut self) {
        if self.mode == PlaybackMode::Scrubbing {
            self.mode = self.resume_mode.take().unwrap_or(PlaybackMode::Paused);
        }
    }

    /// One tick of the frame timer: advance by exactly one frame while playing.
    /// Landing on the last frame pauses playback. Returns whether the index
    /// changed.
    pub fn advance(&mut self) -> bool {
        if self.mode != PlaybackMode::Playing {
            return false;
        }
        let changed = self.frame_index < self.last_index();
        if changed {
            self.frame_index += 1;
        }
        if self.frame_index >= self.last_index() {
            self.mode = PlaybackMode::Paused;
        }
        changed
    }

    /// Adopt a new timeline length, keeping the index in range. An empty
    /// timeline forces the controller back to `Idle`.
    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.frame_index = self.frame_index.min(self.last_index());
        if frame_count == 0 {
            self.mode = PlaybackMode::Idle;
            self.resume_mode = None;
        }
    }
}
