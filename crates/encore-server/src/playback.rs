use std::sync::Arc;

use encore_capture::{Frame, Recording};
use encore_wire::ControlIntent;

/// Seconds of rate-scaled time between frame emissions.
pub const EMIT_INTERVAL_SECS: f64 = 0.03;
/// Rate multiplier while fast-forward is held.
pub const FAST_FORWARD_RATE: f64 = 10.0;

const BASE_RATE: f64 = 1.0;

/// What one session wants done after a scheduler pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Idle,
    Emit(Frame),
    /// The recording ran out: close the connection, drop the session.
    Exhausted,
}

/// Replay state for one connection.
///
/// The cursor only moves forward. Frames reach the connection strictly in
/// recording order, as a prefix of the recording, until it runs out.
pub struct PlaybackSession {
    recording: Arc<Recording>,
    cursor: usize,
    paused: bool,
    fast_forward: bool,
    single_step: bool,
    emit_timer: f64,
    exhausted: bool,
}

impl PlaybackSession {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self {
            recording,
            cursor: 0,
            paused: false,
            fast_forward: false,
            single_step: false,
            emit_timer: 0.0,
            exhausted: false,
        }
    }

    /// Apply one decoded input message.
    ///
    /// Fast-forward and single-step are held-key flags, assigned fresh from
    /// every message. Pause flips on each toggle and may be combined with
    /// fast-forward; the rate change takes effect once unpaused.
    pub fn apply(&mut self, intent: ControlIntent) {
        self.fast_forward = intent.accelerate;
        self.single_step = intent.step;
        if intent.toggle_pause {
            self.paused = !self.paused;
        }
    }

    /// Advance by `dt` elapsed seconds. At most one frame comes due per pass;
    /// a pending single-step fires first and skips the timed path entirely.
    pub fn advance(&mut self, dt: f64) -> Step {
        if self.exhausted {
            return Step::Exhausted;
        }
        if self.single_step {
            self.single_step = false;
            return self.emit_next();
        }
        if self.paused {
            return Step::Idle;
        }
        let rate = if self.fast_forward {
            FAST_FORWARD_RATE
        } else {
            BASE_RATE
        };
        self.emit_timer += dt * rate;
        if self.emit_timer > EMIT_INTERVAL_SECS {
            return self.emit_next();
        }
        Step::Idle
    }

    fn emit_next(&mut self) -> Step {
        match self.recording.frame(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                self.emit_timer = 0.0;
                Step::Emit(frame.clone())
            }
            None => {
                self.exhausted = true;
                Step::Exhausted
            }
        }
    }

    /// Frames emitted so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn paused(&self) -> bool {
        self.paused
    }
}
