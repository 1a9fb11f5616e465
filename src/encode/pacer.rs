//! Frame-in-flight pacing: bounds how many frames can be
//! queued for encode before the render loop blocks, and guarantees
//! `finish()` can always drain without deadlocking even after a mid-stream
//! failure.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::encode::error::EncodeError;

struct PacerState {
    in_flight: u32,
    finished: bool,
}

/// A counting semaphore over in-flight frames, plus a `finished` latch so a
/// failed encode can still release any waiter blocked in `acquire_slot`.
pub struct FramePacer {
    max_in_flight: u32,
    state: Mutex<PacerState>,
    condvar: Condvar,
    timeout: Duration,
}

impl FramePacer {
    /// `max_in_flight` defaults to 3; callers needing the engine-config
    /// default should pass
    /// [`crate::config::EngineConfig::max_frames_in_flight`].
    #[must_use]
    pub fn new(max_in_flight: u32) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            state: Mutex::new(PacerState {
                in_flight: 0,
                finished: false,
            }),
            condvar: Condvar::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Blocks until a slot is free, or returns [`EncodeError::EncoderTimeout`]
    /// after 30 seconds.
    pub fn acquire_slot(&self) -> Result<(), EncodeError> {
        let mut state = self.state.lock();
        let deadline = Instant::now() + self.timeout;
        while state.in_flight >= self.max_in_flight && !state.finished {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EncodeError::EncoderTimeout);
            }
            let timed_out = self.condvar.wait_for(&mut state, remaining).timed_out();
            if timed_out && state.in_flight >= self.max_in_flight && !state.finished {
                return Err(EncodeError::EncoderTimeout);
            }
        }
        state.in_flight += 1;
        Ok(())
    }

    /// Releases a slot, waking any waiter. Safe to call after a failed
    /// dispatch so `finish()` below is never left waiting on a slot that
    /// will never otherwise be released.
    pub fn release_slot(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        self.condvar.notify_all();
    }

    /// Marks the pacer finished and wakes every waiter; any frame still
    /// "in flight" at this point is assumed already released by its caller
    /// via [`Self::release_slot`] on success or failure.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.finished = true;
        self.condvar.notify_all();
    }

    #[must_use]
    pub fn in_flight(&self) -> u32 {
        self.state.lock().in_flight
    }
}
