//! Timed interpolation toward a goal position.
//!
//! A goto command spawns a background worker that streams intermediate
//! targets to the bus until the duration elapses, then writes the goal
//! exactly. The returned [`TrajectoryHandle`] can wait for completion or
//! cancel the stream early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use armature_bus::MotorBus;
use armature_core::error::{BusError, CommandError};

use crate::frame::FrameTransform;

/// Interval between intermediate target writes.
const UPDATE_PERIOD: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Names accepted by [`Profile::from_name`], in the order they are reported
/// in the unknown-interpolation error.
pub const PROFILE_NAMES: &[&str] = &["linear", "minimum-jerk"];

/// Interpolation shape of a timed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Linear,
    /// Quintic ease with zero velocity and acceleration at both endpoints.
    MinimumJerk,
}

impl Profile {
    /// Resolve a profile by name.
    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        match name {
            "linear" => Ok(Self::Linear),
            "minimum-jerk" => Ok(Self::MinimumJerk),
            other => Err(CommandError::UnknownInterpolation {
                got: other.to_owned(),
                available: PROFILE_NAMES,
            }),
        }
    }

    /// Position at elapsed time `t` of a move from `start` to `goal` over
    /// `duration` seconds. Holds the goal once `t >= duration`, and jumps
    /// straight to the goal when the duration is not positive.
    #[must_use]
    pub fn value_at(self, start: f32, goal: f32, t: f32, duration: f32) -> f32 {
        let s = if duration > 0.0 {
            (t / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let shape = match self {
            Self::Linear => s,
            Self::MinimumJerk => s * s * s * (10.0 - 15.0 * s + 6.0 * s * s),
        };
        start + (goal - start) * shape
    }
}

// ---------------------------------------------------------------------------
// TrajectoryHandle
// ---------------------------------------------------------------------------

/// Handle to an in-flight timed move.
///
/// Dropping the handle detaches the worker; the move runs to completion on
/// its own.
#[derive(Debug)]
pub struct TrajectoryHandle {
    worker: Option<JoinHandle<Result<(), BusError>>>,
    cancelled: Arc<AtomicBool>,
}

impl TrajectoryHandle {
    /// Start streaming targets toward `goal` (local frame) on a background
    /// thread.
    pub(crate) fn spawn(
        bus: Arc<dyn MotorBus>,
        frame: FrameTransform,
        start: f32,
        goal: f32,
        duration: Duration,
        profile: Profile,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let worker = thread::spawn(move || {
            let duration_s = duration.as_secs_f32();
            let started = Instant::now();
            while started.elapsed() < duration {
                if flag.load(Ordering::Relaxed) {
                    return Ok(());
                }
                let t = started.elapsed().as_secs_f32();
                let value = profile.value_at(start, goal, t, duration_s);
                bus.set_target_rot_position(frame.to_raw(value))?;
                thread::sleep(UPDATE_PERIOD);
            }
            if flag.load(Ordering::Relaxed) {
                return Ok(());
            }
            // The loop undershoots the goal by up to one period; land on it
            // exactly.
            bus.set_target_rot_position(frame.to_raw(goal))
        });
        Self {
            worker: Some(worker),
            cancelled,
        }
    }

    /// Block until the move finishes or fails.
    ///
    /// Idempotent: a second call returns `Ok(())`.
    pub fn wait(&mut self) -> Result<(), BusError> {
        match self.worker.take() {
            Some(worker) => match worker.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => Ok(()),
        }
    }

    /// Stop streaming targets. The motor holds whatever target was written
    /// last.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether the worker has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }
}
