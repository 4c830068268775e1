//! A single-axis motor with its frame convention applied.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use armature_bus::MotorBus;
use armature_core::config::MotorConfig;
use armature_core::error::{ArmatureError, BusError};

use crate::frame::FrameTransform;
use crate::trajectory::{Profile, TrajectoryHandle};

/// Options of a timed [`SingleAxisMotor::goto`] move.
#[derive(Debug, Clone, PartialEq)]
pub struct GotoOptions {
    /// Local-frame start of the interpolation. Defaults to the present
    /// position read from the bus.
    pub starting_point: Option<f32>,

    /// Block until the move completes instead of returning immediately.
    pub wait: bool,

    /// Interpolation mode name, see [`crate::trajectory::PROFILE_NAMES`].
    pub interpolation: String,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            starting_point: None,
            wait: false,
            interpolation: "linear".to_owned(),
        }
    }
}

/// One motor on the limb bus, addressed in its local joint frame.
///
/// All positions going through this type are local-frame degrees; the
/// [`FrameTransform`] built from the motor's [`MotorConfig`] is applied at
/// the register boundary and nowhere else.
pub struct SingleAxisMotor {
    name: String,
    bus: Arc<dyn MotorBus>,
    frame: FrameTransform,
}

impl SingleAxisMotor {
    #[must_use]
    pub fn new(name: impl Into<String>, bus: Arc<dyn MotorBus>, config: &MotorConfig) -> Self {
        Self {
            name: name.into(),
            bus,
            frame: FrameTransform::from_config(config),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Present position (local frame, degrees).
    pub fn present_position(&self) -> Result<f32, BusError> {
        Ok(self.frame.to_local(self.bus.rot_position()?))
    }

    /// Last commanded goal (local frame, degrees).
    pub fn goal_position(&self) -> Result<f32, BusError> {
        Ok(self.frame.to_local(self.bus.target_rot_position()?))
    }

    /// Command a goal position directly (local frame, degrees).
    pub fn set_goal_position(&self, degrees: f32) -> Result<(), BusError> {
        self.bus.set_target_rot_position(self.frame.to_raw(degrees))
    }

    /// Moving speed magnitude (deg/s). Unaffected by the frame convention.
    pub fn moving_speed(&self) -> Result<f32, BusError> {
        self.bus.target_rot_speed()
    }

    pub fn set_moving_speed(&self, degrees_per_sec: f32) -> Result<(), BusError> {
        self.bus.set_target_rot_speed(degrees_per_sec)
    }

    pub fn compliant(&self) -> Result<bool, BusError> {
        self.bus.compliant()
    }

    pub fn set_compliant(&self, compliant: bool) -> Result<(), BusError> {
        self.bus.set_compliant(compliant)
    }

    /// Torque limit as a fraction of the hardware maximum.
    pub fn torque_limit(&self) -> Result<f32, BusError> {
        self.bus.power_ratio_limit()
    }

    pub fn set_torque_limit(&self, ratio: f32) -> Result<(), BusError> {
        self.bus.set_power_ratio_limit(ratio)
    }

    pub fn temperature(&self) -> Result<f32, BusError> {
        self.bus.temperature()
    }

    /// Move to `goal` (local frame) over `duration`, streaming interpolated
    /// targets in the background.
    ///
    /// The interpolation name is resolved before anything touches the bus,
    /// so an unknown name fails without side effects. With `wait` set the
    /// call blocks until the move completes; the handle is still returned
    /// and can be queried afterwards.
    pub fn goto(
        &self,
        goal: f32,
        duration: Duration,
        options: GotoOptions,
    ) -> Result<TrajectoryHandle, ArmatureError> {
        let profile = Profile::from_name(&options.interpolation)?;
        let start = match options.starting_point {
            Some(position) => position,
            None => self.present_position()?,
        };
        tracing::debug!(
            motor = %self.name,
            goal,
            start,
            duration_s = duration.as_secs_f32(),
            profile = ?profile,
            "goto"
        );
        let mut handle = TrajectoryHandle::spawn(
            Arc::clone(&self.bus),
            self.frame,
            start,
            goal,
            duration,
            profile,
        );
        if options.wait {
            handle.wait()?;
        }
        Ok(handle)
    }
}

impl fmt::Display for SingleAxisMotor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self
            .present_position()
            .map_or_else(|_| "?".to_owned(), |p| format!("{p:.1}"));
        let mode = match self.compliant() {
            Ok(true) => "compliant",
            Ok(false) => "stiff",
            Err(_) => "?",
        };
        write!(f, "<Motor {:?} pos={pos} mode={mode}>", self.name)
    }
}
