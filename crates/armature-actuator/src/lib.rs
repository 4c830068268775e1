// armature-actuator: Motor control, spherical actuation, and homing for a robotic limb.

pub mod frame;
pub mod homing;
pub mod kinematics;
pub mod motor;
pub mod spherical;
pub mod trajectory;

/// Common imports for working with the actuator stack.
pub mod prelude {
    pub use crate::frame::FrameTransform;
    pub use crate::homing::HomingPhase;
    pub use crate::kinematics::{CrownModel, SphericalModel};
    pub use crate::motor::{GotoOptions, SingleAxisMotor};
    pub use crate::spherical::{SphericalActuator, ENCODER_SIGN};
    pub use crate::trajectory::{Profile, TrajectoryHandle};

    pub use armature_bus::MotorBus;
    pub use armature_core::config::{ArmatureConfig, DiskConfig, HomingConfig, MotorConfig};
    pub use armature_core::error::{ArmatureError, BusError, CommandError, HomingError};
    pub use armature_core::types::{DiskId, Pid, DISK_COUNT};
}
