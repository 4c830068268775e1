// armature-bus: Register-level access to a single motor on the limb bus.

pub mod mock;

use armature_core::error::BusError;
use armature_core::types::Pid;

/// Register-level access to one motor.
///
/// Each method maps to a single register read or write; no call performs
/// retries or multi-register transactions. Implementations over a shared
/// serial bus take `&self` and serialize access internally, so handles can
/// be cloned across threads behind an [`std::sync::Arc`].
pub trait MotorBus: Send + Sync {
    // ---- reads ----

    /// Present rotational position (degrees, hardware frame).
    fn rot_position(&self) -> Result<f32, BusError>;

    /// Present rotational speed (deg/s). Sign follows the hardware frame.
    fn rot_speed(&self) -> Result<f32, BusError>;

    /// Motor temperature (degrees Celsius).
    fn temperature(&self) -> Result<f32, BusError>;

    /// Last commanded target position (degrees, hardware frame).
    fn target_rot_position(&self) -> Result<f32, BusError>;

    /// Last commanded target speed (deg/s).
    fn target_rot_speed(&self) -> Result<f32, BusError>;

    /// Whether torque is disengaged.
    fn compliant(&self) -> Result<bool, BusError>;

    /// Output power limit as a fraction of the hardware maximum.
    fn power_ratio_limit(&self) -> Result<f32, BusError>;

    // ---- writes ----

    fn set_target_rot_position(&self, degrees: f32) -> Result<(), BusError>;

    fn set_target_rot_speed(&self, degrees_per_sec: f32) -> Result<(), BusError>;

    fn set_compliant(&self, compliant: bool) -> Result<(), BusError>;

    fn set_power_ratio_limit(&self, ratio: f32) -> Result<(), BusError>;

    fn set_limit_current(&self, ratio: f32) -> Result<(), BusError>;

    fn set_encoder_res(&self, res: f32) -> Result<(), BusError>;

    fn set_reduction(&self, reduction: f32) -> Result<(), BusError>;

    fn set_wheel_size(&self, size: f32) -> Result<(), BusError>;

    fn set_position_pid(&self, pid: Pid) -> Result<(), BusError>;

    /// Enable or disable closed-loop position control.
    fn set_rot_position_mode(&self, enabled: bool) -> Result<(), BusError>;

    /// Enable or disable closed-loop speed control.
    fn set_rot_speed_mode(&self, enabled: bool) -> Result<(), BusError>;

    /// Declare the present mechanical position as zero.
    ///
    /// Subsequent [`MotorBus::rot_position`] reads are relative to this
    /// reference.
    fn set_to_zero(&self) -> Result<(), BusError>;
}
