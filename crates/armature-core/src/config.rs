use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Pid;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_pid() -> Pid {
    Pid::new(9.0, 0.02, 100.0)
}
const fn default_reduction() -> f32 {
    214.0
}
const fn default_wheel_size() -> f32 {
    62.0
}
const fn default_encoder_res() -> f32 {
    5.0
}
const fn default_moving_speed() -> f32 {
    50.0
}
const fn default_current_limit() -> f32 {
    0.4
}
const fn default_settle_s() -> f32 {
    0.1
}
const fn default_homing_speed() -> f32 {
    50.0
}
const fn default_limit_pos() -> f32 {
    -270.0
}
const fn default_target_pos() -> f32 {
    102.0
}
const fn default_poll_interval_s() -> f32 {
    0.01
}
const fn default_window() -> usize {
    10
}
const fn default_warmup_s() -> f32 {
    1.0
}
const fn default_rezero_settle_s() -> f32 {
    1.0
}
const fn default_offset_margin_s() -> f32 {
    0.25
}
const fn default_max_stall_wait_s() -> f32 {
    30.0
}
const fn default_final_orient_duration_s() -> f32 {
    1.0
}
const fn default_pivot_center() -> [f32; 3] {
    [0.0, 0.0, 25.0]
}
const fn default_crown_pivot() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}
const fn default_crown_radius() -> f32 {
    36.7
}
const fn default_arm_root_offsets() -> [f32; 3] {
    [0.0, 120.0, 240.0]
}

fn duration_from_secs(secs: f32) -> Duration {
    Duration::from_secs_f32(secs.max(0.0))
}

// ---------------------------------------------------------------------------
// MotorConfig
// ---------------------------------------------------------------------------

/// Sign convention of a single-axis motor's hardware frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Direct,
    Indirect,
}

impl Orientation {
    /// Whether the hardware frame shares the local frame's sign.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        matches!(self, Self::Direct)
    }
}

/// Frame parameters for one single-axis motor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorConfig {
    /// Hardware-frame zero shift (degrees).
    #[serde(default)]
    pub offset: f32,

    /// Sign convention between hardware and local frame.
    #[serde(default)]
    pub orientation: Orientation,
}

// ---------------------------------------------------------------------------
// DiskConfig
// ---------------------------------------------------------------------------

/// Static per-disk parameters written once at actuator construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskConfig {
    /// Position PID gains.
    #[serde(default = "default_pid")]
    pub pid: Pid,

    /// Gearbox reduction ratio.
    #[serde(default = "default_reduction")]
    pub reduction: f32,

    /// Drive wheel size (mm).
    #[serde(default = "default_wheel_size")]
    pub wheel_size: f32,

    /// Encoder resolution.
    #[serde(default = "default_encoder_res")]
    pub encoder_res: f32,

    /// Default target rotational speed (deg/s).
    #[serde(default = "default_moving_speed")]
    pub moving_speed: f32,

    /// Current limit as a fraction of the hardware maximum.
    /// 0.4 is the calibrated safety value for this actuator family.
    #[serde(default = "default_current_limit")]
    pub current_limit: f32,

    /// Settle delay between the zero-reference write and the first speed
    /// write, in seconds. The firmware needs this to apply the mode change
    /// before accepting a new target.
    #[serde(default = "default_settle_s")]
    pub settle_s: f32,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            pid: default_pid(),
            reduction: default_reduction(),
            wheel_size: default_wheel_size(),
            encoder_res: default_encoder_res(),
            moving_speed: default_moving_speed(),
            current_limit: default_current_limit(),
            settle_s: default_settle_s(),
        }
    }
}

impl DiskConfig {
    /// Settle delay as a [`Duration`].
    #[must_use]
    pub fn settle(&self) -> Duration {
        duration_from_secs(self.settle_s)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.current_limit <= 0.0 || self.current_limit > 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "current_limit",
                message: format!("{} not in (0, 1]", self.current_limit),
            });
        }
        if self.moving_speed <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "moving_speed",
                message: "must be > 0".into(),
            });
        }
        if self.settle_s < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "settle_s",
                message: "must be >= 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HomingConfig
// ---------------------------------------------------------------------------

/// Timing and position parameters of the homing calibration sequence.
///
/// `target_pos` and `speed` must be chosen so the offset move always
/// completes within `target_pos / speed + offset_margin_s`; the wait is
/// time-based, not a completion detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomingConfig {
    /// Homing drive speed (deg/s).
    #[serde(default = "default_homing_speed")]
    pub speed: f32,

    /// Drive-to-limit target (degrees). Negative and larger in magnitude
    /// than the true mechanical travel, so the disks are guaranteed to
    /// reach the hard stop.
    #[serde(default = "default_limit_pos")]
    pub limit_pos: f32,

    /// Offset from the hard stop that defines the operational zero pose
    /// (degrees).
    #[serde(default = "default_target_pos")]
    pub target_pos: f32,

    /// Stall-detection polling interval (seconds).
    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: f32,

    /// Number of velocity samples in the stall-detection window.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Settle delay after zero-reference and compliance writes (seconds).
    #[serde(default = "default_settle_s")]
    pub settle_s: f32,

    /// Delay between commanding the drive-to-limit move and the first
    /// velocity sample, so acceleration transients cannot read as a stall
    /// (seconds).
    #[serde(default = "default_warmup_s")]
    pub warmup_s: f32,

    /// Settle delay after re-zeroing at the hard stop (seconds).
    #[serde(default = "default_rezero_settle_s")]
    pub rezero_settle_s: f32,

    /// Margin added to the computed offset-move wait (seconds).
    #[serde(default = "default_offset_margin_s")]
    pub offset_margin_s: f32,

    /// Upper bound on the stall-detection loop (seconds). Exceeding it
    /// fails the homing attempt instead of polling forever.
    #[serde(default = "default_max_stall_wait_s")]
    pub max_stall_wait_s: f32,

    /// Duration of the final identity-orientation move (seconds).
    #[serde(default = "default_final_orient_duration_s")]
    pub final_orient_duration_s: f32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            speed: default_homing_speed(),
            limit_pos: default_limit_pos(),
            target_pos: default_target_pos(),
            poll_interval_s: default_poll_interval_s(),
            window: default_window(),
            settle_s: default_settle_s(),
            warmup_s: default_warmup_s(),
            rezero_settle_s: default_rezero_settle_s(),
            offset_margin_s: default_offset_margin_s(),
            max_stall_wait_s: default_max_stall_wait_s(),
            final_orient_duration_s: default_final_orient_duration_s(),
        }
    }
}

impl HomingConfig {
    /// Stall-detection polling interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        duration_from_secs(self.poll_interval_s)
    }

    /// Settle delay as a [`Duration`].
    #[must_use]
    pub fn settle(&self) -> Duration {
        duration_from_secs(self.settle_s)
    }

    /// Warm-up delay as a [`Duration`].
    #[must_use]
    pub fn warmup(&self) -> Duration {
        duration_from_secs(self.warmup_s)
    }

    /// Post-re-zero settle delay as a [`Duration`].
    #[must_use]
    pub fn rezero_settle(&self) -> Duration {
        duration_from_secs(self.rezero_settle_s)
    }

    /// Stall-detection bound as a [`Duration`].
    #[must_use]
    pub fn max_stall_wait(&self) -> Duration {
        duration_from_secs(self.max_stall_wait_s)
    }

    /// Time-based wait for the drive-to-offset move.
    #[must_use]
    pub fn offset_wait(&self) -> Duration {
        duration_from_secs(self.target_pos / self.speed + self.offset_margin_s)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "speed",
                message: "must be > 0".into(),
            });
        }
        if self.limit_pos >= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "limit_pos",
                message: "must be negative to drive into the hard stop".into(),
            });
        }
        if self.target_pos <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "target_pos",
                message: "must be > 0".into(),
            });
        }
        if self.window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window",
                message: "must hold at least one sample".into(),
            });
        }
        if self.poll_interval_s <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_s",
                message: "must be > 0".into(),
            });
        }
        if self.max_stall_wait_s <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_stall_wait_s",
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GeometryConfig
// ---------------------------------------------------------------------------

/// Geometric parameters the spherical-joint kinematics model is built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Pivot center position (mm).
    #[serde(default = "default_pivot_center")]
    pub pivot_center: [f32; 3],

    /// Crown pivot position (mm).
    #[serde(default = "default_crown_pivot")]
    pub crown_pivot: [f32; 3],

    /// Crown radius (mm).
    #[serde(default = "default_crown_radius")]
    pub crown_radius: f32,

    /// Angular offsets of the three arm roots (degrees).
    #[serde(default = "default_arm_root_offsets")]
    pub arm_root_offsets: [f32; 3],
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            pivot_center: default_pivot_center(),
            crown_pivot: default_crown_pivot(),
            crown_radius: default_crown_radius(),
            arm_root_offsets: default_arm_root_offsets(),
        }
    }
}

// ---------------------------------------------------------------------------
// ArmatureConfig
// ---------------------------------------------------------------------------

/// Complete actuator-stack configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArmatureConfig {
    /// Single-axis motors by name.
    #[serde(default)]
    pub motors: HashMap<String, MotorConfig>,

    /// Spherical-actuator disk setup.
    #[serde(default)]
    pub disk: DiskConfig,

    /// Homing sequence parameters.
    #[serde(default)]
    pub homing: HomingConfig,

    /// Kinematics-model geometry.
    #[serde(default)]
    pub geometry: GeometryConfig,
}

impl ArmatureConfig {
    /// Validate all sections. Returns Err on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.disk.validate()?;
        self.homing.validate()?;
        Ok(())
    }

    /// Load from a TOML file and validate.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
