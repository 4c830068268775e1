use thiserror::Error;

/// Top-level error type for the armature stack.
#[derive(Debug, Error)]
pub enum ArmatureError {
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Homing error: {0}")]
    Homing(#[from] HomingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Motor bus read/write failures.
///
/// The bus performs no retries at this layer; a failed register access
/// propagates immediately and any multi-disk sequence in progress is left
/// partially applied.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    #[error("Failed to read register {register}: {message}")]
    Read {
        register: &'static str,
        message: String,
    },

    #[error("Failed to write register {register}: {message}")]
    Write {
        register: &'static str,
        message: String,
    },

    #[error("Motor bus disconnected")]
    Disconnected,
}

/// Invalid or premature motion commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown interpolation mode {got:?}: expected one of {available:?}")]
    UnknownInterpolation {
        got: String,
        available: &'static [&'static str],
    },

    #[error("Actuator is not homed: run homing before orientation commands")]
    NotHomed,
}

/// Failures of the homing calibration sequence.
///
/// Any of these leaves the actuator un-homed; callers must not assume a
/// zero-referenced pose afterwards.
#[derive(Debug, Error)]
pub enum HomingError {
    #[error("Stall detection did not trigger within {waited_ms} ms")]
    StallTimeout { waited_ms: u64 },

    #[error("Bus error during homing: {0}")]
    Bus(#[from] BusError),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}
