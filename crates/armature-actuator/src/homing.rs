//! Homing calibration sequence for the spherical actuator.
//!
//! The disks are driven into their mechanical hard stop, detected by a
//! stalled velocity window, then re-zeroed and driven out to the
//! operational zero pose. Phases run strictly in order and any bus failure
//! aborts the attempt; the actuator stays not-homed.

use std::collections::VecDeque;
use std::fmt;
use std::thread;
use std::time::Instant;

use nalgebra::UnitQuaternion;

use armature_core::config::HomingConfig;
use armature_core::error::HomingError;
use armature_core::types::DISK_COUNT;

use crate::spherical::SphericalActuator;

/// Phase of the homing sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingPhase {
    /// Declare the present pose as a provisional zero.
    ZeroReference,
    /// Engage torque on all disks.
    Engage,
    /// Drive all disks toward the hard stop.
    DriveToLimit,
    /// Poll velocities until every disk reads as stalled.
    StallDetection,
    /// Declare the hard-stop pose as the new zero.
    RezeroAtLimit,
    /// Drive out to the operational zero offset.
    DriveToOffset,
    /// Declare the offset pose as the final zero.
    FinalZero,
    /// Reset the kinematics reference and settle at identity.
    ResetModel,
}

impl fmt::Display for HomingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ZeroReference => "zero-reference",
            Self::Engage => "engage",
            Self::DriveToLimit => "drive-to-limit",
            Self::StallDetection => "stall-detection",
            Self::RezeroAtLimit => "rezero-at-limit",
            Self::DriveToOffset => "drive-to-offset",
            Self::FinalZero => "final-zero",
            Self::ResetModel => "reset-model",
        };
        f.write_str(name)
    }
}

fn enter(phase: HomingPhase) {
    tracing::debug!(%phase, "homing phase");
}

/// Execute the full homing sequence against `actuator`.
pub(crate) fn run(
    actuator: &mut SphericalActuator,
    config: &HomingConfig,
) -> Result<(), HomingError> {
    enter(HomingPhase::ZeroReference);
    for disk in &actuator.disks {
        disk.set_to_zero()?;
    }
    thread::sleep(config.settle());

    enter(HomingPhase::Engage);
    actuator.set_compliant(false)?;
    thread::sleep(config.settle());

    enter(HomingPhase::DriveToLimit);
    for disk in &actuator.disks {
        disk.set_target_rot_speed(config.speed)?;
    }
    for disk in &actuator.disks {
        disk.set_target_rot_position(config.limit_pos)?;
    }
    // Let the move get past its acceleration transient before sampling, or
    // a slow start would read as a stall.
    thread::sleep(config.warmup());

    enter(HomingPhase::StallDetection);
    wait_for_stall(actuator, config)?;

    enter(HomingPhase::RezeroAtLimit);
    for disk in &actuator.disks {
        disk.set_to_zero()?;
    }
    thread::sleep(config.rezero_settle());

    enter(HomingPhase::DriveToOffset);
    for disk in &actuator.disks {
        disk.set_target_rot_position(config.target_pos)?;
    }
    // Time-based wait sized to the commanded speed, not a completion
    // detector.
    thread::sleep(config.offset_wait());

    enter(HomingPhase::FinalZero);
    for disk in &actuator.disks {
        disk.set_to_zero()?;
    }
    thread::sleep(config.settle());

    enter(HomingPhase::ResetModel);
    actuator.model.reset_reference_angles();
    actuator.orient_internal(
        &UnitQuaternion::identity(),
        Some(config.final_orient_duration_s),
        true,
    )?;

    Ok(())
}

/// Poll disk velocities until every disk's mean over the sliding window is
/// non-negative.
///
/// While driving into the stop the disks report negative speeds; once
/// pressed against it the readings hover around zero. Averaging a window
/// of samples per disk rides out single noisy readings.
fn wait_for_stall(
    actuator: &SphericalActuator,
    config: &HomingConfig,
) -> Result<(), HomingError> {
    let mut window: VecDeque<[f32; DISK_COUNT]> = VecDeque::with_capacity(config.window);
    let started = Instant::now();
    loop {
        let mut sample = [0.0; DISK_COUNT];
        for (speed, disk) in sample.iter_mut().zip(&actuator.disks) {
            *speed = disk.rot_speed()?;
        }
        if window.len() == config.window {
            window.pop_front();
        }
        window.push_back(sample);

        let all_stalled = (0..DISK_COUNT).all(|i| {
            let sum: f32 = window.iter().map(|s| s[i]).sum();
            sum / window.len() as f32 >= 0.0
        });
        if all_stalled {
            return Ok(());
        }

        let waited = started.elapsed();
        if waited >= config.max_stall_wait() {
            return Err(HomingError::StallTimeout {
                waited_ms: waited.as_millis() as u64,
            });
        }
        thread::sleep(config.poll_interval());
    }
}
