//! In-memory [`MotorBus`] implementation for tests.
//!
//! [`MockDisk`] records every write in order and replays a scripted
//! sequence of speed readings, which is enough to drive the full homing
//! sequence without hardware.

use std::collections::VecDeque;
use std::sync::Mutex;

use armature_core::error::BusError;
use armature_core::types::Pid;

use crate::MotorBus;

/// A single recorded register write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteOp {
    TargetRotPosition(f32),
    TargetRotSpeed(f32),
    Compliant(bool),
    PowerRatioLimit(f32),
    LimitCurrent(f32),
    EncoderRes(f32),
    Reduction(f32),
    WheelSize(f32),
    PositionPid(Pid),
    RotPositionMode(bool),
    RotSpeedMode(bool),
    SetToZero,
}

#[derive(Debug, Default)]
struct State {
    rot_position: f32,
    target_rot_position: f32,
    target_rot_speed: f32,
    compliant: bool,
    power_ratio_limit: f32,
    temperature: f32,
    speed_script: VecDeque<f32>,
    last_scripted_speed: f32,
    rot_speed_reads: usize,
    writes: Vec<WriteOp>,
}

/// Scriptable in-memory motor.
///
/// Speed reads pop from a script queue and repeat the last scripted value
/// once the queue is drained, so a stalled disk keeps reading as stalled.
#[derive(Debug)]
pub struct MockDisk {
    name: &'static str,
    state: Mutex<State>,
    fail_on: Option<&'static str>,
}

impl MockDisk {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(State::default()),
            fail_on: None,
        }
    }

    /// Start with a non-zero present position.
    #[must_use]
    pub fn with_position(name: &'static str, position: f32) -> Self {
        let disk = Self::new(name);
        disk.lock().rot_position = position;
        disk
    }

    /// Queue speed readings to replay, in order.
    pub fn script_speeds(&self, speeds: impl IntoIterator<Item = f32>) {
        self.lock().speed_script.extend(speeds);
    }

    /// Make every write to the named register fail.
    #[must_use]
    pub fn fail_writes_to(mut self, register: &'static str) -> Self {
        self.fail_on = Some(register);
        self
    }

    /// Snapshot of all writes recorded so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteOp> {
        self.lock().writes.clone()
    }

    /// Number of times [`MotorBus::rot_speed`] has been read.
    #[must_use]
    pub fn rot_speed_reads(&self) -> usize {
        self.lock().rot_speed_reads
    }

    /// Overwrite the present position, as if the motor moved.
    pub fn set_position(&self, position: f32) {
        self.lock().rot_position = position;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("mock state poisoned")
    }

    fn write(&self, register: &'static str, op: WriteOp) -> Result<(), BusError> {
        if self.fail_on == Some(register) {
            return Err(BusError::Write {
                register,
                message: format!("injected failure on {}", self.name),
            });
        }
        self.lock().writes.push(op);
        Ok(())
    }
}

impl MotorBus for MockDisk {
    fn rot_position(&self) -> Result<f32, BusError> {
        Ok(self.lock().rot_position)
    }

    fn rot_speed(&self) -> Result<f32, BusError> {
        let mut state = self.lock();
        state.rot_speed_reads += 1;
        if let Some(speed) = state.speed_script.pop_front() {
            state.last_scripted_speed = speed;
        }
        Ok(state.last_scripted_speed)
    }

    fn temperature(&self) -> Result<f32, BusError> {
        Ok(self.lock().temperature)
    }

    fn target_rot_position(&self) -> Result<f32, BusError> {
        Ok(self.lock().target_rot_position)
    }

    fn target_rot_speed(&self) -> Result<f32, BusError> {
        Ok(self.lock().target_rot_speed)
    }

    fn compliant(&self) -> Result<bool, BusError> {
        Ok(self.lock().compliant)
    }

    fn power_ratio_limit(&self) -> Result<f32, BusError> {
        Ok(self.lock().power_ratio_limit)
    }

    fn set_target_rot_position(&self, degrees: f32) -> Result<(), BusError> {
        self.write("target_rot_position", WriteOp::TargetRotPosition(degrees))?;
        self.lock().target_rot_position = degrees;
        Ok(())
    }

    fn set_target_rot_speed(&self, degrees_per_sec: f32) -> Result<(), BusError> {
        self.write("target_rot_speed", WriteOp::TargetRotSpeed(degrees_per_sec))?;
        self.lock().target_rot_speed = degrees_per_sec;
        Ok(())
    }

    fn set_compliant(&self, compliant: bool) -> Result<(), BusError> {
        self.write("compliant", WriteOp::Compliant(compliant))?;
        self.lock().compliant = compliant;
        Ok(())
    }

    fn set_power_ratio_limit(&self, ratio: f32) -> Result<(), BusError> {
        self.write("power_ratio_limit", WriteOp::PowerRatioLimit(ratio))?;
        self.lock().power_ratio_limit = ratio;
        Ok(())
    }

    fn set_limit_current(&self, ratio: f32) -> Result<(), BusError> {
        self.write("limit_current", WriteOp::LimitCurrent(ratio))
    }

    fn set_encoder_res(&self, res: f32) -> Result<(), BusError> {
        self.write("encoder_res", WriteOp::EncoderRes(res))
    }

    fn set_reduction(&self, reduction: f32) -> Result<(), BusError> {
        self.write("reduction", WriteOp::Reduction(reduction))
    }

    fn set_wheel_size(&self, size: f32) -> Result<(), BusError> {
        self.write("wheel_size", WriteOp::WheelSize(size))
    }

    fn set_position_pid(&self, pid: Pid) -> Result<(), BusError> {
        self.write("position_pid", WriteOp::PositionPid(pid))
    }

    fn set_rot_position_mode(&self, enabled: bool) -> Result<(), BusError> {
        self.write("rot_position_mode", WriteOp::RotPositionMode(enabled))
    }

    fn set_rot_speed_mode(&self, enabled: bool) -> Result<(), BusError> {
        self.write("rot_speed_mode", WriteOp::RotSpeedMode(enabled))
    }

    fn set_to_zero(&self) -> Result<(), BusError> {
        self.write("set_to_zero", WriteOp::SetToZero)?;
        self.lock().rot_position = 0.0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_recorded_in_order() {
        let disk = MockDisk::new("top");
        disk.set_compliant(false).unwrap();
        disk.set_target_rot_speed(50.0).unwrap();
        disk.set_target_rot_position(-270.0).unwrap();
        assert_eq!(
            disk.writes(),
            vec![
                WriteOp::Compliant(false),
                WriteOp::TargetRotSpeed(50.0),
                WriteOp::TargetRotPosition(-270.0),
            ]
        );
    }

    #[test]
    fn speed_script_replays_then_repeats_last() {
        let disk = MockDisk::new("top");
        disk.script_speeds([-12.0, -8.0, 0.0]);
        assert!((disk.rot_speed().unwrap() - (-12.0)).abs() < f32::EPSILON);
        assert!((disk.rot_speed().unwrap() - (-8.0)).abs() < f32::EPSILON);
        assert!(disk.rot_speed().unwrap().abs() < f32::EPSILON);
        // Drained script keeps returning the final value.
        assert!(disk.rot_speed().unwrap().abs() < f32::EPSILON);
        assert_eq!(disk.rot_speed_reads(), 4);
    }

    #[test]
    fn unscripted_speed_reads_zero() {
        let disk = MockDisk::new("top");
        assert!(disk.rot_speed().unwrap().abs() < f32::EPSILON);
    }

    #[test]
    fn set_to_zero_clears_position() {
        let disk = MockDisk::with_position("top", -250.0);
        assert!((disk.rot_position().unwrap() - (-250.0)).abs() < f32::EPSILON);
        disk.set_to_zero().unwrap();
        assert!(disk.rot_position().unwrap().abs() < f32::EPSILON);
        assert_eq!(disk.writes(), vec![WriteOp::SetToZero]);
    }

    #[test]
    fn injected_write_failure() {
        let disk = MockDisk::new("middle").fail_writes_to("compliant");
        let err = disk.set_compliant(false).unwrap_err();
        assert!(matches!(
            err,
            BusError::Write {
                register: "compliant",
                ..
            }
        ));
        // The failed write must not reach the journal or the cached state.
        assert!(disk.writes().is_empty());
        assert!(!disk.compliant().unwrap());
    }

    #[test]
    fn target_registers_read_back() {
        let disk = MockDisk::new("bottom");
        disk.set_target_rot_position(102.0).unwrap();
        disk.set_target_rot_speed(50.0).unwrap();
        assert!((disk.target_rot_position().unwrap() - 102.0).abs() < f32::EPSILON);
        assert!((disk.target_rot_speed().unwrap() - 50.0).abs() < f32::EPSILON);
    }
}
