//! Three-disk spherical actuator.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};

use armature_bus::MotorBus;
use armature_core::config::{DiskConfig, HomingConfig};
use armature_core::error::{ArmatureError, BusError, CommandError, HomingError};
use armature_core::types::{DiskId, DISK_COUNT};

use crate::homing;
use crate::kinematics::SphericalModel;

/// Sign correction between the kinematics convention and the disk
/// encoders, which count the other way. Every solver output is multiplied
/// by this before it reaches a disk register.
pub const ENCODER_SIGN: f32 = -1.0;

/// A spherical joint driven by three stacked disks.
///
/// Disk order is `[Top, Middle, Bottom]` everywhere; every fan-out walks
/// the disks in that order and stops at the first bus failure, leaving the
/// earlier disks applied. Cached state (`compliant`, `moving_speed`) is
/// only updated once all three writes have succeeded, so after a partial
/// failure the cache still reports the last fully-applied value.
pub struct SphericalActuator {
    pub(crate) disks: [Arc<dyn MotorBus>; DISK_COUNT],
    pub(crate) model: Box<dyn SphericalModel>,
    compliant: bool,
    moving_speed: f32,
    pub(crate) homed: bool,
}

impl SphericalActuator {
    /// Build the actuator and run the hardware setup sequence on each disk.
    ///
    /// Setup writes, per disk in order: current limit, encoder resolution,
    /// reduction, wheel size, position PID, both control-mode flags, then a
    /// zero reference, a settle delay, and the default target speed. The
    /// zero-settle-speed ordering is a firmware contract.
    pub fn new(
        top: Arc<dyn MotorBus>,
        middle: Arc<dyn MotorBus>,
        bottom: Arc<dyn MotorBus>,
        model: Box<dyn SphericalModel>,
        config: &DiskConfig,
    ) -> Result<Self, BusError> {
        let disks = [top, middle, bottom];
        for (id, disk) in DiskId::ALL.iter().zip(&disks) {
            tracing::debug!(disk = %id, "setup");
            disk.set_limit_current(config.current_limit)?;
            disk.set_encoder_res(config.encoder_res)?;
            disk.set_reduction(config.reduction)?;
            disk.set_wheel_size(config.wheel_size)?;
            disk.set_position_pid(config.pid)?;
            disk.set_rot_position_mode(true)?;
            disk.set_rot_speed_mode(true)?;
            disk.set_to_zero()?;
            thread::sleep(config.settle());
            disk.set_target_rot_speed(config.moving_speed)?;
        }
        Ok(Self {
            disks,
            model,
            compliant: false,
            moving_speed: config.moving_speed,
            homed: false,
        })
    }

    /// The three disks in `[Top, Middle, Bottom]` order.
    #[must_use]
    pub fn disks(&self) -> &[Arc<dyn MotorBus>; DISK_COUNT] {
        &self.disks
    }

    #[must_use]
    pub fn disk(&self, id: DiskId) -> &Arc<dyn MotorBus> {
        &self.disks[id.index()]
    }

    /// Cached compliance state, last value applied to all three disks.
    #[must_use]
    pub fn compliant(&self) -> bool {
        self.compliant
    }

    pub fn set_compliant(&mut self, compliant: bool) -> Result<(), BusError> {
        for disk in &self.disks {
            disk.set_compliant(compliant)?;
        }
        self.compliant = compliant;
        Ok(())
    }

    /// Cached moving speed, last value applied to all three disks.
    #[must_use]
    pub fn moving_speed(&self) -> f32 {
        self.moving_speed
    }

    /// Apply a new target speed to all three disks. Non-positive speeds
    /// are refused and logged, leaving the disks untouched.
    pub fn set_moving_speed(&mut self, degrees_per_sec: f32) -> Result<(), BusError> {
        if degrees_per_sec <= 0.0 {
            tracing::warn!(speed = degrees_per_sec, "ignoring non-positive moving speed");
            return Ok(());
        }
        for disk in &self.disks {
            disk.set_target_rot_speed(degrees_per_sec)?;
        }
        self.moving_speed = degrees_per_sec;
        Ok(())
    }

    /// Whether homing has completed since construction.
    #[must_use]
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Point the platform's forward axis along `vector`, spun about it by
    /// `angle` degrees. Immediate-target command.
    pub fn point_at(&mut self, vector: Vector3<f32>, angle: f32) -> Result<(), ArmatureError> {
        self.ensure_homed()?;
        let angles = self.model.angles_from_vector(vector, angle);
        for (disk, theta) in self.disks.iter().zip(angles) {
            disk.set_target_rot_position(ENCODER_SIGN * theta)?;
        }
        Ok(())
    }

    /// Rotate the platform to `orientation`.
    ///
    /// With a positive `duration` each disk's speed is limited to
    /// `|target - position| / duration` so all three arrive together; this
    /// is a speed-limited step, not a trajectory. `wait` sleeps exactly
    /// `duration` and is a no-op without a positive duration; it does not
    /// confirm arrival.
    pub fn orient(
        &mut self,
        orientation: &UnitQuaternion<f32>,
        duration: Option<f32>,
        wait: bool,
    ) -> Result<(), ArmatureError> {
        self.ensure_homed()?;
        self.orient_internal(orientation, duration, wait)?;
        Ok(())
    }

    pub(crate) fn orient_internal(
        &mut self,
        orientation: &UnitQuaternion<f32>,
        duration: Option<f32>,
        wait: bool,
    ) -> Result<(), BusError> {
        let angles = self.model.angles_from_quaternion(orientation);
        let targets = angles.map(|theta| ENCODER_SIGN * theta);

        let duration = duration.filter(|d| *d > 0.0);
        if let Some(duration) = duration {
            for (disk, target) in self.disks.iter().zip(targets) {
                let speed = (target - disk.rot_position()?).abs() / duration;
                disk.set_target_rot_speed(speed)?;
            }
        }
        for (disk, target) in self.disks.iter().zip(targets) {
            disk.set_target_rot_position(target)?;
        }
        if wait {
            if let Some(duration) = duration {
                thread::sleep(Duration::from_secs_f32(duration));
            }
        }
        Ok(())
    }

    /// Run the homing calibration sequence.
    ///
    /// On success the actuator is zero-referenced against its hard stop and
    /// orientation commands are unlocked. On any error it stays not-homed.
    pub fn home(&mut self, config: &HomingConfig) -> Result<(), HomingError> {
        self.homed = false;
        homing::run(self, config)?;
        self.homed = true;
        tracing::info!("homing complete");
        Ok(())
    }

    fn ensure_homed(&self) -> Result<(), CommandError> {
        if self.homed {
            Ok(())
        } else {
            Err(CommandError::NotHomed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use armature_bus::mock::{MockDisk, WriteOp};
    use armature_core::types::Pid;

    struct StubModel {
        angles: [f32; DISK_COUNT],
        resets: usize,
    }

    impl StubModel {
        fn new(angles: [f32; DISK_COUNT]) -> Self {
            Self { angles, resets: 0 }
        }
    }

    impl SphericalModel for StubModel {
        fn angles_from_vector(&mut self, _: Vector3<f32>, _: f32) -> [f32; DISK_COUNT] {
            self.angles
        }

        fn angles_from_quaternion(&mut self, _: &UnitQuaternion<f32>) -> [f32; DISK_COUNT] {
            self.angles
        }

        fn reset_reference_angles(&mut self) {
            self.resets += 1;
        }
    }

    fn fast_config() -> DiskConfig {
        DiskConfig {
            settle_s: 0.0,
            ..DiskConfig::default()
        }
    }

    fn actuator_with(
        angles: [f32; DISK_COUNT],
    ) -> (SphericalActuator, [Arc<MockDisk>; DISK_COUNT]) {
        let disks = [
            Arc::new(MockDisk::new("top")),
            Arc::new(MockDisk::new("middle")),
            Arc::new(MockDisk::new("bottom")),
        ];
        let actuator = SphericalActuator::new(
            Arc::clone(&disks[0]) as _,
            Arc::clone(&disks[1]) as _,
            Arc::clone(&disks[2]) as _,
            Box::new(StubModel::new(angles)),
            &fast_config(),
        )
        .unwrap();
        (actuator, disks)
    }

    fn writes_after_setup(disk: &MockDisk) -> Vec<WriteOp> {
        // Setup issues nine writes per disk.
        disk.writes().split_off(9)
    }

    #[test]
    fn setup_write_sequence() {
        let (_, disks) = actuator_with([0.0; 3]);
        for disk in &disks {
            assert_eq!(
                disk.writes(),
                vec![
                    WriteOp::LimitCurrent(0.4),
                    WriteOp::EncoderRes(5.0),
                    WriteOp::Reduction(214.0),
                    WriteOp::WheelSize(62.0),
                    WriteOp::PositionPid(Pid::new(9.0, 0.02, 100.0)),
                    WriteOp::RotPositionMode(true),
                    WriteOp::RotSpeedMode(true),
                    WriteOp::SetToZero,
                    WriteOp::TargetRotSpeed(50.0),
                ]
            );
        }
    }

    #[test]
    fn setup_failure_bubbles() {
        let top = Arc::new(MockDisk::new("top").fail_writes_to("limit_current"));
        let result = SphericalActuator::new(
            top as _,
            Arc::new(MockDisk::new("middle")) as _,
            Arc::new(MockDisk::new("bottom")) as _,
            Box::new(StubModel::new([0.0; 3])),
            &fast_config(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn compliance_fans_out_and_caches() {
        let (mut actuator, disks) = actuator_with([0.0; 3]);
        assert!(!actuator.compliant());
        actuator.set_compliant(true).unwrap();
        assert!(actuator.compliant());
        for disk in &disks {
            assert_eq!(writes_after_setup(disk), vec![WriteOp::Compliant(true)]);
        }
    }

    #[test]
    fn partial_compliance_failure_keeps_cache() {
        let disks = [
            Arc::new(MockDisk::new("top")),
            Arc::new(MockDisk::new("middle").fail_writes_to("compliant")),
            Arc::new(MockDisk::new("bottom")),
        ];
        let mut actuator = SphericalActuator::new(
            Arc::clone(&disks[0]) as _,
            Arc::clone(&disks[1]) as _,
            Arc::clone(&disks[2]) as _,
            Box::new(StubModel::new([0.0; 3])),
            &fast_config(),
        )
        .unwrap();

        assert!(actuator.set_compliant(true).is_err());
        // Top was reached, bottom was not, cache reports the old value.
        assert_eq!(
            writes_after_setup(&disks[0]),
            vec![WriteOp::Compliant(true)]
        );
        assert!(writes_after_setup(&disks[2]).is_empty());
        assert!(!actuator.compliant());
    }

    #[test]
    fn moving_speed_fans_out_and_caches() {
        let (mut actuator, disks) = actuator_with([0.0; 3]);
        assert_relative_eq!(actuator.moving_speed(), 50.0);
        actuator.set_moving_speed(75.0).unwrap();
        assert_relative_eq!(actuator.moving_speed(), 75.0);
        for disk in &disks {
            assert_eq!(
                writes_after_setup(disk),
                vec![WriteOp::TargetRotSpeed(75.0)]
            );
        }
    }

    #[test]
    fn non_positive_moving_speed_is_refused() {
        let (mut actuator, disks) = actuator_with([0.0; 3]);
        actuator.set_moving_speed(-5.0).unwrap();
        assert_relative_eq!(actuator.moving_speed(), 50.0);
        for disk in &disks {
            assert!(writes_after_setup(disk).is_empty());
        }
    }

    #[test]
    fn point_at_requires_homing() {
        let (mut actuator, disks) = actuator_with([1.0, 2.0, 3.0]);
        let err = actuator
            .point_at(Vector3::new(0.0, 0.0, 1.0), 0.0)
            .unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::Command(CommandError::NotHomed)
        ));
        for disk in &disks {
            assert!(writes_after_setup(disk).is_empty());
        }
    }

    #[test]
    fn orient_requires_homing() {
        let (mut actuator, _) = actuator_with([0.0; 3]);
        let err = actuator
            .orient(&UnitQuaternion::identity(), None, false)
            .unwrap_err();
        assert!(matches!(
            err,
            ArmatureError::Command(CommandError::NotHomed)
        ));
    }

    #[test]
    fn point_at_negates_solver_output() {
        let (mut actuator, disks) = actuator_with([1.0, 2.0, 3.0]);
        actuator.homed = true;
        actuator.point_at(Vector3::new(0.0, 0.0, 1.0), 0.0).unwrap();
        for (disk, expected) in disks.iter().zip([-1.0, -2.0, -3.0]) {
            assert_eq!(
                writes_after_setup(disk),
                vec![WriteOp::TargetRotPosition(expected)]
            );
        }
    }

    #[test]
    fn orient_limits_speed_before_position() {
        let (mut actuator, disks) = actuator_with([-1.0, -2.0, -3.0]);
        actuator.homed = true;
        actuator
            .orient(&UnitQuaternion::identity(), Some(2.0), false)
            .unwrap();
        // Targets are [1, 2, 3]; disks sit at 0, so speeds are
        // |target| / 2.
        for (disk, (speed, target)) in disks
            .iter()
            .zip([(0.5, 1.0), (1.0, 2.0), (1.5, 3.0)])
        {
            assert_eq!(
                writes_after_setup(disk),
                vec![
                    WriteOp::TargetRotSpeed(speed),
                    WriteOp::TargetRotPosition(target),
                ]
            );
        }
    }

    #[test]
    fn orient_without_duration_writes_positions_only() {
        let (mut actuator, disks) = actuator_with([-1.0, -1.0, -1.0]);
        actuator.homed = true;
        actuator
            .orient(&UnitQuaternion::identity(), None, true)
            .unwrap();
        for disk in &disks {
            assert_eq!(
                writes_after_setup(disk),
                vec![WriteOp::TargetRotPosition(1.0)]
            );
        }
    }
}
