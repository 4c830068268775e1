//! Inverse kinematics of the three-disk spherical joint.

use nalgebra::{UnitQuaternion, Vector3};

use armature_core::config::GeometryConfig;
use armature_core::types::DISK_COUNT;

/// Maps a desired platform orientation to the three disk angles that
/// produce it.
///
/// Angles are in degrees, in `[Top, Middle, Bottom]` order, and continuous
/// across calls: consecutive orientations yield consecutive angles with no
/// 360-degree jumps. Implementations carry that unwrapping state, which is
/// why the methods take `&mut self`.
pub trait SphericalModel: Send {
    /// Disk angles that point the platform's forward axis along `vector`,
    /// spun about it by `angle` degrees.
    fn angles_from_vector(&mut self, vector: Vector3<f32>, angle: f32) -> [f32; DISK_COUNT];

    /// Disk angles that realize `orientation`.
    fn angles_from_quaternion(&mut self, orientation: &UnitQuaternion<f32>) -> [f32; DISK_COUNT];

    /// Forget the unwrapping history and treat the present pose as the new
    /// angular reference. Called after the disks are re-zeroed.
    fn reset_reference_angles(&mut self);
}

/// Geometric model built from the crown layout of the joint.
///
/// Each drive arm roots on the crown at a fixed angular offset. A platform
/// orientation moves the arm attachment points; the disk angle is the
/// rotation of the attachment point's projection in the disk plane,
/// measured from the arm's root offset.
#[derive(Debug, Clone)]
pub struct CrownModel {
    attachments: [Vector3<f32>; DISK_COUNT],
    root_offsets: [f32; DISK_COUNT],
    last_angles: [f32; DISK_COUNT],
}

impl CrownModel {
    #[must_use]
    pub fn new(geometry: &GeometryConfig) -> Self {
        let pivot = Vector3::from(geometry.pivot_center) - Vector3::from(geometry.crown_pivot);
        let mut attachments = [Vector3::zeros(); DISK_COUNT];
        for (point, offset) in attachments.iter_mut().zip(geometry.arm_root_offsets) {
            let phi = offset.to_radians();
            *point = Vector3::new(
                geometry.crown_radius * phi.cos(),
                geometry.crown_radius * phi.sin(),
                pivot.z,
            );
        }
        Self {
            attachments,
            root_offsets: geometry.arm_root_offsets,
            last_angles: [0.0; DISK_COUNT],
        }
    }

    /// Shift `angle` by whole turns so it lands nearest to `reference`.
    fn unwrap_near(angle: f32, reference: f32) -> f32 {
        let turns = ((reference - angle) / 360.0).round();
        angle + turns * 360.0
    }
}

impl SphericalModel for CrownModel {
    fn angles_from_vector(&mut self, vector: Vector3<f32>, angle: f32) -> [f32; DISK_COUNT] {
        let direction = if vector.norm() > f32::EPSILON {
            vector.normalize()
        } else {
            Vector3::z()
        };
        let tilt = UnitQuaternion::rotation_between(&Vector3::z(), &direction)
            .unwrap_or_else(|| {
                // Opposite vectors have no unique rotation; flip about x.
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
            });
        let spin = UnitQuaternion::from_scaled_axis(direction * angle.to_radians());
        self.angles_from_quaternion(&(spin * tilt))
    }

    fn angles_from_quaternion(&mut self, orientation: &UnitQuaternion<f32>) -> [f32; DISK_COUNT] {
        let mut angles = [0.0; DISK_COUNT];
        for i in 0..DISK_COUNT {
            let moved = orientation * self.attachments[i];
            let raw = moved.y.atan2(moved.x).to_degrees() - self.root_offsets[i];
            angles[i] = Self::unwrap_near(raw, self.last_angles[i]);
        }
        self.last_angles = angles;
        angles
    }

    fn reset_reference_angles(&mut self) {
        self.last_angles = [0.0; DISK_COUNT];
    }
}
