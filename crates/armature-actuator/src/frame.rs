//! Conversion between a motor's hardware frame and its local joint frame.

use armature_core::config::MotorConfig;

/// Maps positions between the hardware register frame and the local joint
/// frame of one single-axis motor.
///
/// The hardware frame is what the bus registers speak; the local frame is
/// what kinematics and callers speak. The two differ by a sign convention
/// and a zero offset:
///
/// ```text
/// local = sign * raw - offset
/// raw   = (local + offset) * sign
/// ```
///
/// where `sign` is `+1` for a direct motor and `-1` for an indirect one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    offset: f32,
    direct: bool,
}

impl FrameTransform {
    #[must_use]
    pub const fn new(offset: f32, direct: bool) -> Self {
        Self { offset, direct }
    }

    #[must_use]
    pub const fn from_config(config: &MotorConfig) -> Self {
        Self::new(config.offset, config.orientation.is_direct())
    }

    /// Convert a hardware-frame position to the local frame.
    #[must_use]
    pub fn to_local(&self, raw: f32) -> f32 {
        let signed = if self.direct { raw } else { -raw };
        signed - self.offset
    }

    /// Convert a local-frame position to the hardware frame.
    #[must_use]
    pub fn to_raw(&self, local: f32) -> f32 {
        let shifted = local + self.offset;
        if self.direct {
            shifted
        } else {
            -shifted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn direct_with_offset() {
        let frame = FrameTransform::new(10.0, true);
        assert_relative_eq!(frame.to_local(40.0), 30.0);
        assert_relative_eq!(frame.to_raw(30.0), 40.0);
    }

    #[test]
    fn indirect_with_offset() {
        let frame = FrameTransform::new(10.0, false);
        assert_relative_eq!(frame.to_local(40.0), -50.0);
        assert_relative_eq!(frame.to_raw(-50.0), 40.0);
    }

    #[test]
    fn identity_when_direct_and_no_offset() {
        let frame = FrameTransform::new(0.0, true);
        for raw in [-180.0, -1.5, 0.0, 33.3, 270.0] {
            assert_relative_eq!(frame.to_local(raw), raw);
            assert_relative_eq!(frame.to_raw(raw), raw);
        }
    }

    #[test]
    fn roundtrip_both_orientations() {
        for direct in [true, false] {
            let frame = FrameTransform::new(-22.5, direct);
            for local in [-90.0, 0.0, 45.0] {
                assert_relative_eq!(frame.to_local(frame.to_raw(local)), local, epsilon = 1e-5);
            }
        }
    }
}
