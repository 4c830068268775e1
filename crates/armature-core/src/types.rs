use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of independently driven disks in a spherical actuator.
pub const DISK_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// DiskId
// ---------------------------------------------------------------------------

/// Identifies one disk of a spherical actuator.
///
/// Disk order is significant: every per-disk iteration in the stack runs in
/// `[Top, Middle, Bottom]` order, matching the order the kinematics model
/// expects its angles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskId {
    Top,
    Middle,
    Bottom,
}

impl DiskId {
    /// All disks in canonical order.
    pub const ALL: [Self; DISK_COUNT] = [Self::Top, Self::Middle, Self::Bottom];

    /// Index of this disk in the canonical order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Middle => 1,
            Self::Bottom => 2,
        }
    }
}

impl fmt::Display for DiskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Pid
// ---------------------------------------------------------------------------

/// Position PID gains as written to a motor's gain registers.
///
/// The controller itself runs in motor firmware; this is only the value
/// carried to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pid {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl Pid {
    /// Create a new gain triple.
    #[must_use]
    pub const fn new(p: f32, i: f32, d: f32) -> Self {
        Self { p, i, d }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_order_is_top_middle_bottom() {
        assert_eq!(DiskId::ALL, [DiskId::Top, DiskId::Middle, DiskId::Bottom]);
        for (i, disk) in DiskId::ALL.iter().enumerate() {
            assert_eq!(disk.index(), i);
        }
    }

    #[test]
    fn disk_display_names() {
        assert_eq!(DiskId::Top.to_string(), "top");
        assert_eq!(DiskId::Middle.to_string(), "middle");
        assert_eq!(DiskId::Bottom.to_string(), "bottom");
    }

    #[test]
    fn pid_new() {
        let pid = Pid::new(9.0, 0.02, 100.0);
        assert!((pid.p - 9.0).abs() < f32::EPSILON);
        assert!((pid.i - 0.02).abs() < f32::EPSILON);
        assert!((pid.d - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pid_toml_roundtrip() {
        let pid = Pid::new(9.0, 0.02, 100.0);
        let text = toml::to_string(&pid).unwrap();
        let back: Pid = toml::from_str(&text).unwrap();
        assert_eq!(pid, back);
    }
}
