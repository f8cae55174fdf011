//! # Pose Mapping
//!
//! Converts human joint angles into servo positions using the per-joint calibration ranges.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{JointId, NUM_JOINTS};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Human angle which maps onto the low end of a joint's range.
///
/// Units: degrees
pub const HUMAN_ANGLE_MIN_DEG: f64 = 0.0;

/// Human angle which maps onto the high end of a joint's range.
///
/// Units: degrees
pub const HUMAN_ANGLE_MAX_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Servo position limits of a single joint.
///
/// `lo == hi` is allowed and pins the joint to a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointRange {
    pub joint: JointId,

    /// Lowest permitted position, servo units
    pub lo: i32,

    /// Highest permitted position, servo units
    pub hi: i32,
}

/// Validated ranges for every joint of the arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calibration {
    /// Always holds exactly [`NUM_JOINTS`] ranges in joint order
    ranges: Vec<JointRange>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("{0} has an inverted range ({1} > {2})")]
    InvertedRange(JointId, i32, i32),

    #[error("{0} is calibrated more than once")]
    DuplicateJoint(JointId),

    #[error("{0} has no calibration")]
    MissingJoint(JointId),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointRange {
    pub fn new(joint: JointId, lo: i32, hi: i32) -> Result<Self, CalibrationError> {
        if lo > hi {
            return Err(CalibrationError::InvertedRange(joint, lo, hi));
        }

        Ok(Self { joint, lo, hi })
    }

    /// Linearly map a human angle onto this joint's range, truncating toward zero.
    ///
    /// 0 degrees maps to `lo` and 180 degrees to `hi`. Angles outside that span extrapolate, the
    /// result is not clamped.
    pub fn human_angle_to_servo(&self, angle_deg: f64) -> i32 {
        lin_map(
            (HUMAN_ANGLE_MIN_DEG, HUMAN_ANGLE_MAX_DEG),
            (self.lo as f64, self.hi as f64),
            angle_deg,
        ) as i32
    }

    /// Limit a position to `[lo, hi]`.
    pub fn clamp(&self, position: i32) -> i32 {
        position.clamp(self.lo, self.hi)
    }

    /// Map then clamp, giving a position which is always safe to send.
    pub fn map_angle(&self, angle_deg: f64) -> i32 {
        self.clamp(self.human_angle_to_servo(angle_deg))
    }

    /// Returns true if the position lies within the range.
    pub fn contains(&self, position: i32) -> bool {
        position >= self.lo && position <= self.hi
    }

    /// Centre of the range, rounded down.
    pub fn midpoint(&self) -> i32 {
        self.lo + (self.hi - self.lo) / 2
    }
}

impl Calibration {
    /// Build a calibration from a list of ranges which must name every joint exactly once.
    pub fn new<I>(ranges: I) -> Result<Self, CalibrationError>
    where
        I: IntoIterator<Item = JointRange>,
    {
        let mut slots: [Option<JointRange>; NUM_JOINTS] = [None; NUM_JOINTS];

        for r in ranges {
            if r.lo > r.hi {
                return Err(CalibrationError::InvertedRange(r.joint, r.lo, r.hi));
            }

            let slot = &mut slots[r.joint.index()];
            if slot.is_some() {
                return Err(CalibrationError::DuplicateJoint(r.joint));
            }
            *slot = Some(r);
        }

        let ranges = JointId::all()
            .zip(slots.iter())
            .map(|(joint, s)| s.ok_or(CalibrationError::MissingJoint(joint)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ranges })
    }

    /// Range of the given joint.
    pub fn range(&self, joint: JointId) -> &JointRange {
        &self.ranges[joint.index()]
    }

    /// All ranges in joint order.
    pub fn ranges(&self) -> &[JointRange] {
        &self.ranges
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn j(id: u8) -> JointId {
        JointId::new(id).unwrap()
    }

    fn shoulder() -> JointRange {
        JointRange::new(j(4), 150, 850).unwrap()
    }

    #[test]
    fn test_map_endpoints() {
        let r = shoulder();
        assert_eq!(r.human_angle_to_servo(0.0), 150);
        assert_eq!(r.human_angle_to_servo(180.0), 850);
        assert_eq!(r.human_angle_to_servo(90.0), 500);

        let elbow = JointRange::new(j(3), 0, 1000).unwrap();
        assert_eq!(elbow.human_angle_to_servo(0.0), 0);
        assert_eq!(elbow.human_angle_to_servo(180.0), 1000);
        assert_eq!(elbow.human_angle_to_servo(90.0), 500);
    }

    #[test]
    fn test_map_truncates() {
        let elbow = JointRange::new(j(3), 0, 1000).unwrap();
        // 1 degree is 5.555.. units
        assert_eq!(elbow.human_angle_to_servo(1.0), 5);
    }

    #[test]
    fn test_clamp() {
        let r = shoulder();
        assert_eq!(r.clamp(100), 150);
        assert_eq!(r.clamp(900), 850);
        assert_eq!(r.clamp(400), 400);

        for p in [-1000, 0, 150, 151, 500, 849, 850, 2000] {
            assert_eq!(r.clamp(r.clamp(p)), r.clamp(p));
            assert!(r.contains(r.clamp(p)));
        }
    }

    #[test]
    fn test_map_angle_always_in_range() {
        let r = shoulder();
        for a in [-90.0, 0.0, 45.0, 180.0, 270.0, f64::NAN] {
            assert!(r.contains(r.map_angle(a)));
        }
    }

    #[test]
    fn test_fixed_joint() {
        let r = JointRange::new(j(2), 500, 500).unwrap();
        assert_eq!(r.map_angle(0.0), 500);
        assert_eq!(r.map_angle(123.0), 500);
        assert_eq!(r.midpoint(), 500);
    }

    #[test]
    fn test_inverted_range() {
        assert_eq!(
            JointRange::new(j(1), 10, 5),
            Err(CalibrationError::InvertedRange(j(1), 10, 5))
        );
    }

    #[test]
    fn test_calibration() {
        let ranges: Vec<JointRange> = JointId::all()
            .map(|id| JointRange::new(id, 0, 1000).unwrap())
            .collect();

        let cal = Calibration::new(ranges.clone()).unwrap();
        assert_eq!(cal.range(j(5)).joint, j(5));

        assert_eq!(
            Calibration::new(ranges[1..].to_vec()),
            Err(CalibrationError::MissingJoint(j(1)))
        );

        let mut dup = ranges.clone();
        dup.push(ranges[2]);
        assert_eq!(
            Calibration::new(dup),
            Err(CalibrationError::DuplicateJoint(j(3)))
        );
    }
}
