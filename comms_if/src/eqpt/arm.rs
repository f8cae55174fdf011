//! # Arm Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, convert::TryFrom, fmt};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of servo-controlled joints on the arm.
pub const NUM_JOINTS: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// ID of one of the arm's servos, as addressed on the servo bus (1 to [`NUM_JOINTS`]).
///
/// Which physical joint sits behind which id is a matter of calibration, see the `arm_ctrl`
/// parameters.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
#[serde(try_from = "u8", into = "u8")]
pub struct JointId(u8);

/// Full-state demands sent to the arm's servo controller.
///
/// Every dispatch carries a position for all [`NUM_JOINTS`] joints, even those which did not
/// change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArmDems {
    /// Demanded position of each joint in servo units.
    pub positions: BTreeMap<JointId, i32>,

    /// Time the controller should take to complete the move.
    ///
    /// Units: milliseconds
    pub duration_ms: u16,
}

/// Error returned when building a [`JointId`] from an out of range number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Joint IDs must be between 1 and {}, found {0}", NUM_JOINTS)]
pub struct InvalidJointId(pub u8);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// Create a new joint id, or `None` if outside 1 to [`NUM_JOINTS`].
    pub fn new(id: u8) -> Option<Self> {
        if id >= 1 && id as usize <= NUM_JOINTS {
            Some(Self(id))
        } else {
            None
        }
    }

    /// All joint ids in bus order.
    pub fn all() -> impl Iterator<Item = JointId> {
        (1..=NUM_JOINTS as u8).map(JointId)
    }

    /// The id as sent on the servo bus.
    pub fn bus_id(&self) -> u8 {
        self.0
    }

    /// Zero-based index of the joint, for array storage.
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for JointId {
    type Error = InvalidJointId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        JointId::new(value).ok_or(InvalidJointId(value))
    }
}

impl From<JointId> for u8 {
    fn from(id: JointId) -> Self {
        id.0
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.0)
    }
}

impl ArmDems {
    /// Returns true if the demands contain a position for every joint.
    pub fn is_full_state(&self) -> bool {
        JointId::all().all(|j| self.positions.contains_key(&j))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_id_range() {
        assert_eq!(JointId::new(0), None);
        assert_eq!(JointId::new(7), None);
        assert_eq!(JointId::new(1).map(|j| j.index()), Some(0));
        assert_eq!(JointId::all().count(), NUM_JOINTS);
        assert_eq!(JointId::try_from(9), Err(InvalidJointId(9)));
    }

    #[test]
    fn test_joint_id_serde() {
        let id: JointId = serde_json::from_str("4").unwrap();
        assert_eq!(id.bus_id(), 4);
        assert_eq!(serde_json::to_string(&id).unwrap(), "4");
        assert!(serde_json::from_str::<JointId>("0").is_err());
    }

    #[test]
    fn test_full_state() {
        let mut dems = ArmDems {
            positions: JointId::all().map(|j| (j, 500)).collect(),
            duration_ms: 1000,
        };
        assert!(dems.is_full_state());

        dems.positions.remove(&JointId::new(3).unwrap());
        assert!(!dems.is_full_state());
    }
}
