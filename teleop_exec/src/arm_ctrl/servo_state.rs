//! Commanded joint positions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{ArmDems, JointId, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The last commanded position of every joint.
///
/// Only [`super::ArmCtrl`] writes to the state, and every position it holds has been clamped to
/// its joint's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoState {
    pub(crate) positions: [i32; NUM_JOINTS],

    pub(crate) in_sync: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ServoState {
    /// Commanded position of a joint.
    pub fn get(&self, joint: JointId) -> i32 {
        self.positions[joint.index()]
    }

    /// All commanded positions in joint order.
    pub fn positions(&self) -> &[i32; NUM_JOINTS] {
        &self.positions
    }

    /// Returns false if the last dispatch failed, in which case the physical arm may not be at
    /// the commanded positions.
    pub fn is_in_sync(&self) -> bool {
        self.in_sync
    }

    /// Build full-state demands from the current positions.
    pub fn to_dems(&self, duration_ms: u16) -> ArmDems {
        ArmDems {
            positions: JointId::all().map(|j| (j, self.get(j))).collect(),
            duration_ms,
        }
    }
}
