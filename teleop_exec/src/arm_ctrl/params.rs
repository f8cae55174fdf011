//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::JointId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- CALIBRATION ----
    /// Range of every joint. Each of the 6 joints must appear exactly once.
    pub joints: Vec<JointParams>,

    /// Claw position when the hand is open.
    ///
    /// Units: servo units
    pub claw_open: i32,

    /// Claw position when the hand is closed.
    ///
    /// Units: servo units
    pub claw_closed: i32,

    // ---- ROLES ----
    /// Joint driven by the operator's shoulder angle
    pub shoulder_joint: JointId,

    /// Joint driven by the operator's elbow angle
    pub elbow_joint: JointId,

    /// Joint driving the claw
    pub claw_joint: JointId,

    // ---- DISPATCH ----
    /// Duration the controller is asked to take over each move.
    ///
    /// Units: milliseconds
    pub move_duration_ms: u16,

    /// Wait after each completed move.
    ///
    /// Units: milliseconds
    pub settle_ms: u64,

    /// Total number of attempts made to send one dispatch before giving up.
    pub max_dispatch_attempts: u32,

    /// Wait between attempts.
    ///
    /// Units: milliseconds
    pub retry_delay_ms: u64,
}

/// Calibration of a single joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointParams {
    pub id: JointId,

    /// Human readable name, used in logs only
    #[serde(default)]
    pub name: String,

    /// Units: servo units
    pub lo: i32,

    /// Units: servo units
    pub hi: i32,

    /// Position in the neutral pose. Defaults to the middle of the range.
    ///
    /// Units: servo units
    #[serde(default)]
    pub neutral: Option<i32>,
}

#[cfg(test)]
impl Params {
    /// The demo arm's calibration with no waits between moves.
    pub(crate) fn demo() -> Self {
        let joint = |id: u8, name: &str, lo: i32, hi: i32| JointParams {
            id: JointId::new(id).unwrap(),
            name: name.into(),
            lo,
            hi,
            neutral: None,
        };

        Self {
            joints: vec![
                joint(1, "claw", 0, 700),
                joint(2, "wrist_rot", 500, 500),
                joint(3, "elbow", 0, 1000),
                joint(4, "shoulder", 150, 850),
                joint(5, "wrist", 500, 500),
                joint(6, "base", 500, 500),
            ],
            claw_open: 0,
            claw_closed: 700,
            shoulder_joint: JointId::new(4).unwrap(),
            elbow_joint: JointId::new(3).unwrap(),
            claw_joint: JointId::new(1).unwrap(),
            move_duration_ms: 1000,
            settle_ms: 0,
            max_dispatch_attempts: 2,
            retry_delay_ms: 0,
        }
    }
}
