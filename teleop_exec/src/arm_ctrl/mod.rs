//! Arm control module
//!
//! Owns the arm's servo state and is the only writer of it. Every operation updates the state
//! with clamped positions and then dispatches the full state to the servo driver.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod servo_state;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use servo_state::*;
pub use state::*;

use crate::{pose_map::CalibrationError, servo_ctrl::ServoError};
use comms_if::eqpt::JointId;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(#[from] CalibrationError),

    #[error("Neutral position {1} of {0} is outside its range")]
    NeutralOutOfRange(JointId, i32),

    #[error("Claw {0} position {1} is outside the claw's range")]
    ClawOutOfRange(&'static str, i32),

    #[error("{0} is assigned to more than one role")]
    RoleConflict(JointId),

    #[error("Dispatch failed after {0} attempt(s), arm state is unknown: {1}")]
    DispatchFailed(u32, ServoError),
}
