//! # Equipment Interfaces

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod arm;
pub mod cam;
pub mod landmarks;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use arm::{ArmDems, JointId, NUM_JOINTS};
pub use cam::{CamFrame, FrameFormat};
pub use landmarks::{Landmark, LandmarkFrame, LandmarkIndex};
