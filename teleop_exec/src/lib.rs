//! # Teleoperation library.
//!
//! Pose-driven teleoperation of a six joint servo arm. A camera (or a recording) supplies
//! frames, an estimator finds the operator's body and hand landmarks, and the arm's shoulder,
//! elbow and claw are driven to follow the operator's arm.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Acquisition thread - moves frames from a source into the frame buffer
pub mod acquisition;

/// Scripted arm sequences (pick, drop)
pub mod arm_seq;

/// Joint angle calculation from three points
pub mod angle;

/// Arm control - owns the servo state and dispatches it to the servo driver
pub mod arm_ctrl;

/// Landmark estimators - turn frames into landmarks
pub mod estimator;

/// Single slot drop-oldest frame buffer
pub mod frame_buffer;

/// Frame sources - cameras and recordings
pub mod frame_source;

/// Hand open/closed classification
pub mod hand_state;

/// Executable parameters
pub mod params;

/// Frame source and estimator construction
pub mod pipeline;

/// Human angle to servo position mapping
pub mod pose_map;

/// Reduction of landmarks to pose samples
pub mod pose_sample;

/// Servo controller drivers
pub mod servo_ctrl;

/// The teleoperation control loop
pub mod teleop;

/// Command throttle
pub mod throttle;
