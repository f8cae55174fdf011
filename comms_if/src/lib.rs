//! # Communications interface crate.
//!
//! Provides the data types exchanged between the teleoperation software and its collaborators:
//! the landmark estimator, the camera and the arm's servo controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Definitions for equipment (camera, landmark estimator and arm)
pub mod eqpt;
