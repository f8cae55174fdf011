//! # Landmark Estimators
//!
//! Turn frames into labelled body and hand landmarks. Estimation runs on the control loop's
//! thread, after a frame has been taken from the frame buffer.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod subprocess;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::LandmarkFrame;

pub use subprocess::SubprocessEstimator;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can find landmarks in a frame.
pub trait LandmarkEstimator {
    type Frame;

    /// Estimate the landmarks in the frame.
    ///
    /// Finding no person is not an error, it gives a frame with no landmarks.
    fn process(&mut self, frame: Self::Frame) -> Result<LandmarkFrame, EstimatorError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimator for sources which already produce landmarks, such as a replay.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("Could not start the estimator process: {0}")]
    Spawn(std::io::Error),

    #[error("Estimator did not signal it was ready, got {0:?}")]
    NotReady(String),

    #[error("Could not send a frame to the estimator: {0}")]
    Send(std::io::Error),

    #[error("Could not read from the estimator: {0}")]
    Receive(std::io::Error),

    #[error("The estimator process has exited")]
    Exited,

    #[error("Could not parse the estimator's reply: {0}")]
    InvalidReply(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LandmarkEstimator for Passthrough {
    type Frame = LandmarkFrame;

    fn process(&mut self, frame: LandmarkFrame) -> Result<LandmarkFrame, EstimatorError> {
        Ok(frame)
    }
}
