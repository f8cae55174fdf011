//! # Frame Sources
//!
//! Producers of frames for the acquisition thread.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod replay;

#[cfg(feature = "cam")]
mod v4l;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::script_interpreter::ScriptError;

pub use replay::ReplaySource;

#[cfg(feature = "cam")]
pub use v4l::V4lCamera;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of frames, such as a camera or a recording.
pub trait FrameSource {
    type Frame;

    /// Block until the next frame is available.
    ///
    /// Returns `Ok(None)` once the source is exhausted, after which it must not be called again.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, SourceError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Could not load the replay script: {0}")]
    Script(#[from] ScriptError),

    #[error("Could not open the camera: {0}")]
    CameraOpen(std::io::Error),

    #[error("Could not start the camera: {0}")]
    CameraStart(String),

    #[error("Could not capture a frame: {0}")]
    Capture(std::io::Error),

    #[error("Could not spawn the acquisition thread: {0}")]
    Spawn(std::io::Error),

    #[error("The acquisition thread panicked")]
    ThreadPanicked,
}
