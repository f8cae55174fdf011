//! V4L2 camera source

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::Utc;
use comms_if::eqpt::{CamFrame, FrameFormat};
use log::info;
use rscam::{Camera, Config};

use super::{FrameSource, SourceError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A V4L2 camera delivering MJPEG frames.
pub struct V4lCamera {
    camera: Camera,

    next_seq: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl V4lCamera {
    /// Open and start the camera at the given resolution and frame rate.
    pub fn open(device: &str, width: u32, height: u32, fps: u32) -> Result<Self, SourceError> {
        let mut camera = Camera::new(device).map_err(SourceError::CameraOpen)?;

        camera
            .start(&Config {
                interval: (1, fps.max(1)),
                resolution: (width, height),
                format: b"MJPG",
                ..Default::default()
            })
            .map_err(|e| SourceError::CameraStart(format!("{}", e)))?;

        info!(
            "Camera {} started at {}x{}, {} fps",
            device, width, height, fps
        );

        Ok(Self {
            camera,
            next_seq: 0,
        })
    }
}

impl FrameSource for V4lCamera {
    type Frame = CamFrame;

    fn next_frame(&mut self) -> Result<Option<CamFrame>, SourceError> {
        let raw = self.camera.capture().map_err(SourceError::Capture)?;
        let timestamp = Utc::now();

        let seq = self.next_seq;
        self.next_seq += 1;

        Ok(Some(CamFrame {
            seq,
            timestamp,
            width: raw.resolution.0,
            height: raw.resolution.1,
            format: FrameFormat::Mjpeg,
            data: raw.to_vec(),
        }))
    }
}
