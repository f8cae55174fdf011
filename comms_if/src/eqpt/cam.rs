//! # Camera Frames

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the header written in front of each frame sent to the landmark estimator.
pub const FRAME_HEADER_LEN: usize = 12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single encoded frame captured from a camera.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CamFrame {
    /// Capture sequence number, strictly increasing per camera
    pub seq: u64,

    /// Time at which the frame was captured
    pub timestamp: DateTime<Utc>,

    /// Width of the image in pixels
    pub width: u32,

    /// Height of the image in pixels
    pub height: u32,

    /// Encoding of `data`
    pub format: FrameFormat,

    /// The encoded image
    #[serde(skip)]
    pub data: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible encodings of a [`CamFrame`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Mjpeg,
    Rgb24,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamFrame {
    /// Write the frame to an estimator: width, height and data length as little-endian `u32`s,
    /// followed by the encoded data.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u32::<LittleEndian>(self.width)?;
        w.write_u32::<LittleEndian>(self.height)?;
        w.write_u32::<LittleEndian>(self.data.len() as u32)?;
        w.write_all(&self.data)?;
        w.flush()
    }
}
