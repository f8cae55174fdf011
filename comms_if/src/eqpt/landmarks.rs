//! # Landmark Estimator Interface
//!
//! The landmark estimator is an external collaborator which turns a camera frame into a list of
//! labelled 2D points for the body and, optionally, for one hand. Ids follow the MediaPipe pose
//! and hand landmark conventions.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of landmarks in a full body pose.
pub const NUM_POSE_LANDMARKS: usize = 33;

/// Number of landmarks in a full hand.
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Body landmark ids used by the arm mapping.
pub mod pose_ids {
    pub const SHOULDER: u32 = 11;
    pub const ELBOW: u32 = 13;
    pub const WRIST: u32 = 15;
    pub const HIP: u32 = 23;
}

/// Hand landmark ids.
pub mod hand_ids {
    pub const WRIST: u32 = 0;
    pub const THUMB_IP: u32 = 3;
    pub const THUMB_TIP: u32 = 4;
    pub const INDEX_PIP: u32 = 6;
    pub const INDEX_TIP: u32 = 8;
    pub const MIDDLE_PIP: u32 = 10;
    pub const MIDDLE_TIP: u32 = 12;
    pub const RING_PIP: u32 = 14;
    pub const RING_TIP: u32 = 16;
    pub const PINKY_PIP: u32 = 18;
    pub const PINKY_TIP: u32 = 20;

    /// Fingertips, thumb first.
    pub const TIPS: [u32; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

    /// The proximal joint compared against each entry of [`TIPS`]. The thumb has no PIP so its
    /// IP joint is used instead.
    pub const PIPS: [u32; 5] = [THUMB_IP, INDEX_PIP, MIDDLE_PIP, RING_PIP, PINKY_PIP];
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single tracked point in pixel coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landmark {
    /// Semantic id of the landmark
    pub id: u32,

    /// Horizontal position, pixels from the left of the image
    pub x: i32,

    /// Vertical position, pixels from the top of the image
    pub y: i32,
}

/// The landmarks found in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LandmarkFrame {
    /// Sequence number of the frame these landmarks were estimated from
    #[serde(default)]
    pub seq: u64,

    /// Capture time of the source frame, if known
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Width of the source image in pixels, 0 if unknown
    #[serde(default)]
    pub image_width: u32,

    /// Height of the source image in pixels, 0 if unknown
    #[serde(default)]
    pub image_height: u32,

    /// Body landmarks, empty if no body was found
    #[serde(default)]
    pub pose: Vec<Landmark>,

    /// Landmarks of at most one hand
    #[serde(default)]
    pub hand: Option<Vec<Landmark>>,
}

/// Keyed lookup over a set of landmarks, built once per frame.
#[derive(Debug, Clone)]
pub struct LandmarkIndex {
    points: Vec<Option<Landmark>>,
    len: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Landmark {
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }

    /// Position as floating point coordinates.
    pub fn xy(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

impl LandmarkIndex {
    /// Build an index able to hold ids `0..capacity`.
    ///
    /// Landmarks with ids outside the capacity are dropped. If an id appears more than once the
    /// last occurrence wins.
    pub fn new(landmarks: &[Landmark], capacity: usize) -> Self {
        let mut points = vec![None; capacity];
        let mut len = 0;

        for lm in landmarks {
            match points.get_mut(lm.id as usize) {
                Some(slot) => {
                    if slot.is_none() {
                        len += 1;
                    }
                    *slot = Some(*lm);
                }
                None => debug!("Ignoring landmark with out of range id {}", lm.id),
            }
        }

        Self { points, len }
    }

    /// Index of a body pose.
    pub fn pose(landmarks: &[Landmark]) -> Self {
        Self::new(landmarks, NUM_POSE_LANDMARKS)
    }

    /// Index of a hand.
    pub fn hand(landmarks: &[Landmark]) -> Self {
        Self::new(landmarks, NUM_HAND_LANDMARKS)
    }

    /// Get the landmark with the given id.
    pub fn get(&self, id: u32) -> Option<&Landmark> {
        self.points.get(id as usize).and_then(|p| p.as_ref())
    }

    /// Get all the requested landmarks, or `None` if any is missing.
    pub fn get_all<const N: usize>(&self, ids: [u32; N]) -> Option<[Landmark; N]> {
        let mut out = [Landmark::new(0, 0, 0); N];
        for (o, id) in out.iter_mut().zip(ids.iter()) {
            *o = *self.get(*id)?;
        }
        Some(out)
    }

    /// Number of distinct landmarks present.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
