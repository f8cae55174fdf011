//! # Pose Samples
//!
//! Reduces one frame's landmarks to the three quantities that drive the arm.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{landmarks::pose_ids, LandmarkFrame, LandmarkIndex};
use std::time::Instant;

use crate::{angle::landmark_angle, hand_state::HandStatePolicy};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The operator's arm pose at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Angle at the shoulder between the hip and the elbow
    ///
    /// Units: degrees
    pub shoulder_deg: f64,

    /// Angle at the elbow between the shoulder and the wrist
    ///
    /// Units: degrees
    pub elbow_deg: f64,

    pub hand_closed: bool,

    /// When the sample was taken, on the monotonic clock
    pub timestamp: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseSample {
    /// Build a sample from a frame of landmarks.
    ///
    /// Returns `None` if any of the shoulder, elbow, wrist or hip landmarks is missing.
    pub fn from_landmarks(
        frame: &LandmarkFrame,
        hand_policy: &HandStatePolicy,
        timestamp: Instant,
    ) -> Option<Self> {
        let pose = LandmarkIndex::pose(&frame.pose);

        let [shoulder, elbow, wrist, hip] = pose.get_all([
            pose_ids::SHOULDER,
            pose_ids::ELBOW,
            pose_ids::WRIST,
            pose_ids::HIP,
        ])?;

        Some(Self {
            shoulder_deg: landmark_angle(&hip, &shoulder, &elbow),
            elbow_deg: landmark_angle(&shoulder, &elbow, &wrist),
            hand_closed: hand_policy.is_closed(frame.hand.as_deref(), frame.image_width),
            timestamp,
        })
    }
}
