//! # Teleoperation Control Loop
//!
//! Takes the freshest frame from the frame buffer, estimates landmarks, reduces them to a pose
//! sample and, if the throttle lets it through, drives the arm to match.
//!
//! The loop owns the throttle and the arm controller, so the servo and throttle state each have
//! a single writer: the thread running the loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::{ArmDems, LandmarkFrame};
use log::{debug, info, trace};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

// Internal
use crate::{
    arm_ctrl::{ArmCtrl, ArmCtrlError},
    estimator::{EstimatorError, LandmarkEstimator},
    frame_buffer::FrameBuffer,
    hand_state::HandStatePolicy,
    pose_sample::PoseSample,
    servo_ctrl::ServoDriver,
    throttle::Throttle,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The teleoperation control loop.
pub struct Teleop<E, D> {
    estimator: E,

    hand_policy: HandStatePolicy,

    throttle: Throttle,

    arm: ArmCtrl<D>,

    /// Sleep when no frame is waiting
    backoff: Duration,

    stats: LoopStats,
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Frames taken from the buffer
    pub frames_processed: u64,

    /// Frames without all of the required body landmarks
    pub frames_skipped: u64,

    /// Pose samples produced
    pub samples: u64,

    /// Samples suppressed by the throttle
    pub samples_suppressed: u64,

    /// Commands sent to the arm
    pub dispatched: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("Landmark estimation failed: {0}")]
    Estimator(#[from] EstimatorError),

    #[error(transparent)]
    ArmCtrl(#[from] ArmCtrlError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E, D> Teleop<E, D>
where
    E: LandmarkEstimator,
    D: ServoDriver,
{
    pub fn new(
        estimator: E,
        hand_policy: HandStatePolicy,
        throttle: Throttle,
        arm: ArmCtrl<D>,
        backoff: Duration,
    ) -> Self {
        Self {
            estimator,
            hand_policy,
            throttle,
            arm,
            backoff,
            stats: LoopStats::default(),
        }
    }

    /// Run the loop until `stop` is raised, or until acquisition has stopped and the buffer is
    /// empty.
    ///
    /// A failed dispatch ends the loop with an error since the arm's state is then unknown.
    pub fn run(
        &mut self,
        buffer: &FrameBuffer<E::Frame>,
        acquisition_running: &AtomicBool,
        stop: &AtomicBool,
    ) -> Result<LoopStats, TeleopError> {
        info!("Control loop started");

        loop {
            if stop.load(Ordering::Relaxed) {
                info!("Stop requested");
                break;
            }

            let frame = match buffer.try_pop() {
                Some(f) => f,
                None if acquisition_running.load(Ordering::Acquire) => {
                    thread::sleep(self.backoff);
                    continue;
                }
                // Acquisition has ended, pick up the final frame if it raced with the check
                None => match buffer.try_pop() {
                    Some(f) => f,
                    None => {
                        info!("Acquisition ended and no frames remain");
                        break;
                    }
                },
            };

            self.process_frame(frame, Instant::now())?;
        }

        info!(
            "Control loop stopped: {} frames, {} skipped, {} samples, {} suppressed, {} dispatched",
            self.stats.frames_processed,
            self.stats.frames_skipped,
            self.stats.samples,
            self.stats.samples_suppressed,
            self.stats.dispatched
        );

        Ok(self.stats)
    }

    /// Run one frame through the pipeline, returning the demands sent to the arm, if any.
    pub fn process_frame(
        &mut self,
        frame: E::Frame,
        now: Instant,
    ) -> Result<Option<ArmDems>, TeleopError> {
        self.stats.frames_processed += 1;

        let landmarks = self.estimator.process(frame)?;

        trace!(
            "Frame {}: {} body landmarks, hand {}",
            landmarks.seq,
            landmarks.pose.len(),
            landmarks
                .hand
                .as_ref()
                .map(|h| format!("{} landmarks", h.len()))
                .unwrap_or_else(|| "absent".into())
        );

        self.process_landmarks(&landmarks, now)
    }

    /// Run estimated landmarks through the pipeline, see [`Teleop::process_frame`].
    pub fn process_landmarks(
        &mut self,
        landmarks: &LandmarkFrame,
        now: Instant,
    ) -> Result<Option<ArmDems>, TeleopError> {
        let sample = match PoseSample::from_landmarks(landmarks, &self.hand_policy, now) {
            Some(s) => s,
            None => {
                debug!("Frame {} skipped, missing body landmarks", landmarks.seq);
                self.stats.frames_skipped += 1;
                return Ok(None);
            }
        };
        self.stats.samples += 1;

        debug!(
            "Sample S: {:.1} deg, E: {:.1} deg, hand {}",
            sample.shoulder_deg,
            sample.elbow_deg,
            if sample.hand_closed { "closed" } else { "open" }
        );

        if !self.throttle.should_dispatch(&sample) {
            self.stats.samples_suppressed += 1;
            return Ok(None);
        }

        let dems = self
            .arm
            .apply_pose(sample.shoulder_deg, sample.elbow_deg, sample.hand_closed)?;

        self.throttle.record_dispatch(&sample);
        self.stats.dispatched += 1;

        Ok(Some(dems))
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub fn arm(&self) -> &ArmCtrl<D> {
        &self.arm
    }

    pub fn arm_mut(&mut self) -> &mut ArmCtrl<D> {
        &mut self.arm
    }

    /// Give up the loop, keeping the arm controller.
    pub fn into_arm(self) -> ArmCtrl<D> {
        self.arm
    }
}
