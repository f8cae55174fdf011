//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use serde::Serialize;
use std::thread;

// Internal
use super::{ArmCtrlError, Params, ServoState};
use crate::{
    pose_map::{Calibration, JointRange},
    servo_ctrl::ServoDriver,
};
use comms_if::eqpt::{ArmDems, JointId, NUM_JOINTS};
use util::{archive::Archiver, session, time::millis};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
pub struct ArmCtrl<D> {
    params: Params,

    cal: Calibration,

    neutral: [i32; NUM_JOINTS],

    state: ServoState,

    driver: D,

    arch: Archiver,

    num_dispatches: u64,
}

/// One row of the dispatch archive.
#[derive(Serialize)]
struct DispatchRecord {
    time_s: f64,
    dispatch_num: u64,
    attempts: u32,
    duration_ms: u16,
    j1: i32,
    j2: i32,
    j3: i32,
    j4: i32,
    j5: i32,
    j6: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: ServoDriver> ArmCtrl<D> {
    /// Validate the parameters and create a new arm controller.
    ///
    /// The servo state starts at the neutral pose but is not in sync until the first dispatch.
    pub fn new(params: Params, driver: D) -> Result<Self, ArmCtrlError> {
        let cal = Calibration::new(params.joints.iter().map(|j| JointRange {
            joint: j.id,
            lo: j.lo,
            hi: j.hi,
        }))?;

        // Roles must name distinct joints
        if params.shoulder_joint == params.elbow_joint || params.shoulder_joint == params.claw_joint
        {
            return Err(ArmCtrlError::RoleConflict(params.shoulder_joint));
        }
        if params.elbow_joint == params.claw_joint {
            return Err(ArmCtrlError::RoleConflict(params.elbow_joint));
        }

        let claw = cal.range(params.claw_joint);
        if !claw.contains(params.claw_open) {
            return Err(ArmCtrlError::ClawOutOfRange("open", params.claw_open));
        }
        if !claw.contains(params.claw_closed) {
            return Err(ArmCtrlError::ClawOutOfRange("closed", params.claw_closed));
        }

        let mut neutral = [0; NUM_JOINTS];
        for j in params.joints.iter() {
            let range = cal.range(j.id);
            neutral[j.id.index()] = match j.neutral {
                Some(n) if range.contains(n) => n,
                Some(n) => return Err(ArmCtrlError::NeutralOutOfRange(j.id, n)),
                None => range.midpoint(),
            };
        }
        neutral[params.claw_joint.index()] = params.claw_open;

        for j in params.joints.iter() {
            debug!(
                "{} ({}): range [{}, {}], neutral {}",
                j.id,
                j.name,
                j.lo,
                j.hi,
                neutral[j.id.index()]
            );
        }

        Ok(Self {
            params,
            cal,
            neutral,
            state: ServoState {
                positions: neutral,
                in_sync: false,
            },
            driver,
            arch: Archiver::default(),
            num_dispatches: 0,
        })
    }

    /// Archive every dispatch into the given archiver.
    pub fn with_archiver(mut self, arch: Archiver) -> Self {
        self.arch = arch;
        self
    }

    /// Move every joint to its neutral position with the claw open.
    pub fn neutral(&mut self) -> Result<ArmDems, ArmCtrlError> {
        info!("Moving to neutral pose");

        self.state.positions = self.neutral;

        self.dispatch()
    }

    /// Move every joint except the claw to its neutral position.
    pub fn return_home(&mut self) -> Result<ArmDems, ArmCtrlError> {
        info!("Returning home, claw unchanged");

        for joint in JointId::all() {
            if joint != self.params.claw_joint {
                self.state.positions[joint.index()] = self.neutral[joint.index()];
            }
        }

        self.dispatch()
    }

    /// Move a single joint, clamping the position to its range.
    pub fn move_joint(&mut self, joint: JointId, position: i32) -> Result<ArmDems, ArmCtrlError> {
        let old = self.state.get(joint);
        let new = self.set(joint, position);

        info!("Moving {} from {} to {}", joint, old, new);

        self.dispatch()
    }

    /// Move several joints in a single dispatch, clamping each position to its joint's range.
    pub fn set_joints(&mut self, targets: &[(JointId, i32)]) -> Result<ArmDems, ArmCtrlError> {
        for (joint, position) in targets {
            let new = self.set(*joint, *position);
            debug!("{} to {}", joint, new);
        }

        info!("Moving {} joint(s)", targets.len());

        self.dispatch()
    }

    /// Open or close the claw.
    pub fn set_claw(&mut self, closed: bool) -> Result<ArmDems, ArmCtrlError> {
        let pos = self.claw_position(closed);
        self.set(self.params.claw_joint, pos);

        info!("Claw {}", if closed { "closed" } else { "open" });

        self.dispatch()
    }

    /// Drive the arm to follow the operator's pose.
    ///
    /// Shoulder and elbow angles are mapped through their joints' ranges and the claw is set from
    /// the hand state. All three land in a single full-state dispatch.
    pub fn apply_pose(
        &mut self,
        shoulder_deg: f64,
        elbow_deg: f64,
        hand_closed: bool,
    ) -> Result<ArmDems, ArmCtrlError> {
        let shoulder = self
            .cal
            .range(self.params.shoulder_joint)
            .human_angle_to_servo(shoulder_deg);
        let elbow = self
            .cal
            .range(self.params.elbow_joint)
            .human_angle_to_servo(elbow_deg);
        let claw = self.claw_position(hand_closed);

        let shoulder = self.set(self.params.shoulder_joint, shoulder);
        let elbow = self.set(self.params.elbow_joint, elbow);
        self.set(self.params.claw_joint, claw);

        debug!(
            "Pose S: {:.1} deg -> {}, E: {:.1} deg -> {}, hand {}",
            shoulder_deg,
            shoulder,
            elbow_deg,
            elbow,
            if hand_closed { "closed" } else { "open" }
        );

        self.dispatch()
    }

    pub fn state(&self) -> &ServoState {
        &self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn calibration(&self) -> &Calibration {
        &self.cal
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Number of successful dispatches so far.
    pub fn num_dispatches(&self) -> u64 {
        self.num_dispatches
    }

    fn claw_position(&self, closed: bool) -> i32 {
        if closed {
            self.params.claw_closed
        } else {
            self.params.claw_open
        }
    }

    /// Clamp and store a position, returning the stored value.
    fn set(&mut self, joint: JointId, position: i32) -> i32 {
        let clamped = self.cal.range(joint).clamp(position);
        self.state.positions[joint.index()] = clamped;
        clamped
    }

    /// Send the full servo state to the driver, retrying up to the configured attempt budget.
    fn dispatch(&mut self) -> Result<ArmDems, ArmCtrlError> {
        let dems = self.state.to_dems(self.params.move_duration_ms);
        let max_attempts = self.params.max_dispatch_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.driver.move_joints(&dems) {
                Ok(()) => break,
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "Dispatch attempt {}/{} via {} failed: {}",
                        attempt,
                        max_attempts,
                        self.driver.name(),
                        e
                    );
                    attempt += 1;
                    thread::sleep(millis(self.params.retry_delay_ms));
                }
                Err(e) => {
                    self.state.in_sync = false;
                    error!("Dispatch failed after {} attempt(s): {}", attempt, e);
                    return Err(ArmCtrlError::DispatchFailed(attempt, e));
                }
            }
        }

        self.state.in_sync = true;
        self.num_dispatches += 1;

        info!(
            "Dispatch {}: {:?} over {} ms",
            self.num_dispatches, self.state.positions, dems.duration_ms
        );

        let p = self.state.positions;
        let record = DispatchRecord {
            time_s: session::try_get_elapsed_seconds().unwrap_or(0.0),
            dispatch_num: self.num_dispatches,
            attempts: attempt,
            duration_ms: dems.duration_ms,
            j1: p[0],
            j2: p[1],
            j3: p[2],
            j4: p[3],
            j5: p[4],
            j6: p[5],
        };
        if let Err(e) = self.arch.serialise(record) {
            warn!("Could not archive dispatch: {}", e);
        }

        if self.params.settle_ms > 0 {
            thread::sleep(millis(self.params.settle_ms));
        }

        Ok(dems)
    }
}
