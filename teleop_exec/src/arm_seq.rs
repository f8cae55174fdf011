//! # Scripted Arm Sequences
//!
//! Runs a timestamped script of arm steps, such as a pick or a drop, through [`ArmCtrl`]. Each
//! entry of the script is one [`ArmStep`] as JSON:
//!
//! ```text
//! 0.0: {"step": "claw", "closed": false};
//! 0.5: {"step": "joints", "targets": [{"joint": 4, "position": 575}, {"joint": 3, "position": 930}]};
//! 1.0: {"step": "claw", "closed": true};
//! ```
//!
//! Steps run in script order. A step which becomes due while an earlier move is still in
//! progress runs as soon as that move completes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{ArmDems, JointId};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};
use util::script_interpreter::{Pending, ScriptError, ScriptInterpreter};

use crate::{
    arm_ctrl::{ArmCtrl, ArmCtrlError},
    servo_ctrl::ServoDriver,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest sleep between checks of the stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Target position for one joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTarget {
    pub joint: JointId,

    /// Units: servo units
    pub position: i32,
}

/// A script of arm steps.
pub struct ArmSequence {
    script: ScriptInterpreter<ArmStep>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One step of an arm sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ArmStep {
    /// Every joint to neutral, claw open
    Neutral,

    /// Every joint except the claw to neutral
    Home,

    /// Open or close the claw
    Claw { closed: bool },

    /// Move a single joint
    Joint { joint: JointId, position: i32 },

    /// Move several joints in one dispatch
    Joints { targets: Vec<JointTarget> },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmStep {
    /// Perform the step on the arm.
    pub fn apply<D: ServoDriver>(&self, arm: &mut ArmCtrl<D>) -> Result<ArmDems, ArmCtrlError> {
        match self {
            ArmStep::Neutral => arm.neutral(),
            ArmStep::Home => arm.return_home(),
            ArmStep::Claw { closed } => arm.set_claw(*closed),
            ArmStep::Joint { joint, position } => arm.move_joint(*joint, *position),
            ArmStep::Joints { targets } => {
                let targets: Vec<_> = targets.iter().map(|t| (t.joint, t.position)).collect();
                arm.set_joints(&targets)
            }
        }
    }
}

impl ArmSequence {
    /// Load a sequence script.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let script = ScriptInterpreter::new(&path)?;

        info!(
            "Loaded arm sequence {:?}: {} steps over {:.2} s",
            path.as_ref(),
            script.get_num_entries(),
            script.get_duration()
        );

        Ok(Self { script })
    }

    /// Parse a sequence from the contents of a script.
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        Ok(Self {
            script: ScriptInterpreter::from_entries(ScriptInterpreter::parse(script)?),
        })
    }

    pub fn num_steps(&self) -> usize {
        self.script.get_num_entries()
    }

    /// Run the sequence to the end, or until `stop` is raised between steps.
    ///
    /// Returns the number of steps performed. The first failed step ends the sequence.
    pub fn run<D: ServoDriver>(
        mut self,
        arm: &mut ArmCtrl<D>,
        stop: &AtomicBool,
    ) -> Result<usize, ArmCtrlError> {
        let start = Instant::now();
        let mut num_done = 0;

        loop {
            if stop.load(Ordering::Relaxed) {
                info!("Arm sequence stopped after {} step(s)", num_done);
                break;
            }

            let elapsed_s = start.elapsed().as_secs_f64();

            match self.script.get_pending(elapsed_s) {
                Pending::Some(steps) => {
                    for step in steps {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        info!("Step {}: {:?}", num_done + 1, step);
                        step.apply(arm)?;
                        num_done += 1;
                    }
                }
                Pending::None => {
                    let wait_s = self
                        .script
                        .next_due_s()
                        .map(|t| (t - elapsed_s).max(0.0))
                        .unwrap_or(0.0);
                    thread::sleep(Duration::from_secs_f64(wait_s).min(STOP_POLL));
                }
                Pending::EndOfScript => {
                    info!("Arm sequence complete, {} step(s)", num_done);
                    break;
                }
            }
        }

        Ok(num_done)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{arm_ctrl::Params, servo_ctrl::SimDriver};

    fn j(id: u8) -> JointId {
        JointId::new(id).unwrap()
    }

    fn arm() -> ArmCtrl<SimDriver> {
        ArmCtrl::new(Params::demo(), SimDriver::instant()).unwrap()
    }

    const PICK: &str = r#"
// Open, reach down, grab
0.0: {"step": "claw", "closed": false};
0.0: {"step": "joints", "targets": [{"joint": 4, "position": 575}, {"joint": 3, "position": 930}]};
0.01: {"step": "claw", "closed": true};
0.02: {"step": "home"};
"#;

    #[test]
    fn test_pick_sequence() {
        let mut arm = arm();
        let seq = ArmSequence::parse(PICK).unwrap();
        assert_eq!(seq.num_steps(), 4);

        assert_eq!(seq.run(&mut arm, &AtomicBool::new(false)).unwrap(), 4);

        let history = arm.driver().history();
        assert_eq!(history.len(), 4);

        // Claw closes around the reached pose
        assert_eq!(history[1].positions[&j(4)], 575);
        assert_eq!(history[1].positions[&j(3)], 930);
        assert_eq!(history[1].positions[&j(1)], 0);
        assert_eq!(history[2].positions[&j(1)], 700);
        assert_eq!(history[2].positions[&j(4)], 575);

        // Home keeps hold of the object
        assert_eq!(history[3].positions[&j(1)], 700);
        assert_eq!(history[3].positions[&j(4)], 500);
        assert!(history.iter().all(|d| d.is_full_state()));
    }

    #[test]
    fn test_step_json() {
        let step: ArmStep = serde_json::from_str(r#"{"step": "joint", "joint": 6, "position": 100}"#)
            .unwrap();
        assert_eq!(
            step,
            ArmStep::Joint {
                joint: j(6),
                position: 100
            }
        );

        assert!(serde_json::from_str::<ArmStep>(r#"{"step": "joint", "joint": 7, "position": 1}"#)
            .is_err());
    }

    #[test]
    fn test_stop_before_start() {
        let mut arm = arm();
        let seq = ArmSequence::parse(PICK).unwrap();

        assert_eq!(seq.run(&mut arm, &AtomicBool::new(true)).unwrap(), 0);
        assert_eq!(arm.driver().num_moves(), 0);
    }

    #[test]
    fn test_failed_step_ends_sequence() {
        let mut arm = arm();
        arm.driver_mut().fail_next(2);

        let seq = ArmSequence::parse(PICK).unwrap();
        assert!(matches!(
            seq.run(&mut arm, &AtomicBool::new(false)),
            Err(ArmCtrlError::DispatchFailed(..))
        ));
        assert_eq!(arm.driver().num_moves(), 0);
    }
}
