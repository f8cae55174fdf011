//! Main teleoperation executable entry point.
//!
//! # Architecture
//!
//! Two threads share a single slot frame buffer:
//!
//!     - Acquisition thread: reads frames from the source as fast as they arrive and pushes them
//!       into the buffer, overwriting any frame the control loop hasn't read yet.
//!     - Control loop (main thread):
//!         - Take the freshest frame
//!         - Estimate body and hand landmarks
//!         - Calculate the shoulder and elbow angles and the hand state
//!         - Throttle
//!         - Map to servo positions and dispatch to the arm, blocking until the move is done
//!
//! The loop ends on Ctrl-C, when the source is exhausted or when a dispatch fails.
//!
//! The other subcommands drive the arm directly: single joint and claw moves, and scripted
//! sequences such as a pick or a drop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info};
use std::{
    convert::TryFrom,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use structopt::StructOpt;

// Internal
use comms_if::eqpt::JointId;
use teleop_lib::{
    acquisition::Acquisition,
    arm_ctrl::{self, ArmCtrl},
    arm_seq::ArmSequence,
    estimator::{LandmarkEstimator, Passthrough},
    frame_buffer::FrameBuffer,
    frame_source::{FrameSource, SourceError},
    hand_state::HandStatePolicy,
    params::{load_params, SourceParams, TeleopExecParams},
    pipeline::{build_pipeline, Pipeline},
    servo_ctrl::{open_driver, DriverParams, ServoDriver},
    teleop::Teleop,
    throttle::{self, Throttle},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// COMMAND LINE
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "teleop_exec", about = "Drive a servo arm by following the operator's arm")]
struct Opt {
    /// Directory containing the parameter files [default: $TELEOP_SW_ROOT/params]
    #[structopt(long, parse(from_os_str))]
    params_dir: Option<PathBuf>,

    /// Replay a landmark script instead of using the configured frame source
    #[structopt(long, parse(from_os_str))]
    replay: Option<PathBuf>,

    /// Use the simulated servo driver instead of the configured one
    #[structopt(long)]
    sim: bool,

    #[structopt(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Follow the operator's arm (default)
    #[structopt(name = "follow")]
    Follow,

    /// Move the arm to the neutral pose and exit
    #[structopt(name = "neutral")]
    Neutral,

    /// Move every joint except the claw to neutral and exit
    #[structopt(name = "home")]
    Home,

    /// Move a single joint, clamped to its range
    #[structopt(name = "move")]
    Move {
        /// Joint id, 1 to 6
        #[structopt(parse(try_from_str = parse_joint))]
        joint: JointId,

        /// Position in servo units
        position: i32,
    },

    /// Open or close the claw
    #[structopt(name = "claw")]
    Claw {
        /// `open` or `closed`
        state: ClawState,
    },

    /// Run an arm sequence script, such as scripts/pick.arm
    #[structopt(name = "run")]
    Run {
        /// Path to the script, relative paths are resolved against the software root
        #[structopt(parse(from_os_str))]
        script: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClawState {
    Open,
    Closed,
}

impl FromStr for ClawState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ClawState::Open),
            "closed" | "close" => Ok(ClawState::Closed),
            _ => Err(format!("expected `open` or `closed`, found `{}`", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Sessions go in the software root if there is one, otherwise the working directory
    let session = match util::get_sw_root() {
        Ok(_) => Session::new("teleop_exec", "sessions"),
        Err(_) => Session::new_in(Path::new("sessions"), "teleop_exec"),
    }
    .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("Teleoperation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params_dir = opt.params_dir.as_deref();

    let mut exec_params: TeleopExecParams =
        load_params(params_dir, "teleop_exec.toml").wrap_err("Could not load exec params")?;
    let arm_params: arm_ctrl::Params =
        load_params(params_dir, "arm_ctrl.toml").wrap_err("Could not load ArmCtrl params")?;
    let throttle_params: throttle::Params =
        load_params(params_dir, "throttle.toml").wrap_err("Could not load throttle params")?;
    let hand_policy: HandStatePolicy = load_params(params_dir, "hand_state.toml")
        .wrap_err("Could not load hand state params")?;

    if let Some(script) = opt.replay {
        exec_params.source = SourceParams::Replay {
            script,
            looped: false,
        };
    }
    if opt.sim {
        exec_params.driver = DriverParams::Sim { time_scale: 1.0 };
    }

    info!("Parameters loaded");
    debug!("Exec params: {:#?}", exec_params);
    debug!("Throttle params: {:?}", throttle_params);
    debug!("Hand state policy: {:?}", hand_policy);

    // ---- INITIALISE ARM ----

    let driver = open_driver(&exec_params.driver).wrap_err("Could not open the servo driver")?;
    info!("Servo driver: {}", driver.name());

    let arch = Archiver::from_path(&session, "dispatch.csv")
        .wrap_err("Could not open the dispatch archive")?;

    let mut arm = ArmCtrl::new(arm_params, driver)
        .wrap_err("Invalid ArmCtrl params")?
        .with_archiver(arch);

    // ---- RUN ----

    match opt.cmd.unwrap_or(Cmd::Follow) {
        Cmd::Neutral => {
            arm.neutral().wrap_err("Could not move to the neutral pose")?;
        }
        Cmd::Home => {
            arm.return_home().wrap_err("Could not return home")?;
        }
        Cmd::Move { joint, position } => {
            arm.move_joint(joint, position)
                .wrap_err_with(|| format!("Could not move {}", joint))?;
        }
        Cmd::Claw { state } => {
            arm.set_claw(state == ClawState::Closed)
                .wrap_err("Could not move the claw")?;
        }
        Cmd::Run { script } => {
            let seq = ArmSequence::load(resolve_path(&script))
                .wrap_err("Could not load the arm sequence")?;
            let stop = stop_on_ctrlc()?;

            seq.run(&mut arm, &stop)
                .wrap_err("Arm sequence failed")?;
        }
        Cmd::Follow => {
            follow(&exec_params, arm, Throttle::new(throttle_params), hand_policy)?;
        }
    }

    info!("End of session");

    Ok(())
}

/// Follow the operator until stopped.
fn follow<D: ServoDriver>(
    exec_params: &TeleopExecParams,
    mut arm: ArmCtrl<D>,
    throttle: Throttle,
    hand_policy: HandStatePolicy,
) -> Result<(), Report> {
    let stop = stop_on_ctrlc()?;

    // Any source problem must show before the arm moves
    let pipeline = build_pipeline(&exec_params.source, &stop, |p| resolve_path(p))
        .wrap_err("Could not open the frame source")?;

    if exec_params.neutral_on_start {
        arm.neutral().wrap_err("Could not move to the neutral pose")?;
    }

    let backoff = util::time::millis(exec_params.backoff_ms);

    let (mut arm, acq_error) = match pipeline {
        Pipeline::Replay(source) => {
            run_loop(source, Passthrough, arm, throttle, hand_policy, backoff, stop)?
        }
        #[cfg(feature = "cam")]
        Pipeline::Camera(source, estimator) => {
            run_loop(source, estimator, arm, throttle, hand_policy, backoff, stop)?
        }
    };

    if exec_params.return_to_neutral_on_exit {
        arm.neutral()
            .wrap_err("Could not return to the neutral pose")?;
    }

    match acq_error {
        Some(e) => Err(e).wrap_err("Acquisition failed"),
        None => Ok(()),
    }
}

/// Run acquisition and the control loop until either ends.
///
/// Returns the arm controller and the acquisition error, if any.
fn run_loop<S, E, D>(
    source: S,
    estimator: E,
    arm: ArmCtrl<D>,
    throttle: Throttle,
    hand_policy: HandStatePolicy,
    backoff: Duration,
    stop: Arc<AtomicBool>,
) -> Result<(ArmCtrl<D>, Option<SourceError>), Report>
where
    S: FrameSource + Send + 'static,
    S::Frame: Send + 'static,
    E: LandmarkEstimator<Frame = S::Frame>,
    D: ServoDriver,
{
    let buffer = Arc::new(FrameBuffer::new());

    let acq = Acquisition::spawn(source, buffer.clone(), stop.clone())
        .wrap_err("Could not start acquisition")?;
    let running = acq.running();

    let mut teleop = Teleop::new(estimator, hand_policy, throttle, arm, backoff);
    let result = teleop.run(&buffer, &running, &stop);

    // Acquisition must stop whatever the loop's outcome
    stop.store(true, Ordering::Relaxed);
    let acq_result = acq.join();

    result.wrap_err("Control loop failed")?;

    let acq_error = match acq_result {
        Ok(stats) => {
            info!(
                "{} frames captured, {} overwritten before use",
                stats.frames_captured, stats.frames_dropped
            );
            None
        }
        Err(e) => {
            error!("Acquisition failed: {}", e);
            Some(e)
        }
    };

    Ok((teleop.into_arm(), acq_error))
}

/// Flag raised by Ctrl-C.
fn stop_on_ctrlc() -> Result<Arc<AtomicBool>, Report> {
    let stop = Arc::new(AtomicBool::new(false));

    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))
        .wrap_err("Could not set the Ctrl-C handler")?;

    Ok(stop)
}

fn parse_joint(s: &str) -> Result<JointId, String> {
    let id: u8 = s.parse().map_err(|e| format!("{}", e))?;
    JointId::try_from(id).map_err(|e| format!("{}", e))
}

/// Resolve a relative path against the software root, if it is set.
fn resolve_path(path: &Path) -> PathBuf {
    match util::get_sw_root() {
        Ok(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}
