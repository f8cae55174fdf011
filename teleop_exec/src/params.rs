//! # Teleoperation Executable Parameters
//!
//! This module provides parameters for the teleoperation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use util::params::{load, load_file, LoadError};

use crate::servo_ctrl::DriverParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeleopExecParams {
    /// Sleep when the control loop finds no frame waiting.
    ///
    /// Units: milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Move the arm to the neutral pose before following
    #[serde(default = "default_true")]
    pub neutral_on_start: bool,

    /// Move the arm to the neutral pose after following ends without error
    #[serde(default = "default_true")]
    pub return_to_neutral_on_exit: bool,

    /// Where frames come from
    pub source: SourceParams,

    /// The servo controller
    pub driver: DriverParams,
}

/// Landmark estimator process configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EstimatorParams {
    /// Program to run
    pub program: String,

    /// Arguments to the program
    #[serde(default)]
    pub args: Vec<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Frame source selection.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceParams {
    /// Recorded landmarks, no estimator needed.
    Replay {
        /// Path to the replay script, relative paths are resolved against the software root
        script: PathBuf,

        /// Restart the script when it ends
        #[serde(default)]
        looped: bool,
    },

    /// A V4L2 camera whose frames are passed to an external estimator.
    Camera {
        /// Video device, e.g. `/dev/video0`
        device: String,

        #[serde(default = "default_width")]
        width: u32,

        #[serde(default = "default_height")]
        height: u32,

        #[serde(default = "default_fps")]
        fps: u32,

        estimator: EstimatorParams,
    },
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load one of the parameter files, from `dir` if given, otherwise from
/// `$TELEOP_SW_ROOT/params`.
pub fn load_params<P>(dir: Option<&Path>, file_name: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    match dir {
        Some(d) => load_file(d.join(file_name)),
        None => load(file_name),
    }
}

fn default_backoff_ms() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_fps() -> u32 {
    30
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_camera_params() {
        let p: TeleopExecParams = toml::from_str(
            r#"
            [source]
            kind = "camera"
            device = "/dev/video0"

            [source.estimator]
            program = "python3"
            args = ["pose_estimator.py"]

            [driver]
            kind = "lewansoul"
            port = "/dev/ttyUSB0"
            "#,
        )
        .unwrap();

        assert_eq!(p.backoff_ms, 5);
        assert!(p.return_to_neutral_on_exit);
        match p.source {
            SourceParams::Camera {
                width,
                fps,
                estimator,
                ..
            } => {
                assert_eq!(width, 640);
                assert_eq!(fps, 30);
                assert_eq!(estimator.args, vec!["pose_estimator.py".to_string()]);
            }
            _ => panic!("expected camera source"),
        }
    }

    #[test]
    fn test_load_params_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("teleop_exec.toml"),
            "[source]\nkind = \"replay\"\nscript = \"a.lms\"\n\n[driver]\nkind = \"sim\"\n",
        )
        .unwrap();

        let p: TeleopExecParams = load_params(Some(dir.path()), "teleop_exec.toml").unwrap();
        assert!(matches!(p.driver, DriverParams::Sim { .. }));

        assert!(matches!(
            load_params::<TeleopExecParams>(Some(dir.path()), "missing.toml"),
            Err(LoadError::FileLoadError(..))
        ));
    }

    #[test]
    fn test_replay_params() {
        let p: TeleopExecParams = toml::from_str(
            r#"
            backoff_ms = 2
            return_to_neutral_on_exit = false

            [source]
            kind = "replay"
            script = "scripts/wave.lms"

            [driver]
            kind = "sim"
            time_scale = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(p.backoff_ms, 2);
        assert!(!p.return_to_neutral_on_exit);
        assert!(matches!(p.source, SourceParams::Replay { looped: false, .. }));
        assert!(matches!(p.driver, DriverParams::Sim { time_scale } if time_scale == 0.5));
    }
}
