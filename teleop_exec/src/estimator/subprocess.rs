//! Landmark estimation in an external process
//!
//! The estimator process is started once and kept alive. It must print `READY` on a line of its
//! own once it has loaded its models. For every frame it is sent
//!
//! - the image width, height and byte length as little-endian `u32`s
//! - the encoded image bytes
//!
//! on its stdin, and it replies with exactly one line of JSON on its stdout: either a
//! [`LandmarkFrame`] or an object with an `error` field.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{CamFrame, LandmarkFrame};
use log::{info, warn};
use std::{
    io::{BufRead, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use super::{EstimatorError, LandmarkEstimator};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Line printed by the estimator when it's ready for frames.
pub const READY_LINE: &str = "READY";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimator running in a child process. The child is killed when this is dropped.
pub struct SubprocessEstimator {
    child: Child,

    stdin: ChildStdin,

    stdout: BufReader<ChildStdout>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SubprocessEstimator {
    /// Start the estimator and wait for it to become ready.
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S]) -> Result<Self, EstimatorError> {
        info!("Starting landmark estimator {}", program);

        let mut child = Command::new(program)
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(EstimatorError::Spawn)?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(i), Some(o)) => (i, BufReader::new(o)),
            _ => {
                let _ = child.kill();
                return Err(EstimatorError::Exited);
            }
        };

        let mut est = Self {
            child,
            stdin,
            stdout,
        };

        let line = est.read_line()?;
        if line.trim() != READY_LINE {
            return Err(EstimatorError::NotReady(line.trim().to_string()));
        }

        info!("Landmark estimator ready");

        Ok(est)
    }

    fn read_line(&mut self) -> Result<String, EstimatorError> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .map_err(EstimatorError::Receive)?;

        if n == 0 {
            return Err(EstimatorError::Exited);
        }

        Ok(line)
    }
}

impl LandmarkEstimator for SubprocessEstimator {
    type Frame = CamFrame;

    fn process(&mut self, frame: CamFrame) -> Result<LandmarkFrame, EstimatorError> {
        frame
            .write_to(&mut self.stdin)
            .map_err(EstimatorError::Send)?;

        let line = self.read_line()?;
        let reply: serde_json::Value =
            serde_json::from_str(&line).map_err(EstimatorError::InvalidReply)?;

        let mut landmarks = match reply.get("error") {
            Some(e) => {
                warn!("Estimator could not process frame {}: {}", frame.seq, e);
                LandmarkFrame::default()
            }
            None => serde_json::from_value(reply).map_err(EstimatorError::InvalidReply)?,
        };

        landmarks.seq = frame.seq;
        landmarks.timestamp = Some(frame.timestamp);
        if landmarks.image_width == 0 || landmarks.image_height == 0 {
            landmarks.image_width = frame.width;
            landmarks.image_height = frame.height;
        }

        Ok(landmarks)
    }
}

impl Drop for SubprocessEstimator {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use chrono::Utc;
    use comms_if::eqpt::FrameFormat;

    fn frame() -> CamFrame {
        CamFrame {
            seq: 7,
            timestamp: Utc::now(),
            width: 640,
            height: 480,
            format: FrameFormat::Mjpeg,
            data: vec![1, 2, 3],
        }
    }

    /// A shell estimator which consumes one 15 byte frame and prints `reply`.
    fn shell_estimator(reply: &str) -> Result<SubprocessEstimator, EstimatorError> {
        let script = format!("echo READY; head -c 15 >/dev/null; echo '{}'", reply);
        SubprocessEstimator::spawn("sh", &["-c", script.as_str()])
    }

    #[test]
    fn test_landmark_reply() {
        let mut est = shell_estimator(r#"{"pose": [{"id": 11, "x": 5, "y": 6}]}"#).unwrap();

        let lm = est.process(frame()).unwrap();
        assert_eq!(lm.seq, 7);
        assert_eq!(lm.image_width, 640);
        assert_eq!(lm.image_height, 480);
        assert_eq!(lm.pose.len(), 1);
        assert!(lm.timestamp.is_some());
    }

    #[test]
    fn test_error_reply_is_empty_frame() {
        let mut est = shell_estimator(r#"{"error": "no person"}"#).unwrap();

        let lm = est.process(frame()).unwrap();
        assert!(lm.pose.is_empty());
        assert!(lm.hand.is_none());
        assert_eq!(lm.image_width, 640);
    }

    #[test]
    fn test_not_ready() {
        assert!(matches!(
            SubprocessEstimator::spawn("sh", &["-c", "echo LOADING"]),
            Err(EstimatorError::NotReady(l)) if l == "LOADING"
        ));
        assert!(matches!(
            SubprocessEstimator::spawn("sh", &["-c", "exit 0"]),
            Err(EstimatorError::Exited)
        ));
    }
}
