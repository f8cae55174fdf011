//! # Frame Pipeline
//!
//! Builds the configured frame source and its landmark estimator. Building the pipeline
//! opens the camera and starts the estimator, so failures show up before the arm first moves.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use std::{
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc},
};

use crate::{
    estimator::EstimatorError,
    frame_source::{ReplaySource, SourceError},
    params::SourceParams,
};

#[cfg(feature = "cam")]
use crate::{estimator::SubprocessEstimator, frame_source::V4lCamera};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A frame source paired with the estimator for its frames.
pub enum Pipeline {
    /// Recorded landmarks, no estimation needed
    Replay(ReplaySource),

    /// Live camera frames passed to an external estimator
    #[cfg(feature = "cam")]
    Camera(V4lCamera, SubprocessEstimator),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Could not start the landmark estimator: {0}")]
    Estimator(#[from] EstimatorError),

    #[error("Camera source {0} requested but the `cam` feature is disabled")]
    CameraDisabled(String),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Open the configured source and estimator.
///
/// Relative replay script paths are resolved with `resolve`. The replay source ends as soon as
/// `stop` is raised.
pub fn build_pipeline<F>(
    params: &SourceParams,
    stop: &Arc<AtomicBool>,
    resolve: F,
) -> Result<Pipeline, PipelineError>
where
    F: Fn(&PathBuf) -> PathBuf,
{
    match params {
        SourceParams::Replay { script, looped } => {
            let source = ReplaySource::new(resolve(script), *looped)?.with_stop(stop.clone());
            info!("Frame source: replay of {:?}", script);

            Ok(Pipeline::Replay(source))
        }
        SourceParams::Camera {
            device,
            width,
            height,
            fps,
            estimator,
        } => {
            #[cfg(feature = "cam")]
            {
                let source = V4lCamera::open(device, *width, *height, *fps)?;
                let estimator = SubprocessEstimator::spawn(&estimator.program, &estimator.args)?;
                info!("Frame source: camera {}", device);

                return Ok(Pipeline::Camera(source, estimator));
            }

            #[cfg(not(feature = "cam"))]
            {
                let _ = (width, height, fps, estimator);
                return Err(PipelineError::CameraDisabled(device.clone()));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn stop() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_replay_pipeline() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"0.0: {};\n").unwrap();

        let params = SourceParams::Replay {
            script: f.path().to_path_buf(),
            looped: false,
        };

        assert!(matches!(
            build_pipeline(&params, &stop(), |p| p.clone()),
            Ok(Pipeline::Replay(_))
        ));
    }

    #[test]
    fn test_missing_script_fails_early() {
        let params = SourceParams::Replay {
            script: PathBuf::from("missing.lms"),
            looped: false,
        };

        assert!(matches!(
            build_pipeline(&params, &stop(), |p| PathBuf::from("/no/such/dir").join(p)),
            Err(PipelineError::Source(SourceError::Script(_)))
        ));
    }

    #[cfg(not(feature = "cam"))]
    #[test]
    fn test_camera_without_feature() {
        let params = SourceParams::Camera {
            device: "/dev/video0".into(),
            width: 640,
            height: 480,
            fps: 30,
            estimator: crate::params::EstimatorParams {
                program: "true".into(),
                args: vec![],
            },
        };

        assert!(matches!(
            build_pipeline(&params, &stop(), |p| p.clone()),
            Err(PipelineError::CameraDisabled(d)) if d == "/dev/video0"
        ));
    }
}
