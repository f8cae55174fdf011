//! Landmark replay source
//!
//! Replays a script of recorded landmark frames in real time. Scripts use the timestamped
//! format read by [`ScriptInterpreter`], one [`LandmarkFrame`] JSON object per entry:
//!
//! ```text
//! 0.0: {"image_width": 640, "image_height": 480, "pose": [...], "hand": [...]};
//! 0.033: {...};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::Utc;
use comms_if::eqpt::LandmarkFrame;
use log::{debug, info};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use util::script_interpreter::{Pending, ScriptInterpreter};

use super::{FrameSource, SourceError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest sleep between checks of the stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Frame source which replays a landmark script.
pub struct ReplaySource {
    script_path: PathBuf,

    script: ScriptInterpreter<LandmarkFrame>,

    looped: bool,

    /// Set on the first call to `next_frame`
    start: Option<Instant>,

    due: VecDeque<LandmarkFrame>,

    next_seq: u64,

    /// Ends the stream early when raised
    stop: Option<Arc<AtomicBool>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ReplaySource {
    /// Load a replay script. If `looped` the script restarts when it ends.
    pub fn new<P: AsRef<Path>>(script_path: P, looped: bool) -> Result<Self, SourceError> {
        let script = ScriptInterpreter::new(&script_path)?;

        info!(
            "Loaded replay script {:?}: {} frames over {:.2} s",
            script_path.as_ref(),
            script.get_num_entries(),
            script.get_duration()
        );

        Ok(Self {
            script_path: script_path.as_ref().to_path_buf(),
            script,
            looped,
            start: None,
            due: VecDeque::new(),
            next_seq: 0,
            stop: None,
        })
    }

    /// End the stream as soon as `stop` is raised, rather than at the next due frame.
    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn is_stopped(&self) -> bool {
        self.stop
            .as_ref()
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Stamp a frame with a sequence number and capture time if the script didn't give them.
    fn stamp(&mut self, mut frame: LandmarkFrame) -> LandmarkFrame {
        if frame.seq == 0 {
            frame.seq = self.next_seq;
        }
        self.next_seq = frame.seq + 1;

        if frame.timestamp.is_none() {
            frame.timestamp = Some(Utc::now());
        }

        frame
    }
}

impl FrameSource for ReplaySource {
    type Frame = LandmarkFrame;

    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError> {
        let start = *self.start.get_or_insert_with(Instant::now);

        loop {
            if let Some(frame) = self.due.pop_front() {
                return Ok(Some(self.stamp(frame)));
            }

            let elapsed_s = start.elapsed().as_secs_f64();

            match self.script.get_pending(elapsed_s) {
                Pending::Some(frames) => self.due.extend(frames),
                Pending::None => {
                    if self.is_stopped() {
                        debug!("Replay stopped while waiting for the next frame");
                        return Ok(None);
                    }

                    let wait_s = self
                        .script
                        .next_due_s()
                        .map(|t| (t - elapsed_s).max(0.0))
                        .unwrap_or(0.0);
                    thread::sleep(Duration::from_secs_f64(wait_s).min(STOP_POLL));
                }
                Pending::EndOfScript if self.looped => {
                    debug!("Replay script ended, restarting");
                    self.script = ScriptInterpreter::new(&self.script_path)?;
                    self.start = Some(Instant::now());
                    return self.next_frame();
                }
                Pending::EndOfScript => {
                    info!("Replay script ended");
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const SCRIPT: &str = r#"
// Two frames, the second with a sequence number of its own
0.0: {"image_width": 640, "image_height": 480, "pose": [{"id": 11, "x": 1, "y": 2}]};
0.05: {"seq": 10, "image_width": 640, "image_height": 480};
"#;

    fn script_file() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SCRIPT.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_replay_in_time() {
        let f = script_file();
        let mut src = ReplaySource::new(f.path(), false).unwrap();

        let t0 = Instant::now();

        let a = src.next_frame().unwrap().unwrap();
        assert_eq!(a.seq, 0);
        assert_eq!(a.pose.len(), 1);
        assert!(a.timestamp.is_some());

        let b = src.next_frame().unwrap().unwrap();
        assert_eq!(b.seq, 10);
        assert!(t0.elapsed() >= Duration::from_millis(50));

        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_replay_looped() {
        let f = script_file();
        let mut src = ReplaySource::new(f.path(), true).unwrap();

        for _ in 0..5 {
            assert!(src.next_frame().unwrap().is_some());
        }
    }

    #[test]
    fn test_stop_interrupts_wait() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"0.0: {};\n30.0: {};\n").unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let mut src = ReplaySource::new(f.path(), false)
            .unwrap()
            .with_stop(stop.clone());

        assert!(src.next_frame().unwrap().is_some());

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stop.store(true, Ordering::Relaxed);
        });

        let t0 = Instant::now();
        assert!(src.next_frame().unwrap().is_none());
        assert!(t0.elapsed() < Duration::from_secs(5));

        stopper.join().unwrap();
    }

    #[test]
    fn test_missing_script() {
        assert!(matches!(
            ReplaySource::new("/no/such/replay.lms", false),
            Err(SourceError::Script(_))
        ));
    }
}
