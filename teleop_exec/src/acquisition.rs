//! # Acquisition Thread
//!
//! Pulls frames from a [`FrameSource`] as fast as it produces them and hands them to the
//! control loop through a [`FrameBuffer`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, info, trace};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crate::{
    frame_buffer::FrameBuffer,
    frame_source::{FrameSource, SourceError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to a running acquisition thread.
pub struct Acquisition {
    handle: JoinHandle<Result<AcqStats, SourceError>>,

    running: Arc<AtomicBool>,
}

/// Statistics from one acquisition run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcqStats {
    /// Frames received from the source
    pub frames_captured: u64,

    /// Frames overwritten in the buffer before the control loop read them
    pub frames_dropped: u64,
}

/// Clears the running flag when the thread exits, including by panic.
struct RunningGuard(Arc<AtomicBool>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Acquisition {
    /// Start acquiring frames from `source` into `buffer` on a new thread.
    ///
    /// The thread runs until `stop` is raised, the source is exhausted or the source fails.
    pub fn spawn<S>(
        mut source: S,
        buffer: Arc<FrameBuffer<S::Frame>>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self, SourceError>
    where
        S: FrameSource + Send + 'static,
        S::Frame: Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let guard = RunningGuard(running.clone());

        let handle = thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || {
                let _guard = guard;
                let mut stats = AcqStats::default();

                info!("Acquisition started");

                while !stop.load(Ordering::Relaxed) {
                    match source.next_frame() {
                        Ok(Some(frame)) => {
                            stats.frames_captured += 1;
                            if buffer.push(frame).is_some() {
                                stats.frames_dropped += 1;
                                trace!("Unread frame overwritten");
                            }
                        }
                        Ok(None) => {
                            info!("Frame source exhausted");
                            break;
                        }
                        Err(e) => {
                            error!("Frame source failed: {}", e);
                            return Err(e);
                        }
                    }
                }

                info!(
                    "Acquisition stopped: {} frames captured, {} dropped",
                    stats.frames_captured, stats.frames_dropped
                );

                Ok(stats)
            })
            .map_err(SourceError::Spawn)?;

        Ok(Self { handle, running })
    }

    /// Flag which is true while the thread is running.
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> Result<AcqStats, SourceError> {
        self.handle
            .join()
            .map_err(|_| SourceError::ThreadPanicked)?
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        // Release so that frames pushed before exit are visible to whoever sees the flag clear
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Yields `n` numbered frames then ends.
    struct Counter {
        n: u64,
        next: u64,
    }

    impl FrameSource for Counter {
        type Frame = u64;

        fn next_frame(&mut self) -> Result<Option<u64>, SourceError> {
            if self.next >= self.n {
                return Ok(None);
            }
            self.next += 1;
            Ok(Some(self.next - 1))
        }
    }

    struct Broken;

    impl FrameSource for Broken {
        type Frame = u64;

        fn next_frame(&mut self) -> Result<Option<u64>, SourceError> {
            Err(SourceError::ThreadPanicked)
        }
    }

    #[test]
    fn test_runs_to_exhaustion() {
        let buffer = Arc::new(FrameBuffer::new());
        let stop = Arc::new(AtomicBool::new(false));

        let acq = Acquisition::spawn(Counter { n: 100, next: 0 }, buffer.clone(), stop).unwrap();
        let running = acq.running();
        let stats = acq.join().unwrap();

        assert!(!running.load(Ordering::Acquire));
        assert_eq!(stats.frames_captured, 100);
        assert_eq!(stats.frames_dropped, 99);
        assert_eq!(buffer.try_pop(), Some(99));
    }

    #[test]
    fn test_stop_flag() {
        let buffer = Arc::new(FrameBuffer::new());
        let stop = Arc::new(AtomicBool::new(true));

        let acq = Acquisition::spawn(Counter { n: 100, next: 0 }, buffer.clone(), stop).unwrap();
        let stats = acq.join().unwrap();

        assert_eq!(stats.frames_captured, 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_source_error_clears_running() {
        let buffer = Arc::new(FrameBuffer::new());
        let stop = Arc::new(AtomicBool::new(false));

        let acq = Acquisition::spawn(Broken, buffer, stop).unwrap();
        let running = acq.running();

        assert!(acq.join().is_err());
        assert!(!running.load(Ordering::Acquire));
    }
}
