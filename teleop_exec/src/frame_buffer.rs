//! # Frame Buffer
//!
//! Single slot, drop-oldest hand-off between the acquisition thread and the control loop.
//! Acquisition always runs faster than estimation plus a blocking arm move, so the buffer trades
//! completeness for freshness: the control loop only ever sees the most recent frame, which is
//! at most one frame old.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A capacity-1 channel which overwrites any unread frame on push.
///
/// Intended for exactly one producer and one consumer. Since the slot only ever holds one frame
/// the consumer can never observe two frames out of capture order.
pub struct FrameBuffer<T> {
    slot: ArrayQueue<T>,

    num_pushed: AtomicU64,

    num_dropped: AtomicU64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> FrameBuffer<T> {
    /// Create a new, empty buffer.
    pub fn new() -> Self {
        Self {
            slot: ArrayQueue::new(1),
            num_pushed: AtomicU64::new(0),
            num_dropped: AtomicU64::new(0),
        }
    }

    /// Store a frame, discarding the queued one if it hasn't been read yet.
    ///
    /// Never blocks. Returns the discarded frame, if any.
    pub fn push(&self, frame: T) -> Option<T> {
        self.num_pushed.fetch_add(1, Ordering::Relaxed);

        let dropped = self.slot.force_push(frame);

        if dropped.is_some() {
            self.num_dropped.fetch_add(1, Ordering::Relaxed);
        }

        dropped
    }

    /// Take the queued frame, leaving the slot empty, or `None` if there is no frame.
    ///
    /// Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        self.slot.pop()
    }

    /// Returns true if no frame is waiting.
    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }

    /// Total number of frames pushed into the buffer.
    pub fn num_pushed(&self) -> u64 {
        self.num_pushed.load(Ordering::Relaxed)
    }

    /// Number of frames overwritten before they were read.
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped.load(Ordering::Relaxed)
    }
}

impl<T> Default for FrameBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_newest_wins() {
        let buf = FrameBuffer::new();

        assert_eq!(buf.push("A"), None);
        assert_eq!(buf.push("B"), Some("A"));

        assert_eq!(buf.try_pop(), Some("B"));
        assert_eq!(buf.try_pop(), None);
        assert!(buf.is_empty());

        assert_eq!(buf.num_pushed(), 2);
        assert_eq!(buf.num_dropped(), 1);
    }

    #[test]
    fn test_empty_pop() {
        let buf: FrameBuffer<u32> = FrameBuffer::default();
        assert_eq!(buf.try_pop(), None);
    }

    #[test]
    fn test_capture_order_across_threads() {
        const NUM_FRAMES: u64 = 10_000;

        let buf = Arc::new(FrameBuffer::new());
        let producer_buf = buf.clone();

        let producer = thread::spawn(move || {
            for seq in 0..NUM_FRAMES {
                producer_buf.push(seq);
            }
        });

        // Consume until the producer's last frame is seen, checking no frame arrives out of order
        let mut last: Option<u64> = None;
        let mut num_popped = 0u64;
        while last != Some(NUM_FRAMES - 1) {
            match buf.try_pop() {
                Some(seq) => {
                    if let Some(l) = last {
                        assert!(seq > l, "frame {} arrived after {}", seq, l);
                    }
                    last = Some(seq);
                    num_popped += 1;
                }
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();

        assert_eq!(buf.num_pushed(), NUM_FRAMES);
        assert_eq!(num_popped + buf.num_dropped(), NUM_FRAMES);
    }
}
