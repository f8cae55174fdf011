//! Implementations for the Throttle state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use std::time::{Duration, Instant};

// Internal
use super::Params;
use crate::pose_sample::PoseSample;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command throttle state.
pub struct Throttle {
    params: Params,

    min_interval: Duration,

    state: ThrottleState,
}

/// Record of the last dispatched sample.
///
/// All fields are `None` until the first dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrottleState {
    pub last_sent_at: Option<Instant>,

    pub last_shoulder_deg: Option<f64>,

    pub last_elbow_deg: Option<f64>,

    pub last_hand_closed: Option<bool>,
}

/// The outcome of running a sample through the throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// The sample differs enough from the last dispatched one
    pub novel: bool,

    /// Enough time has passed since the last dispatch
    pub interval_elapsed: bool,

    /// The sample should be dispatched
    pub dispatch: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Throttle {
    pub fn new(params: Params) -> Self {
        // A negative or non-finite interval disables the rate gate
        let min_interval = if params.min_interval_s.is_finite() && params.min_interval_s > 0.0 {
            Duration::from_secs_f64(params.min_interval_s)
        } else {
            Duration::from_secs(0)
        };

        Self {
            params,
            min_interval,
            state: ThrottleState::default(),
        }
    }

    /// Evaluate both gates for the sample without changing any state.
    pub fn evaluate(&self, sample: &PoseSample) -> GateDecision {
        let novel = self.is_novel(sample);
        let interval_elapsed = self.interval_elapsed(sample.timestamp);

        GateDecision {
            novel,
            interval_elapsed,
            dispatch: self.params.gate_policy.combine(novel, interval_elapsed),
        }
    }

    /// Returns true if the sample should be dispatched.
    ///
    /// This does not change the throttle state. Call [`Throttle::record_dispatch`] once the
    /// dispatch has been made.
    pub fn should_dispatch(&self, sample: &PoseSample) -> bool {
        let decision = self.evaluate(sample);

        trace!(
            "Throttle: novel = {}, interval elapsed = {}, dispatch = {}",
            decision.novel,
            decision.interval_elapsed,
            decision.dispatch
        );

        decision.dispatch
    }

    /// Record that the sample has been dispatched.
    pub fn record_dispatch(&mut self, sample: &PoseSample) {
        self.state = ThrottleState {
            last_sent_at: Some(sample.timestamp),
            last_shoulder_deg: Some(sample.shoulder_deg),
            last_elbow_deg: Some(sample.elbow_deg),
            last_hand_closed: Some(sample.hand_closed),
        };
    }

    /// Forget the last dispatch so the next sample passes both gates.
    pub fn reset(&mut self) {
        self.state = ThrottleState::default();
    }

    pub fn state(&self) -> &ThrottleState {
        &self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    fn is_novel(&self, sample: &PoseSample) -> bool {
        let threshold = self.params.angle_threshold_deg;

        match (
            self.state.last_shoulder_deg,
            self.state.last_elbow_deg,
            self.state.last_hand_closed,
        ) {
            (Some(sh), Some(el), Some(hand)) => {
                (sample.shoulder_deg - sh).abs() > threshold
                    || (sample.elbow_deg - el).abs() > threshold
                    || sample.hand_closed != hand
            }
            _ => true,
        }
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        match self.state.last_sent_at {
            Some(last) => now.saturating_duration_since(last) > self.min_interval,
            None => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::throttle::GatePolicy;

    fn sample(t0: Instant, ms: u64, sh: f64, el: f64, closed: bool) -> PoseSample {
        PoseSample {
            shoulder_deg: sh,
            elbow_deg: el,
            hand_closed: closed,
            timestamp: t0 + Duration::from_millis(ms),
        }
    }

    /// Run a sample through the throttle the way the control loop does.
    fn offer(throttle: &mut Throttle, s: &PoseSample) -> bool {
        let dispatch = throttle.should_dispatch(s);
        if dispatch {
            throttle.record_dispatch(s);
        }
        dispatch
    }

    #[test]
    fn test_default_sequence() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params::default());

        assert!(offer(&mut throttle, &sample(t0, 0, 90.0, 90.0, false)));
        assert!(!offer(&mut throttle, &sample(t0, 100, 93.0, 91.0, false)));
        assert!(!offer(&mut throttle, &sample(t0, 300, 120.0, 91.0, false)));
        assert!(offer(&mut throttle, &sample(t0, 600, 120.0, 91.0, false)));

        // A hand change inside the interval waits, a held pose is never re-sent
        assert!(!offer(&mut throttle, &sample(t0, 1000, 120.0, 91.0, true)));
        assert!(!offer(&mut throttle, &sample(t0, 1200, 120.0, 91.0, false)));
        assert!(offer(&mut throttle, &sample(t0, 1300, 120.0, 91.0, true)));
        assert!(!offer(&mut throttle, &sample(t0, 2000, 120.0, 91.0, true)));

        assert_eq!(throttle.state().last_hand_closed, Some(true));
        assert_eq!(
            throttle.state().last_sent_at,
            Some(t0 + Duration::from_millis(1300))
        );
    }

    #[test]
    fn test_suppressed_sample_leaves_state() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params::default());

        offer(&mut throttle, &sample(t0, 0, 90.0, 90.0, false));
        let before = *throttle.state();

        offer(&mut throttle, &sample(t0, 100, 150.0, 20.0, true));
        assert_eq!(*throttle.state(), before);
    }

    #[test]
    fn test_threshold_is_strict() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params::default());

        offer(&mut throttle, &sample(t0, 0, 90.0, 90.0, false));
        assert!(!offer(&mut throttle, &sample(t0, 1000, 95.0, 85.0, false)));
        assert!(offer(&mut throttle, &sample(t0, 1000, 95.5, 90.0, false)));
    }

    #[test]
    fn test_interval_is_strict() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params::default());

        offer(&mut throttle, &sample(t0, 0, 90.0, 90.0, false));
        assert!(!offer(&mut throttle, &sample(t0, 500, 120.0, 90.0, false)));
        assert!(offer(&mut throttle, &sample(t0, 501, 120.0, 90.0, false)));
    }

    #[test]
    fn test_or_policy_resends_held_pose() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params {
            gate_policy: GatePolicy::NoveltyOrInterval,
            ..Default::default()
        });

        assert!(offer(&mut throttle, &sample(t0, 0, 90.0, 90.0, false)));
        assert!(!offer(&mut throttle, &sample(t0, 100, 90.0, 90.0, false)));
        assert!(offer(&mut throttle, &sample(t0, 200, 130.0, 90.0, false)));
        assert!(offer(&mut throttle, &sample(t0, 800, 130.0, 90.0, false)));
    }

    #[test]
    fn test_always_policy() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params {
            gate_policy: GatePolicy::Always,
            ..Default::default()
        });

        for ms in 0..5 {
            assert!(offer(&mut throttle, &sample(t0, ms, 90.0, 90.0, false)));
        }
    }

    #[test]
    fn test_reset() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Params::default());

        offer(&mut throttle, &sample(t0, 0, 90.0, 90.0, false));
        throttle.reset();
        assert!(offer(&mut throttle, &sample(t0, 10, 90.0, 90.0, false)));
    }
}
