//! # Hand State Classification
//!
//! Decides whether the operator's hand is open or closed from its landmarks. Two policies are
//! available and are selected in `hand_state.toml`:
//!
//! - `extension_count` - counts fingers whose tip is above their proximal joint
//! - `distance` - measures how far the fingertips sit from the wrist
//!
//! Under either policy a missing hand, or one with fewer than 21 landmarks, is reported as open.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_distance;
mod calc_extension_count;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{landmarks::NUM_HAND_LANDMARKS, Landmark, LandmarkIndex};
use serde::{Deserialize, Serialize};

pub use calc_distance::mean_tip_distance;
pub use calc_extension_count::num_extended_fingers;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default number of extended fingers at or below which the hand counts as closed.
pub const DEFAULT_MAX_EXTENDED_FOR_CLOSED: usize = 1;

/// Default normalised tip distance below which the hand counts as closed.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 0.12;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The rule used to decide whether a hand is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum HandStatePolicy {
    /// Closed when at most `max_extended_for_closed` fingers are extended.
    ExtensionCount {
        #[serde(default = "default_max_extended")]
        max_extended_for_closed: usize,
    },

    /// Closed when the mean fingertip to wrist distance, divided by the image width, is below
    /// `threshold`.
    Distance {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for HandStatePolicy {
    fn default() -> Self {
        HandStatePolicy::ExtensionCount {
            max_extended_for_closed: DEFAULT_MAX_EXTENDED_FOR_CLOSED,
        }
    }
}

impl HandStatePolicy {
    /// Returns true if the hand is closed.
    ///
    /// `hand` is `None` when no hand was detected. `image_width` is the width of the source image
    /// in pixels.
    pub fn is_closed(&self, hand: Option<&[Landmark]>, image_width: u32) -> bool {
        let index = match hand {
            Some(h) => LandmarkIndex::hand(h),
            None => return false,
        };

        if index.len() < NUM_HAND_LANDMARKS {
            return false;
        }

        match *self {
            HandStatePolicy::ExtensionCount {
                max_extended_for_closed,
            } => num_extended_fingers(&index)
                .map(|n| n <= max_extended_for_closed)
                .unwrap_or(false),
            HandStatePolicy::Distance { threshold } => mean_tip_distance(&index, image_width)
                .map(|d| d < threshold)
                .unwrap_or(false),
        }
    }
}

fn default_max_extended() -> usize {
    DEFAULT_MAX_EXTENDED_FOR_CLOSED
}

fn default_threshold() -> f64 {
    DEFAULT_DISTANCE_THRESHOLD
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use comms_if::eqpt::landmarks::hand_ids;

    /// A hand in image coordinates with the wrist at (300, 400) and the fingers pointing up.
    ///
    /// Fingers listed in `curled` have their tip below their proximal joint.
    pub(crate) fn hand(curled: &[usize]) -> Vec<Landmark> {
        let mut lms: Vec<Landmark> = (0..NUM_HAND_LANDMARKS as u32)
            .map(|id| Landmark::new(id, 300, 300))
            .collect();

        lms[hand_ids::WRIST as usize] = Landmark::new(hand_ids::WRIST, 300, 400);

        for (finger, (tip, pip)) in hand_ids::TIPS.iter().zip(hand_ids::PIPS.iter()).enumerate() {
            let x = 260 + 20 * finger as i32;
            lms[*pip as usize] = Landmark::new(*pip, x, 300);
            let tip_y = if curled.contains(&finger) { 340 } else { 200 };
            lms[*tip as usize] = Landmark::new(*tip, x, tip_y);
        }

        lms
    }

    #[test]
    fn test_no_hand_is_open() {
        assert!(!HandStatePolicy::default().is_closed(None, 640));
        assert!(!HandStatePolicy::Distance { threshold: 0.12 }.is_closed(None, 640));
    }

    #[test]
    fn test_partial_hand_is_open() {
        let fist = hand(&[0, 1, 2, 3, 4]);
        assert!(HandStatePolicy::default().is_closed(Some(&fist), 640));

        let partial = &fist[..20];
        assert!(!HandStatePolicy::default().is_closed(Some(partial), 640));
        assert!(!HandStatePolicy::Distance { threshold: 10.0 }.is_closed(Some(partial), 640));
    }

    #[test]
    fn test_extension_count_policy() {
        let policy = HandStatePolicy::default();

        assert!(!policy.is_closed(Some(&hand(&[])), 640));
        assert!(!policy.is_closed(Some(&hand(&[2, 3, 4])), 640));
        assert!(policy.is_closed(Some(&hand(&[1, 2, 3, 4])), 640));
        assert!(policy.is_closed(Some(&hand(&[0, 1, 2, 3, 4])), 640));
    }

    #[test]
    fn test_distance_policy() {
        let policy = HandStatePolicy::Distance { threshold: 0.12 };

        // Open: tips are ~200 px from the wrist, 0.31 of the width
        assert!(!policy.is_closed(Some(&hand(&[])), 640));
        // Closed: tips are ~60 px from the wrist, 0.1 of the width
        assert!(policy.is_closed(Some(&hand(&[0, 1, 2, 3, 4])), 640));
        // Unknown width can't be normalised
        assert!(!policy.is_closed(Some(&hand(&[0, 1, 2, 3, 4])), 0));
    }

    #[test]
    fn test_policy_toml() {
        let p: HandStatePolicy = toml::from_str("policy = \"distance\"").unwrap();
        assert_eq!(
            p,
            HandStatePolicy::Distance {
                threshold: DEFAULT_DISTANCE_THRESHOLD
            }
        );

        let p: HandStatePolicy =
            toml::from_str("policy = \"extension_count\"\nmax_extended_for_closed = 2").unwrap();
        assert_eq!(
            p,
            HandStatePolicy::ExtensionCount {
                max_extended_for_closed: 2
            }
        );
    }
}
