//! Fingertip distance hand state calculation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{landmarks::hand_ids, LandmarkIndex};
use util::maths::norm;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Mean distance from each fingertip to the wrist, as a fraction of the image width.
///
/// Returns `None` if the wrist or any fingertip is missing, or if the image width is zero.
pub fn mean_tip_distance(hand: &LandmarkIndex, image_width: u32) -> Option<f64> {
    if image_width == 0 {
        return None;
    }

    let wrist = hand.get(hand_ids::WRIST)?.xy();
    let tips = hand.get_all(hand_ids::TIPS)?;

    let mut sum = 0.0;
    for tip in tips.iter() {
        sum += norm(&tip.xy(), &wrist)?;
    }

    Some(sum / tips.len() as f64 / image_width as f64)
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::Landmark;

    #[test]
    fn test_mean_distance() {
        let mut lms = vec![Landmark::new(hand_ids::WRIST, 0, 0)];
        for (i, tip) in hand_ids::TIPS.iter().enumerate() {
            // Distances 30, 40, 50, 60, 70
            lms.push(Landmark::new(*tip, 0, 30 + 10 * i as i32));
        }

        let d = mean_tip_distance(&LandmarkIndex::hand(&lms), 500).unwrap();
        assert!((d - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_missing_wrist() {
        let lms: Vec<_> = hand_ids::TIPS
            .iter()
            .map(|t| Landmark::new(*t, 10, 10))
            .collect();

        assert_eq!(mean_tip_distance(&LandmarkIndex::hand(&lms), 640), None);
    }
}
