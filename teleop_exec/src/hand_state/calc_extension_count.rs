//! Extension count hand state calculation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{landmarks::hand_ids, LandmarkIndex};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Count the fingers whose tip is higher in the image than their proximal joint.
///
/// Image y grows downward, so an extended finger has `tip.y < pip.y`. Returns `None` if any
/// tip or proximal joint is missing.
pub fn num_extended_fingers(hand: &LandmarkIndex) -> Option<usize> {
    let tips = hand.get_all(hand_ids::TIPS)?;
    let pips = hand.get_all(hand_ids::PIPS)?;

    Some(
        tips.iter()
            .zip(pips.iter())
            .filter(|(tip, pip)| tip.y < pip.y)
            .count(),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hand_state::test::hand;

    #[test]
    fn test_count() {
        assert_eq!(num_extended_fingers(&LandmarkIndex::hand(&hand(&[]))), Some(5));
        assert_eq!(
            num_extended_fingers(&LandmarkIndex::hand(&hand(&[0, 4]))),
            Some(3)
        );
        assert_eq!(
            num_extended_fingers(&LandmarkIndex::hand(&hand(&[0, 1, 2, 3, 4]))),
            Some(0)
        );
    }

    #[test]
    fn test_level_tip_not_extended() {
        let mut lms = hand(&[]);
        let pip_y = lms[hand_ids::INDEX_PIP as usize].y;
        lms[hand_ids::INDEX_TIP as usize].y = pip_y;

        assert_eq!(num_extended_fingers(&LandmarkIndex::hand(&lms)), Some(4));
    }

    #[test]
    fn test_missing_tip() {
        let lms: Vec<_> = hand(&[])
            .into_iter()
            .filter(|l| l.id != hand_ids::RING_TIP)
            .collect();

        assert_eq!(num_extended_fingers(&LandmarkIndex::hand(&lms)), None);
    }
}
