//! Pure landmark geometry: distances and derived finger open/closed states.

use crate::detector::hand_detector::{Landmark, landmarks as lm};

/// Euclidean distance in normalized image coordinates.
pub fn distance(a: Landmark, b: Landmark) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Open/closed classification for [thumb, index, middle, ring, pinky].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerStates(pub [bool; 5]);

impl FingerStates {
    pub fn all_open(&self) -> bool {
        self.0.iter().all(|&open| open)
    }
}

/// Fingertips paired with the joint each tip is compared against: the IP
/// joint for the thumb, the PIP joint for the other four fingers.
const TIP_JOINT_PAIRS: [(usize, usize); 5] = [
    (lm::THUMB_TIP, lm::THUMB_IP),
    (lm::INDEX_FINGER_TIP, lm::INDEX_FINGER_PIP),
    (lm::MIDDLE_FINGER_TIP, lm::MIDDLE_FINGER_PIP),
    (lm::RING_FINGER_TIP, lm::RING_FINGER_PIP),
    (lm::PINKY_TIP, lm::PINKY_PIP),
];

/// Derives finger states from a landmark set. A finger counts as open when
/// its tip is farther from the wrist than its comparison joint, which makes
/// the result rotation-invariant. Returns `None` for incomplete data.
pub fn finger_states(points: &[Landmark]) -> Option<FingerStates> {
    if points.len() < 21 {
        return None;
    }

    let wrist = points[lm::WRIST];
    let mut fingers = [false; 5];
    for (finger, (tip, joint)) in TIP_JOINT_PAIRS.iter().enumerate() {
        fingers[finger] = distance(points[*tip], wrist) > distance(points[*joint], wrist);
    }

    Some(FingerStates(fingers))
}
