//! Per-frame gesture classification.
//!
//! The rule table is evaluated top to bottom and the first match wins; the
//! order is a contract, not an accident. Thumb-direction gestures must run
//! before the generic checks because their finger pattern overlaps a fist.

use std::str::FromStr;

use anyhow::bail;

use crate::detector::hand_detector::{Landmark, landmarks as lm};
use crate::geometry::{FingerStates, distance};

/// Discrete classification of a hand pose for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    None,
    Pinch,
    PinchMiddle,
    ThumbsUp,
    ThumbsDown,
    Open,
    Toggle,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pinch => "pinch",
            Self::PinchMiddle => "pinch_middle",
            Self::ThumbsUp => "thumbs_up",
            Self::ThumbsDown => "thumbs_down",
            Self::Open => "open",
            Self::Toggle => "toggle",
        }
    }
}

impl FromStr for Gesture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "none" => Self::None,
            "pinch" => Self::Pinch,
            "pinch_middle" => Self::PinchMiddle,
            "thumbs_up" => Self::ThumbsUp,
            "thumbs_down" => Self::ThumbsDown,
            "open" => Self::Open,
            "toggle" => Self::Toggle,
            other => bail!("unknown gesture: {other}"),
        })
    }
}

/// Vertical margin the thumb tip must clear past the thumb base joint before
/// a thumbs-up or thumbs-down is accepted.
pub const THUMB_DIRECTION_MARGIN: f32 = 0.05;

/// Everything the classifier consults for one hand in one frame.
pub struct HandPose<'a> {
    pub points: &'a [Landmark; 21],
    pub fingers: FingerStates,
    pub pinch_threshold: f32,
}

/// Priority-ordered classification rules; first match wins.
const RULES: [(Gesture, fn(&HandPose) -> bool); 6] = [
    (Gesture::Pinch, is_pinch),
    (Gesture::PinchMiddle, is_pinch_middle),
    (Gesture::ThumbsUp, is_thumbs_up),
    (Gesture::ThumbsDown, is_thumbs_down),
    (Gesture::Open, is_open),
    (Gesture::Toggle, is_toggle),
];

/// Assigns exactly one gesture label to the pose, `Gesture::None` when no
/// rule applies. Classification is total: it never fails.
pub fn classify(pose: &HandPose) -> Gesture {
    for (gesture, predicate) in RULES {
        if predicate(pose) {
            return gesture;
        }
    }
    Gesture::None
}

fn is_pinch(pose: &HandPose) -> bool {
    distance(pose.points[lm::THUMB_TIP], pose.points[lm::INDEX_FINGER_TIP]) < pose.pinch_threshold
}

fn is_pinch_middle(pose: &HandPose) -> bool {
    distance(pose.points[lm::THUMB_TIP], pose.points[lm::MIDDLE_FINGER_TIP]) < pose.pinch_threshold
}

/// Thumb extended, all other fingers curled. Shared precondition for the
/// two thumb-direction gestures.
fn thumb_only(pose: &HandPose) -> bool {
    pose.fingers == FingerStates([true, false, false, false, false])
}

fn is_thumbs_up(pose: &HandPose) -> bool {
    thumb_only(pose)
        && pose.points[lm::THUMB_TIP].y < pose.points[lm::THUMB_MCP].y - THUMB_DIRECTION_MARGIN
}

fn is_thumbs_down(pose: &HandPose) -> bool {
    thumb_only(pose)
        && pose.points[lm::THUMB_TIP].y > pose.points[lm::THUMB_MCP].y + THUMB_DIRECTION_MARGIN
}

fn is_open(pose: &HandPose) -> bool {
    pose.fingers.all_open()
}

fn is_toggle(pose: &HandPose) -> bool {
    pose.fingers == FingerStates([true, true, false, false, true])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_with(points: &[Landmark; 21], fingers: [bool; 5]) -> Gesture {
        classify(&HandPose {
            points,
            fingers: FingerStates(fingers),
            pinch_threshold: 0.05,
        })
    }

    /// A hand with every fingertip well away from every other, so no pinch
    /// rule can fire by accident.
    fn spread_hand() -> [Landmark; 21] {
        let mut points = [Landmark { x: 0.5, y: 0.9 }; 21];
        for (i, point) in points.iter_mut().enumerate() {
            point.x = 0.1 + 0.04 * i as f32;
            point.y = 0.5;
        }
        points
    }

    #[test]
    fn coincident_thumb_and_index_tips_always_pinch() {
        let mut points = spread_hand();
        points[lm::INDEX_FINGER_TIP] = points[lm::THUMB_TIP];
        for threshold in [0.001, 0.05, 0.15] {
            let gesture = classify(&HandPose {
                points: &points,
                fingers: FingerStates([true; 5]),
                pinch_threshold: threshold,
            });
            assert_eq!(gesture, Gesture::Pinch, "threshold {threshold}");
        }
    }

    #[test]
    fn pinch_outranks_pinch_middle() {
        let mut points = spread_hand();
        points[lm::INDEX_FINGER_TIP] = points[lm::THUMB_TIP];
        points[lm::MIDDLE_FINGER_TIP] = points[lm::THUMB_TIP];
        assert_eq!(pose_with(&points, [true; 5]), Gesture::Pinch);
    }

    #[test]
    fn middle_pinch_when_index_is_clear() {
        let mut points = spread_hand();
        points[lm::MIDDLE_FINGER_TIP] = points[lm::THUMB_TIP];
        assert_eq!(pose_with(&points, [true; 5]), Gesture::PinchMiddle);
    }

    #[test]
    fn thumbs_up_needs_clear_vertical_margin() {
        let mut points = spread_hand();
        points[lm::THUMB_MCP] = Landmark { x: 0.5, y: 0.5 };

        points[lm::THUMB_TIP] = Landmark { x: 0.5, y: 0.43 };
        assert_eq!(
            pose_with(&points, [true, false, false, false, false]),
            Gesture::ThumbsUp
        );

        // Inside the margin: neither direction.
        points[lm::THUMB_TIP] = Landmark { x: 0.5, y: 0.48 };
        assert_eq!(
            pose_with(&points, [true, false, false, false, false]),
            Gesture::None
        );
    }

    #[test]
    fn thumbs_down_mirrors_thumbs_up() {
        let mut points = spread_hand();
        points[lm::THUMB_MCP] = Landmark { x: 0.5, y: 0.5 };
        points[lm::THUMB_TIP] = Landmark { x: 0.5, y: 0.57 };
        assert_eq!(
            pose_with(&points, [true, false, false, false, false]),
            Gesture::ThumbsDown
        );
    }

    #[test]
    fn thumb_direction_requires_thumb_only_pattern() {
        let mut points = spread_hand();
        points[lm::THUMB_MCP] = Landmark { x: 0.5, y: 0.5 };
        points[lm::THUMB_TIP] = Landmark { x: 0.5, y: 0.2 };
        // Every finger pattern other than thumb-only must refuse both
        // thumb-direction labels.
        for bits in 0u8..32 {
            let fingers = [
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
                bits & 16 != 0,
            ];
            if fingers == [true, false, false, false, false] {
                continue;
            }
            let gesture = pose_with(&points, fingers);
            assert_ne!(gesture, Gesture::ThumbsUp, "fingers {fingers:?}");
            assert_ne!(gesture, Gesture::ThumbsDown, "fingers {fingers:?}");
        }
    }

    #[test]
    fn open_hand_and_toggle_patterns() {
        let points = spread_hand();
        assert_eq!(pose_with(&points, [true; 5]), Gesture::Open);
        assert_eq!(
            pose_with(&points, [true, true, false, false, true]),
            Gesture::Toggle
        );
        assert_eq!(pose_with(&points, [false; 5]), Gesture::None);
    }
}
