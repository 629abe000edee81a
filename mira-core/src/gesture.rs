//! Coarse pose reading used in the commentary prompt

use crate::detection::Subject;
use serde::{Deserialize, Serialize};
use std::fmt;

/// COCO-17 index of the left wrist
pub const LEFT_WRIST: usize = 9;

/// Normalized height above which a raised wrist counts as excited
pub const RAISED_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    Excited,
    Still,
}

impl Gesture {
    pub fn describe(&self) -> &'static str {
        match self {
            Gesture::Excited => "raised arms / excited",
            Gesture::Still => "still",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Read the first subject's `joint`: above `threshold` (smaller y) is
/// excited, anything else, including no subject, is still.
pub fn classify(subjects: &[Subject], joint: usize, threshold: f32) -> Gesture {
    match subjects.first().and_then(|s| s.joint(joint)) {
        Some(kp) if kp.y < threshold => Gesture::Excited,
        _ => Gesture::Still,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Keypoint;

    fn subject_with_wrist(y: f32) -> Subject {
        let mut keypoints = vec![Keypoint::new(0.5, 0.9, 0.9); 17];
        keypoints[LEFT_WRIST] = Keypoint::new(0.4, y, 0.9);
        Subject::new(keypoints)
    }

    #[test]
    fn test_raised_wrist_is_excited() {
        let subjects = vec![subject_with_wrist(0.2)];
        assert_eq!(classify(&subjects, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Excited);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let subjects = vec![subject_with_wrist(0.5)];
        assert_eq!(classify(&subjects, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);
        let subjects = vec![subject_with_wrist(0.4999)];
        assert_eq!(classify(&subjects, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Excited);
    }

    #[test]
    fn test_lowered_wrist_is_still() {
        let subjects = vec![subject_with_wrist(0.8)];
        assert_eq!(classify(&subjects, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);
    }

    #[test]
    fn test_no_subjects_is_still() {
        assert_eq!(classify(&[], LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);
    }

    #[test]
    fn test_missing_joint_is_still() {
        let subjects = vec![Subject::new(vec![Keypoint::new(0.1, 0.1, 0.9); 5])];
        assert_eq!(classify(&subjects, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);
    }

    #[test]
    fn test_only_first_subject_counts() {
        let subjects = vec![subject_with_wrist(0.9), subject_with_wrist(0.1)];
        assert_eq!(classify(&subjects, LEFT_WRIST, RAISED_THRESHOLD), Gesture::Still);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Gesture::Excited.to_string(), "raised arms / excited");
        assert_eq!(Gesture::Still.describe(), "still");
    }
}
