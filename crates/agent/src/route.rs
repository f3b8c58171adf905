//! Routing: decide between local generation and web augmentation.

use crate::state::{Branch, Mode};

/// Map a confidence score and operating mode to a branch.
///
/// Offline mode always routes local regardless of score. Online mode
/// routes to web augmentation iff the score is strictly below the
/// threshold; a score exactly at the threshold stays local.
pub fn route(score: f32, mode: Mode, threshold: f32) -> Branch {
    match mode {
        Mode::Offline => Branch::Local,
        Mode::Online => {
            if score < threshold {
                Branch::WebAugmented
            } else {
                Branch::Local
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EMPTY_EVIDENCE_SCORE;

    #[test]
    fn test_offline_always_local() {
        for score in [-1.0e6_f32, EMPTY_EVIDENCE_SCORE, -5.0, -0.001, 0.0, 0.5, 1.0e6] {
            assert_eq!(route(score, Mode::Offline, 0.0), Branch::Local);
        }
    }

    #[test]
    fn test_online_below_threshold_augments() {
        assert_eq!(route(-0.2, Mode::Online, 0.0), Branch::WebAugmented);
        assert_eq!(route(-1.0e4, Mode::Online, 0.0), Branch::WebAugmented);
        assert_eq!(route(0.4, Mode::Online, 0.5), Branch::WebAugmented);
    }

    #[test]
    fn test_online_at_or_above_threshold_stays_local() {
        assert_eq!(route(0.5, Mode::Online, 0.0), Branch::Local);
        // Strict inequality: equality routes local.
        assert_eq!(route(0.0, Mode::Online, 0.0), Branch::Local);
        assert_eq!(route(-1.5, Mode::Online, -1.5), Branch::Local);
    }
}
