// ABOUTME: Repetition outcome types: quality buckets, per-frame counter result, running totals
// ABOUTME: RepCounts keeps correct + incorrect == total after every update
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::violation::ViolationKind;
use crate::constants::scoring::{EXCELLENT_MIN, GOOD_MIN, NEEDS_IMPROVEMENT_MIN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality bucket for a completed repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepQuality {
    /// Score of at least 95
    Excellent,
    /// Score of at least 80
    Good,
    /// Score of at least 60
    NeedsImprovement,
    /// Anything lower
    Poor,
}

impl RepQuality {
    /// Bucket for a 0-100 score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= EXCELLENT_MIN {
            Self::Excellent
        } else if score >= GOOD_MIN {
            Self::Good
        } else if score >= NEEDS_IMPROVEMENT_MIN {
            Self::NeedsImprovement
        } else {
            Self::Poor
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Excellent => 3,
            Self::Good => 2,
            Self::NeedsImprovement => 1,
            Self::Poor => 0,
        }
    }

    /// Whether this bucket is at least as good as `minimum`
    #[must_use]
    pub const fn meets(self, minimum: Self) -> bool {
        self.rank() >= minimum.rank()
    }
}

impl fmt::Display for RepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => f.write_str("excellent"),
            Self::Good => f.write_str("good"),
            Self::NeedsImprovement => f.write_str("needs improvement"),
            Self::Poor => f.write_str("poor"),
        }
    }
}

/// Rep counter output for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepCountResult {
    /// A repetition closed on this frame
    pub rep_completed: bool,
    /// Bucket of the closed repetition
    pub rep_quality: Option<RepQuality>,
    /// 0-100 score of the closed repetition
    pub quality_score: Option<f64>,
    /// Whether the closed repetition met the correctness threshold
    pub rep_valid: Option<bool>,
    /// Text for the user, present on completions, shallow attempts and resets
    pub feedback: Option<String>,
    /// An inactivity reset fired on this frame
    pub should_reset: bool,
    /// Time from leaving the top position to returning to it
    pub rep_duration_ms: Option<u64>,
    /// Distinct violation kinds carried by the closed repetition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violation_kinds: Vec<ViolationKind>,
}

impl RepCountResult {
    /// Nothing happened this frame
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Feedback without a completed rep
    #[must_use]
    pub fn notice(feedback: impl Into<String>) -> Self {
        Self {
            feedback: Some(feedback.into()),
            ..Self::default()
        }
    }

    /// Whether a rep closed on this frame and met the correctness threshold
    #[must_use]
    pub fn is_valid_rep(&self) -> bool {
        self.rep_completed && self.rep_valid == Some(true)
    }
}

/// Running totals for the active session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCounts {
    /// Reps meeting the correctness threshold
    pub correct_reps: u32,
    /// Reps below the correctness threshold
    pub incorrect_reps: u32,
    /// All completed reps
    pub total_reps: u32,
    /// Consecutive correct reps ending at the latest rep
    pub current_streak: u32,
    /// Longest streak this session
    pub best_streak: u32,
    /// Session start, in the frame timestamp domain
    pub session_start_time_ms: u64,
}

impl RepCounts {
    /// Fresh totals for a session starting at `session_start_time_ms`
    #[must_use]
    pub const fn new(session_start_time_ms: u64) -> Self {
        Self {
            correct_reps: 0,
            incorrect_reps: 0,
            total_reps: 0,
            current_streak: 0,
            best_streak: 0,
            session_start_time_ms,
        }
    }

    /// Record one completed rep
    pub fn record(&mut self, correct: bool) {
        self.total_reps += 1;
        if correct {
            self.correct_reps += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.incorrect_reps += 1;
            self.current_streak = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_buckets() {
        assert_eq!(RepQuality::from_score(100.0), RepQuality::Excellent);
        assert_eq!(RepQuality::from_score(92.0), RepQuality::Good);
        assert_eq!(RepQuality::from_score(75.0), RepQuality::NeedsImprovement);
        assert_eq!(RepQuality::from_score(10.0), RepQuality::Poor);
    }

    #[test]
    fn test_meets_threshold() {
        assert!(RepQuality::Excellent.meets(RepQuality::Good));
        assert!(RepQuality::Good.meets(RepQuality::Good));
        assert!(!RepQuality::NeedsImprovement.meets(RepQuality::Good));
    }

    #[test]
    fn test_counts_conservation_and_streaks() {
        let mut counts = RepCounts::new(0);
        for correct in [true, true, false, true, true, true] {
            counts.record(correct);
            assert_eq!(counts.correct_reps + counts.incorrect_reps, counts.total_reps);
        }
        assert_eq!(counts.total_reps, 6);
        assert_eq!(counts.current_streak, 3);
        assert_eq!(counts.best_streak, 3);
    }
}
