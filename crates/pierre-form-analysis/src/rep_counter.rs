// ABOUTME: Rep lifecycle tracking driven by phase transitions, with quality scoring and streaks
// ABOUTME: Discards attempts on inactivity, mode switches and session stops without counting them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rep Counter
//!
//! An attempt opens when the phase leaves Top and closes as a rep when the
//! phase returns to Top after visiting Bottom. Violations seen during the
//! attempt are folded per kind, keeping the worst severity, and deducted from
//! a 100-point score when the rep closes.

use pierre_form_core::config::ExerciseProfile;
use pierre_form_core::constants::scoring::PERFECT_SCORE;
use pierre_form_core::models::{
    ExerciseType, FormViolation, RepCountResult, RepCounts, RepQuality, Severity, StateTransition,
    ViolationKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Scoring policy for closed reps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepScoring {
    /// Lowest bucket that counts as a correct rep
    pub min_correct_quality: RepQuality,
}

impl Default for RepScoring {
    fn default() -> Self {
        Self {
            min_correct_quality: RepQuality::Good,
        }
    }
}

impl RepScoring {
    /// Score for a set of distinct violation kinds at their worst severity
    #[must_use]
    pub fn score<'a>(&self, worst: impl IntoIterator<Item = &'a Severity>) -> f64 {
        let penalty: f64 = worst.into_iter().map(|severity| severity.penalty()).sum();
        (PERFECT_SCORE - penalty).clamp(0.0, PERFECT_SCORE)
    }
}

/// In-flight repetition
#[derive(Debug, Clone, PartialEq)]
struct RepAttempt {
    started_ms: u64,
    visited_bottom: bool,
    deepest_angle: Option<f64>,
    worst: BTreeMap<ViolationKind, Severity>,
}

impl RepAttempt {
    const fn new(started_ms: u64) -> Self {
        Self {
            started_ms,
            visited_bottom: false,
            deepest_angle: None,
            worst: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, violations: &[FormViolation], primary_angle: Option<f64>) {
        for violation in violations {
            self.worst
                .entry(violation.kind)
                .and_modify(|severity| *severity = (*severity).max(violation.severity))
                .or_insert(violation.severity);
        }
        if let Some(angle) = primary_angle.filter(|a| a.is_finite()) {
            self.deepest_angle = Some(self.deepest_angle.map_or(angle, |d| d.min(angle)));
        }
    }

    fn worst_kind(&self) -> Option<ViolationKind> {
        self.worst
            .iter()
            .max_by_key(|(_, severity)| **severity)
            .map(|(kind, _)| *kind)
    }
}

/// Per-session rep tracker
#[derive(Debug, Clone)]
pub struct RepCounter {
    exercise: ExerciseType,
    scoring: RepScoring,
    counts: RepCounts,
    attempt: Option<RepAttempt>,
    last_activity_ms: u64,
    inactivity_timeout_ms: u64,
}

impl RepCounter {
    /// Tracker for a session starting at `session_start_ms`
    #[must_use]
    pub fn new(profile: &ExerciseProfile, session_start_ms: u64, scoring: RepScoring) -> Self {
        Self {
            exercise: profile.exercise,
            scoring,
            counts: RepCounts::new(session_start_ms),
            attempt: None,
            last_activity_ms: session_start_ms,
            inactivity_timeout_ms: profile.thresholds.inactivity_timeout_ms(),
        }
    }

    /// Running totals
    #[must_use]
    pub const fn counts(&self) -> &RepCounts {
        &self.counts
    }

    /// Scoring policy in force
    #[must_use]
    pub const fn scoring(&self) -> RepScoring {
        self.scoring
    }

    /// Whether a repetition is in flight
    #[must_use]
    pub const fn in_attempt(&self) -> bool {
        self.attempt.is_some()
    }

    /// Whether the idle gap at `now_ms` exceeds the inactivity timeout
    #[must_use]
    pub const fn is_inactive(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) > self.inactivity_timeout_ms
    }

    /// Adopt a new exercise or mode, discarding the in-flight attempt
    pub fn apply_profile(&mut self, profile: &ExerciseProfile) {
        self.abandon_attempt();
        self.exercise = profile.exercise;
        self.inactivity_timeout_ms = profile.thresholds.inactivity_timeout_ms();
    }

    /// Drop the in-flight attempt uncounted; returns whether one existed
    pub fn abandon_attempt(&mut self) -> bool {
        let abandoned = self.attempt.take().is_some();
        if abandoned {
            debug!(exercise = %self.exercise, "Rep attempt abandoned");
        }
        abandoned
    }

    /// Feed one frame; `transition` is the state machine's output for the same frame
    pub fn process(
        &mut self,
        transition: Option<&StateTransition>,
        violations: &[FormViolation],
        timestamp_ms: u64,
        primary_angle: Option<f64>,
    ) -> RepCountResult {
        let Some(transition) = transition else {
            if let Some(attempt) = self.attempt.as_mut() {
                attempt.absorb(violations, primary_angle);
            }
            return RepCountResult::idle();
        };

        let idle_reset = self.is_inactive(timestamp_ms);
        self.last_activity_ms = timestamp_ms;
        if idle_reset {
            let discarded = self.attempt.take().is_some();
            info!(
                exercise = %self.exercise,
                discarded_attempt = discarded,
                timestamp_ms,
                "Inactivity reset"
            );
            if transition.leaves_top() {
                let mut attempt = RepAttempt::new(timestamp_ms);
                attempt.absorb(violations, primary_angle);
                self.attempt = Some(attempt);
            }
            return RepCountResult {
                should_reset: true,
                ..RepCountResult::notice("Reset after a break. Start your next rep when ready.")
            };
        }

        // Only leaving the top opens an attempt; a discarded one stays discarded
        if transition.leaves_top() {
            self.attempt = Some(RepAttempt::new(timestamp_ms));
        }
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.absorb(violations, primary_angle);
            if transition.reaches_bottom() {
                attempt.visited_bottom = true;
            }
        }

        if !transition.reaches_top() {
            return RepCountResult::idle();
        }
        let Some(attempt) = self.attempt.take() else {
            return RepCountResult::idle();
        };
        if !self.exercise.counts_reps() {
            return RepCountResult::idle();
        }
        if !attempt.visited_bottom {
            let feedback = attempt.deepest_angle.map_or_else(
                || "Go deeper to complete the rep".to_owned(),
                |angle| format!("Go deeper to complete the rep (reached {angle:.0} degrees)"),
            );
            debug!(exercise = %self.exercise, "Shallow attempt not counted");
            return RepCountResult::notice(feedback);
        }
        self.complete(&attempt, timestamp_ms)
    }

    fn complete(&mut self, attempt: &RepAttempt, timestamp_ms: u64) -> RepCountResult {
        let score = self.scoring.score(attempt.worst.values());
        let quality = RepQuality::from_score(score);
        let valid = quality.meets(self.scoring.min_correct_quality);
        self.counts.record(valid);
        let duration_ms = timestamp_ms.saturating_sub(attempt.started_ms);

        let feedback = match (valid, attempt.worst_kind()) {
            (true, _) => format!("Rep {} done, {quality} form", self.counts.total_reps),
            (false, Some(kind)) => {
                format!("Rep {} counted, watch your {kind}", self.counts.total_reps)
            }
            (false, None) => format!("Rep {} counted", self.counts.total_reps),
        };

        info!(
            exercise = %self.exercise,
            rep = self.counts.total_reps,
            score,
            quality = %quality,
            valid,
            duration_ms,
            "Rep completed"
        );

        RepCountResult {
            rep_completed: true,
            rep_quality: Some(quality),
            quality_score: Some(score),
            rep_valid: Some(valid),
            feedback: Some(feedback),
            should_reset: false,
            rep_duration_ms: Some(duration_ms),
            violation_kinds: attempt.worst.keys().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::config::ThresholdCatalog;
    use pierre_form_core::models::{ExerciseAngles, ExerciseMode, ExercisePhase};

    fn counter(exercise: ExerciseType) -> RepCounter {
        let profile = ThresholdCatalog::builtin()
            .profile(exercise, ExerciseMode::Beginner)
            .unwrap();
        RepCounter::new(&profile, 0, RepScoring::default())
    }

    fn transition(from: ExercisePhase, to: ExercisePhase, at: u64) -> StateTransition {
        StateTransition {
            previous_phase: from,
            current_phase: to,
            timestamp_ms: at,
            trigger_angles: ExerciseAngles::straight(),
        }
    }

    fn violation(kind: ViolationKind, severity: Severity) -> FormViolation {
        FormViolation {
            kind,
            severity,
            description: String::new(),
            correction_hint: String::new(),
            deviation: 1.0,
        }
    }

    fn full_rep(counter: &mut RepCounter, start: u64, violations: &[FormViolation]) -> RepCountResult {
        use ExercisePhase::{Bottom, Top, Transition};
        counter.process(Some(&transition(Top, Transition, start)), &[], start, None);
        counter.process(None, violations, start + 100, None);
        counter.process(Some(&transition(Transition, Bottom, start + 200)), &[], start + 200, None);
        counter.process(Some(&transition(Bottom, Transition, start + 400)), &[], start + 400, None);
        counter.process(Some(&transition(Transition, Top, start + 600)), &[], start + 600, None)
    }

    #[test]
    fn test_clean_rep_is_excellent() {
        let mut counter = counter(ExerciseType::Squat);
        let result = full_rep(&mut counter, 1_000, &[]);
        assert!(result.rep_completed);
        assert_eq!(result.rep_quality, Some(RepQuality::Excellent));
        assert_eq!(result.rep_duration_ms, Some(600));
        assert!(result.is_valid_rep());
        assert_eq!(counter.counts().correct_reps, 1);
    }

    #[test]
    fn test_worst_severity_per_kind_is_scored_once() {
        let mut counter = counter(ExerciseType::Squat);
        let violations = [
            violation(ViolationKind::KneeOverToe, Severity::Low),
            violation(ViolationKind::KneeOverToe, Severity::Medium),
            violation(ViolationKind::ExcessiveForwardLean, Severity::Low),
        ];
        let result = full_rep(&mut counter, 0, &violations);
        // 100 - 25 - 8
        assert_eq!(result.quality_score, Some(67.0));
        assert_eq!(result.rep_quality, Some(RepQuality::NeedsImprovement));
        assert_eq!(result.rep_valid, Some(false));
        assert_eq!(result.violation_kinds.len(), 2);
        assert_eq!(counter.counts().incorrect_reps, 1);
        assert_eq!(counter.counts().current_streak, 0);
    }

    #[test]
    fn test_shallow_attempt_is_not_counted() {
        use ExercisePhase::{Top, Transition};
        let mut counter = counter(ExerciseType::Squat);
        counter.process(Some(&transition(Top, Transition, 0)), &[], 0, Some(120.0));
        let result =
            counter.process(Some(&transition(Transition, Top, 500)), &[], 500, Some(165.0));
        assert!(!result.rep_completed);
        assert!(result.feedback.unwrap().contains("deeper"));
        assert_eq!(counter.counts().total_reps, 0);
    }

    #[test]
    fn test_inactivity_discards_attempt_once() {
        use ExercisePhase::{Bottom, Top, Transition};
        let mut counter = counter(ExerciseType::Squat);
        counter.process(Some(&transition(Top, Transition, 0)), &[], 0, None);
        counter.process(Some(&transition(Transition, Bottom, 200)), &[], 200, None);
        assert!(counter.is_inactive(20_000));

        let reset = counter.process(Some(&transition(Bottom, Transition, 20_000)), &[], 20_000, None);
        assert!(reset.should_reset);
        assert!(!counter.in_attempt());

        let next = counter.process(Some(&transition(Transition, Top, 20_300)), &[], 20_300, None);
        assert!(!next.should_reset);
        assert!(!next.rep_completed);
        assert_eq!(counter.counts().total_reps, 0);
        assert_eq!(
            counter.counts().correct_reps + counter.counts().incorrect_reps,
            counter.counts().total_reps
        );
    }

    #[test]
    fn test_plank_never_completes() {
        let mut counter = counter(ExerciseType::Plank);
        let result = full_rep(&mut counter, 0, &[]);
        assert!(!result.rep_completed);
        assert_eq!(counter.counts().total_reps, 0);
    }

    #[test]
    fn test_streaks() {
        let mut counter = counter(ExerciseType::Squat);
        full_rep(&mut counter, 0, &[]);
        full_rep(&mut counter, 1_000, &[]);
        full_rep(&mut counter, 2_000, &[violation(ViolationKind::KneeOverToe, Severity::High)]);
        full_rep(&mut counter, 3_000, &[]);
        let counts = counter.counts();
        assert_eq!(counts.total_reps, 4);
        assert_eq!(counts.best_streak, 2);
        assert_eq!(counts.current_streak, 1);
    }

    #[test]
    fn test_abandon_attempt() {
        use ExercisePhase::{Top, Transition};
        let mut counter = counter(ExerciseType::Squat);
        assert!(!counter.abandon_attempt());
        counter.process(Some(&transition(Top, Transition, 0)), &[], 0, None);
        assert!(counter.abandon_attempt());
        assert!(!counter.in_attempt());
    }

    #[test]
    fn test_abandoned_attempt_is_not_revived_at_bottom() {
        use ExercisePhase::{Bottom, Top, Transition};
        let mut counter = counter(ExerciseType::Squat);
        counter.process(Some(&transition(Top, Transition, 0)), &[], 0, Some(120.0));
        assert!(counter.abandon_attempt());

        counter.process(Some(&transition(Transition, Bottom, 300)), &[], 300, Some(60.0));
        assert!(!counter.in_attempt());
        counter.process(Some(&transition(Bottom, Transition, 600)), &[], 600, Some(120.0));
        let result =
            counter.process(Some(&transition(Transition, Top, 900)), &[], 900, Some(170.0));
        assert!(!result.rep_completed);
        assert_eq!(counter.counts().total_reps, 0);

        let next = full_rep(&mut counter, 1_500, &[]);
        assert!(next.rep_completed);
        assert_eq!(counter.counts().total_reps, 1);
    }

    #[test]
    fn test_relaxed_scoring_counts_needs_improvement() {
        let profile = ThresholdCatalog::builtin()
            .profile(ExerciseType::Squat, ExerciseMode::Beginner)
            .unwrap();
        let mut counter = RepCounter::new(
            &profile,
            0,
            RepScoring {
                min_correct_quality: RepQuality::NeedsImprovement,
            },
        );
        let result = full_rep(&mut counter, 0, &[violation(ViolationKind::KneeOverToe, Severity::Medium)]);
        assert_eq!(result.rep_valid, Some(true));
    }
}
