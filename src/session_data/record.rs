// ABOUTME: Pure per-rep, per-transition and per-frame folds over a session record
// ABOUTME: Public folds take the record by value, crate-internal variants update it in place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use pierre_form_core::constants::scoring::PERFECT_SCORE;
use pierre_form_core::models::{ExerciseSessionData, ViolationCount, ViolationKind};
use std::collections::BTreeSet;

/// Fold one completed rep into the session
///
/// Each distinct violation kind counts once per rep.
#[must_use]
pub fn update_session_rep(
    mut session: ExerciseSessionData,
    quality_score: f64,
    is_valid: bool,
    violations: &[ViolationKind],
) -> ExerciseSessionData {
    apply_rep(&mut session, quality_score, is_valid, violations);
    session
}

/// Count one phase transition
#[must_use]
pub fn record_transition(mut session: ExerciseSessionData) -> ExerciseSessionData {
    apply_transition(&mut session);
    session
}

/// Fold one frame's view confidence into the running mean
///
/// A reliable-to-unreliable change counts as one repositioning.
#[must_use]
pub fn record_view_sample(
    mut session: ExerciseSessionData,
    confidence: f64,
    reliable: bool,
) -> ExerciseSessionData {
    apply_view_sample(&mut session, confidence, reliable);
    session
}

/// Stamp completion time and derive duration figures
#[must_use]
pub fn finalize_timing(
    mut session: ExerciseSessionData,
    end_time: DateTime<Utc>,
) -> ExerciseSessionData {
    apply_finalize(&mut session, end_time);
    session
}

pub(crate) fn apply_rep(
    session: &mut ExerciseSessionData,
    quality_score: f64,
    is_valid: bool,
    violations: &[ViolationKind],
) {
    let score = if quality_score.is_finite() {
        quality_score.clamp(0.0, PERFECT_SCORE)
    } else {
        0.0
    };

    session.total_reps += 1;
    if is_valid {
        session.valid_reps += 1;
    } else {
        session.invalid_reps += 1;
    }
    session.rep_qualities.push(score);
    session.average_rep_quality =
        session.rep_qualities.iter().sum::<f64>() / session.rep_qualities.len() as f64;

    for kind in violations.iter().copied().collect::<BTreeSet<_>>() {
        match session.form_violations.iter_mut().find(|entry| entry.kind == kind) {
            Some(entry) => entry.count += 1,
            None => session.form_violations.push(ViolationCount { kind, count: 1 }),
        }
    }
}

pub(crate) fn apply_transition(session: &mut ExerciseSessionData) {
    session.state_transitions_count = session.state_transitions_count.saturating_add(1);
}

pub(crate) fn apply_view_sample(session: &mut ExerciseSessionData, confidence: f64, reliable: bool) {
    let confidence = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let samples = f64::from(session.view_samples);
    session.camera_view_quality =
        session.camera_view_quality.mul_add(samples, confidence) / (samples + 1.0);
    session.view_samples = session.view_samples.saturating_add(1);

    if session.view_reliable && !reliable {
        session.repositioning_count += 1;
    }
    session.view_reliable = reliable;
}

pub(crate) fn apply_finalize(session: &mut ExerciseSessionData, end_time: DateTime<Utc>) {
    let duration_seconds =
        (end_time - session.start_time).num_milliseconds().max(0) as f64 / 1_000.0;
    session.end_time = Some(end_time);
    session.duration_seconds = Some(duration_seconds);
    session.average_rep_duration = if session.total_reps == 0 {
        0.0
    } else {
        duration_seconds / f64::from(session.total_reps)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pierre_form_core::models::{ExerciseMode, ExerciseType, SessionLifecycle};

    fn fresh() -> ExerciseSessionData {
        ExerciseSessionData::new(
            "user-1",
            ExerciseType::Squat,
            ExerciseMode::Beginner,
            Utc::now(),
        )
    }

    #[test]
    fn test_rep_conservation_and_average() {
        let session = fresh();
        let session = update_session_rep(session, 100.0, true, &[]);
        let session = update_session_rep(
            session,
            55.0,
            false,
            &[ViolationKind::KneeOverToe, ViolationKind::KneeOverToe],
        );
        let session = update_session_rep(session, 80.0, true, &[ViolationKind::KneeOverToe]);

        assert_eq!(session.total_reps, 3);
        assert_eq!(session.valid_reps + session.invalid_reps, session.total_reps);
        assert_eq!(session.rep_qualities, vec![100.0, 55.0, 80.0]);
        assert!((session.average_rep_quality - 235.0 / 3.0).abs() < 1e-9);
        assert_eq!(session.violation_count(ViolationKind::KneeOverToe), 2);
        assert_eq!(session.lifecycle(), SessionLifecycle::Active);
    }

    #[test]
    fn test_out_of_range_score_is_clamped() {
        let session = update_session_rep(fresh(), 140.0, true, &[]);
        assert_eq!(session.rep_qualities, vec![100.0]);
        let session = update_session_rep(session, f64::NAN, false, &[]);
        assert_eq!(session.rep_qualities[1], 0.0);
    }

    #[test]
    fn test_view_samples_and_repositioning() {
        let session = record_view_sample(fresh(), 1.0, true);
        let session = record_view_sample(session, 0.2, false);
        let session = record_view_sample(session, 0.3, false);
        let session = record_view_sample(session, 0.9, true);
        let session = record_view_sample(session, 0.1, false);

        assert_eq!(session.view_samples, 5);
        assert_eq!(session.repositioning_count, 2);
        assert!((session.camera_view_quality - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_finalize_timing() {
        let mut session = fresh();
        let start = session.start_time;
        session = update_session_rep(session, 90.0, true, &[]);
        session = update_session_rep(session, 90.0, true, &[]);
        let session = finalize_timing(session, start + Duration::seconds(30));

        assert_eq!(session.duration_seconds, Some(30.0));
        assert!((session.average_rep_duration - 15.0).abs() < 1e-9);
        assert_eq!(session.lifecycle(), SessionLifecycle::Completed);
    }

    #[test]
    fn test_finalize_without_reps() {
        let session = fresh();
        let start = session.start_time;
        let session = finalize_timing(record_transition(session), start + Duration::seconds(5));
        assert_eq!(session.average_rep_duration, 0.0);
        assert_eq!(session.state_transitions_count, 1);
    }
}
