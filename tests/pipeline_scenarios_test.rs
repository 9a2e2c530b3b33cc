// ABOUTME: End-to-end frame scenarios through the form coaching pipeline
// ABOUTME: Covers rep counting per mode, shallow attempts, inactivity resets and mode switches
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{init_test_logging, replay_knee_path, squat_frame, FULL_SQUAT};
use pierre_form_coach::pipeline::{FormPipeline, FrameSkipReason};
use pierre_form_coach::registry::SessionRegistry;
use pierre_form_core::config::ThresholdCatalog;
use pierre_form_core::models::{
    CameraView, ExerciseMode, ExercisePhase, ExerciseType, RepQuality,
};
use std::sync::Arc;

fn pipeline() -> FormPipeline {
    init_test_logging();
    FormPipeline::new(ThresholdCatalog::builtin())
}

#[test]
fn test_beginner_squat_counts_one_rep() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();

    let outcomes = replay_knee_path(&pipeline, &mut state, 0, 100, &FULL_SQUAT);

    let phases: Vec<ExercisePhase> = outcomes
        .iter()
        .filter_map(|outcome| outcome.transition.as_ref().map(|t| t.current_phase))
        .collect();
    assert_eq!(
        phases,
        vec![
            ExercisePhase::Transition,
            ExercisePhase::Bottom,
            ExercisePhase::Transition,
            ExercisePhase::Top,
        ]
    );
    assert!(outcomes.iter().all(|o| o.skipped.is_none()));
    assert!(outcomes
        .iter()
        .all(|o| o.view.as_ref().map(|v| v.view) == Some(CameraView::OptimalSide)));

    let last = outcomes.last().unwrap();
    assert!(last.rep.rep_completed);
    assert_eq!(last.rep.rep_valid, Some(true));
    assert_eq!(last.rep.rep_quality, Some(RepQuality::Excellent));
    assert_eq!(last.rep.rep_duration_ms, Some(300));
    assert!(last.rep.feedback.as_deref().unwrap().contains("Rep 1"));

    assert_eq!(state.counts().total_reps, 1);
    assert_eq!(state.counts().correct_reps, 1);
    assert_eq!(state.data().total_reps, 1);
    assert_eq!(state.data().valid_reps, 1);
    assert_eq!(state.data().state_transitions_count, 4);
    assert_eq!(state.data().rep_qualities, vec![100.0]);
}

#[test]
fn test_pro_squat_same_depth_is_too_shallow() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Pro, 0)
        .unwrap();

    let outcomes = replay_knee_path(&pipeline, &mut state, 0, 100, &FULL_SQUAT);

    assert!(outcomes.iter().all(|o| o.phase != ExercisePhase::Bottom));
    let last = outcomes.last().unwrap();
    assert_eq!(last.phase, ExercisePhase::Top);
    assert!(!last.rep.rep_completed);
    assert!(last
        .rep
        .feedback
        .as_deref()
        .unwrap()
        .contains("reached 75 degrees"));
    assert_eq!(state.counts().total_reps, 0);
    assert_eq!(state.data().state_transitions_count, 2);
}

#[test]
fn test_consecutive_reps_build_a_streak() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();

    let path: Vec<f64> = FULL_SQUAT
        .iter()
        .chain(FULL_SQUAT[1..].iter())
        .chain(FULL_SQUAT[1..].iter())
        .copied()
        .collect();
    replay_knee_path(&pipeline, &mut state, 0, 100, &path);

    assert_eq!(state.counts().total_reps, 3);
    assert_eq!(state.counts().current_streak, 3);
    assert_eq!(state.counts().best_streak, 3);
    assert_eq!(state.data().rep_qualities.len(), 3);
}

#[test]
fn test_inactivity_discards_the_attempt() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();

    replay_knee_path(&pipeline, &mut state, 0, 100, &[170.0, 120.0]);
    // Beginner squat times out after 15 seconds
    let resumed = replay_knee_path(&pipeline, &mut state, 20_000, 100, &[75.0, 120.0, 170.0]);

    assert!(resumed[0].rep.should_reset);
    assert!(resumed.iter().all(|o| !o.rep.rep_completed));
    assert_eq!(state.counts().total_reps, 0);
}

#[test]
fn test_mode_switch_mid_rep_abandons_attempt() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();

    replay_knee_path(&pipeline, &mut state, 0, 100, &[170.0, 120.0, 75.0]);
    assert_eq!(state.phase(), ExercisePhase::Bottom);

    pipeline.switch_mode(&mut state, ExerciseMode::Pro).unwrap();
    let after = replay_knee_path(&pipeline, &mut state, 300, 100, &[120.0, 170.0]);

    assert!(after.iter().all(|o| !o.rep.rep_completed));
    assert_eq!(state.counts().total_reps, 0);
    assert_eq!(state.mode(), ExerciseMode::Pro);

    // The next full-depth pro rep counts normally
    replay_knee_path(&pipeline, &mut state, 500, 100, &[120.0, 60.0, 120.0, 170.0]);
    assert_eq!(state.counts().total_reps, 1);
}

#[test]
fn test_mode_switch_during_descent_does_not_count_the_rep() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();

    replay_knee_path(&pipeline, &mut state, 0, 100, &[170.0, 120.0]);
    assert_eq!(state.phase(), ExercisePhase::Transition);

    pipeline.switch_mode(&mut state, ExerciseMode::Pro).unwrap();
    let after = replay_knee_path(&pipeline, &mut state, 200, 100, &[60.0, 120.0, 170.0]);

    assert_eq!(after[0].phase, ExercisePhase::Bottom);
    assert_eq!(state.phase(), ExercisePhase::Top);
    assert!(after.iter().all(|o| !o.rep.rep_completed));
    assert_eq!(state.counts().total_reps, 0);

    replay_knee_path(&pipeline, &mut state, 500, 100, &[120.0, 60.0, 120.0, 170.0]);
    assert_eq!(state.counts().total_reps, 1);
}

#[test]
fn test_duplicate_timestamp_does_not_advance_phase() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();

    pipeline.process_frame(&mut state, &squat_frame(0, 170.0));
    pipeline.process_frame(&mut state, &squat_frame(100, 120.0));
    let duplicate = pipeline.process_frame(&mut state, &squat_frame(100, 75.0));

    assert_eq!(
        duplicate.skipped,
        Some(FrameSkipReason::NonMonotonicTimestamp { previous_ms: 100 })
    );
    assert_eq!(state.phase(), ExercisePhase::Transition);
}

#[test]
fn test_finish_mid_rep_reports_abandoned_attempt() {
    let pipeline = pipeline();
    let mut state = pipeline
        .start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
        .unwrap();
    replay_knee_path(&pipeline, &mut state, 0, 100, &FULL_SQUAT);
    replay_knee_path(&pipeline, &mut state, 500, 100, &[120.0, 75.0]);

    let finished = pipeline.finish_session(state);
    assert!(finished.abandoned_attempt);
    assert_eq!(finished.counts.total_reps, 1);
    assert_eq!(finished.data.total_reps, 1);
    assert!(finished.data.end_time.is_some());
}

#[test]
fn test_registry_runs_sessions_on_many_threads() {
    init_test_logging();
    let registry = Arc::new(SessionRegistry::new(Arc::new(FormPipeline::new(
        ThresholdCatalog::builtin(),
    ))));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let id = registry
                    .start(&format!("athlete-{n}"), ExerciseType::Squat, ExerciseMode::Beginner, 0)
                    .unwrap();
                for (i, angle) in FULL_SQUAT.iter().enumerate() {
                    registry
                        .process_frame(id, &squat_frame(i as u64 * 100, *angle))
                        .unwrap();
                }
                registry.finish(id).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let finished = handle.join().unwrap();
        assert_eq!(finished.counts.total_reps, 1);
    }
    assert!(registry.is_empty());
}
