// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Synthetic side-on pose frames, frame replay and completed session fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `pierre_form_coach`
//!
//! Frames are built for a subject standing side-on to the camera and facing
//! +x. Both body sides share image coordinates and differ only in depth, so
//! the view reads as an optimal side view and left/right angles agree.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pierre_form_coach::pipeline::{FormPipeline, FrameOutcome, SessionState};
use pierre_form_coach::session_data::{finalize_timing, update_session_rep};
use pierre_form_core::constants::landmarks::LANDMARK_COUNT;
use pierre_form_core::models::{
    BodySide, ExerciseMode, ExerciseSessionData, ExerciseType, Joint, PoseFrame, PoseLandmark,
};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

const THIGH: f64 = 0.2;
const VISIBILITY: f64 = 0.95;
const KNEE: (f64, f64) = (0.5, 0.65);
const ANKLE: (f64, f64) = (0.5, 0.85);
const HEEL: (f64, f64) = (0.47, 0.88);
const TOE: (f64, f64) = (0.58, 0.88);

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .with_test_writer()
            .try_init();
    });
}

fn depth(side: BodySide) -> f64 {
    match side {
        BodySide::Left => -0.1,
        BodySide::Right => 0.1,
    }
}

/// Side-on squat or lunge frame with the given knee angle in degrees
///
/// The shin stays vertical, the thigh rotates back from the knee and the
/// torso stays almost upright above the hip.
pub fn squat_frame(timestamp_ms: u64, knee_angle: f64) -> PoseFrame {
    let theta = knee_angle.to_radians();
    let hip = (
        THIGH.mul_add(-theta.sin(), KNEE.0),
        THIGH.mul_add(theta.cos(), KNEE.1),
    );
    let shoulder = (hip.0 + 0.03, hip.1 - 0.3);
    let elbow = (shoulder.0 + 0.05, shoulder.1 + 0.15);
    let wrist = (shoulder.0 + 0.15, shoulder.1 + 0.12);

    let mut landmarks = vec![PoseLandmark::hidden(); LANDMARK_COUNT];
    for side in BodySide::BOTH {
        let z = depth(side);
        for (joint, (x, y)) in [
            (Joint::Shoulder, shoulder),
            (Joint::Elbow, elbow),
            (Joint::Wrist, wrist),
            (Joint::Hip, hip),
            (Joint::Knee, KNEE),
            (Joint::Ankle, ANKLE),
            (Joint::Heel, HEEL),
            (Joint::FootIndex, TOE),
        ] {
            landmarks[side.landmark(joint).as_usize()] = PoseLandmark::new(x, y, z, VISIBILITY);
        }
    }
    PoseFrame::new(timestamp_ms, landmarks)
}

/// Feed knee angles one frame every `step_ms`, starting at `start_ms`
pub fn replay_knee_path(
    pipeline: &FormPipeline,
    state: &mut SessionState,
    start_ms: u64,
    step_ms: u64,
    path: &[f64],
) -> Vec<FrameOutcome> {
    path.iter()
        .enumerate()
        .map(|(i, angle)| {
            let frame = squat_frame(start_ms + i as u64 * step_ms, *angle);
            pipeline.process_frame(state, &frame)
        })
        .collect()
}

/// One full beginner squat rep: top, down through the bottom, back to top
pub const FULL_SQUAT: [f64; 5] = [170.0, 120.0, 75.0, 120.0, 170.0];

/// Fixed reference instant for session fixtures
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Completed squat session `offset_minutes` after `base_time`, with one rep per score
pub fn completed_session(user_id: &str, offset_minutes: i64, scores: &[f64]) -> ExerciseSessionData {
    let start = base_time() + Duration::minutes(offset_minutes);
    let session = ExerciseSessionData::new(user_id, ExerciseType::Squat, ExerciseMode::Beginner, start);
    let session = scores
        .iter()
        .fold(session, |session, score| update_session_rep(session, *score, *score >= 80.0, &[]));
    finalize_timing(session, start + Duration::seconds(60))
}
