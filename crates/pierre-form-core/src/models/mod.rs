// ABOUTME: Data model shared by every stage of the form coaching pipeline
// ABOUTME: Re-exports landmark, exercise, view, phase, violation, rep, feedback and session types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Per-frame values (`PoseFrame`, `ExerciseAngles`, `ViewAnalysis`,
//! `FormViolation`) are ephemeral and owned by a single processing pass.
//! Session values (`ExerciseSessionData`, `SessionSummary`) outlive frames and
//! are what the storage boundary persists.

/// Exercise kinds, modes, angle channels and per-frame angles
pub mod exercise;
/// Feedback payloads and directives
pub mod feedback;
/// Pose landmarks and frames
pub mod landmarks;
/// Phases and transition events
pub mod phase;
/// Rep quality, counter results and totals
pub mod rep;
/// Session records and summaries
pub mod session;
/// Camera view assessment
pub mod view;
/// Form violations and severity
pub mod violation;

pub use exercise::{AngleChannel, ExerciseAngles, ExerciseMode, ExerciseType};
pub use feedback::{CueKind, FeedbackDirective, FeedbackPriority, FeedbackResponse, VisualCue};
pub use landmarks::{BodySide, Joint, LandmarkIndex, PoseFrame, PoseLandmark};
pub use phase::{ExercisePhase, StateTransition};
pub use rep::{RepCountResult, RepCounts, RepQuality};
pub use session::{
    ExerciseSessionData, PersonalBest, ProgressTrend, SessionId, SessionKey, SessionLifecycle,
    SessionSummary, ViolationCount,
};
pub use view::{CameraView, ViewAnalysis, ViewRecommendation};
pub use violation::{FormViolation, Severity, ViolationKind};
