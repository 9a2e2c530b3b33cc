// ABOUTME: Real-time exercise form analysis components driven once per landmark frame
// ABOUTME: Angle extraction, view assessment, phase detection, form rules, rep counting and feedback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Form Analysis
//!
//! The per-frame components of the form coaching pipeline, in dependency order:
//!
//! 1. `angle_calculator`: landmarks to joint angles
//! 2. `camera_view`: landmarks to view class, yaw and confidence
//! 3. `state_machine`: primary angle to hysteresis-banded phase transitions
//! 4. `form_analysis`: landmarks and angles to form violations
//! 5. `rep_counter`: transitions and violations to rep lifecycle events
//! 6. `feedback_engine`: everything above to a prioritized feedback payload
//!
//! Nothing here performs I/O. The state machine and rep counter hold
//! per-session state and are owned by the caller's session handle.

/// Joint angle extraction
pub mod angle_calculator;
/// Camera view assessment
pub mod camera_view;
/// Prioritized, mode-aware feedback generation
pub mod feedback_engine;
/// Biomechanical form rules
pub mod form_analysis;
/// Vector helpers over landmarks
pub mod geometry;
/// Rep lifecycle and quality scoring
pub mod rep_counter;
/// Hysteresis-banded exercise phase detection
pub mod state_machine;

pub use angle_calculator::AngleCalculator;
pub use camera_view::CameraViewAnalyzer;
pub use feedback_engine::{FeedbackContext, FeedbackEngine, FeedbackEngineConfig};
pub use form_analysis::FormAnalyzer;
pub use rep_counter::{RepCounter, RepScoring};
pub use state_machine::ExerciseStateMachine;
