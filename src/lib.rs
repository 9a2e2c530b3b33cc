// ABOUTME: Main library entry point for Pierre Form Coach real-time exercise form analysis
// ABOUTME: Wires the per-frame analysis crates into session handles, persistence and feedback delivery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Form Coach
//!
//! Turns a stream of pose landmark frames into exercise phases, rep counts,
//! form verdicts and throttled coaching feedback.
//!
//! ## Architecture
//!
//! - **`pierre-form-core`**: data model, error taxonomy, threshold tables
//! - **`pierre-form-analysis`**: the per-frame components (angles, view, phase,
//!   form rules, rep counting, feedback generation)
//! - **this crate**: session handles and the registry that owns them, the
//!   session data manager with its storage boundary, the feedback delivery
//!   queue, environment configuration and logging
//!
//! ## Example
//!
//! ```rust,no_run
//! use pierre_form_coach::pipeline::FormPipeline;
//! use pierre_form_core::config::ThresholdCatalog;
//! use pierre_form_core::models::{ExerciseMode, ExerciseType, PoseFrame};
//!
//! # fn frames() -> Vec<PoseFrame> { Vec::new() }
//! # fn main() -> Result<(), pierre_form_coach::errors::AppError> {
//! let pipeline = FormPipeline::new(ThresholdCatalog::builtin());
//! let mut session =
//!     pipeline.start_session("athlete-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)?;
//! for frame in frames() {
//!     let outcome = pipeline.process_frame(&mut session, &frame);
//!     if outcome.rep.rep_completed {
//!         println!("{:?}", outcome.rep.feedback);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Environment-driven configuration
pub mod config;

/// Error types re-exported from the core crate
pub mod errors;

/// Feedback delivery: throttling, preemption and the dispatcher task
pub mod delivery;

/// Structured logging setup
pub mod logging;

/// Per-session frame processing
pub mod pipeline;

/// Concurrent session handles keyed by session id
pub mod registry;

/// Session records, summaries and export/import
pub mod session_data;

/// Persistence boundary and reference stores
pub mod storage;
