// ABOUTME: Core types and constants for Pierre real-time exercise form analysis
// ABOUTME: Foundation crate with error handling, data model, constants and threshold tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Form Core
//!
//! Foundation crate providing the shared data model for the form coaching
//! pipeline. It changes infrequently so the analysis crate and the session
//! layer can compile incrementally on top of it.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode` and the frame-level `LandmarkError`
//! - **constants**: landmark topology sizes, visibility floors, retention caps
//! - **models**: landmarks, angles, phases, violations, reps, feedback, sessions
//! - **config**: per-exercise, per-mode threshold tables and their validation

/// Unified error handling with standard error codes
pub mod errors;

/// Constants organized by domain
pub mod constants;

/// Data model shared by every pipeline stage
pub mod models;

/// Threshold tables (`ThresholdCatalog`, `ModeThresholds`) and validation
pub mod config;
