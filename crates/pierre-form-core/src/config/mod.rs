// ABOUTME: Threshold configuration for exercise phase detection and form rules
// ABOUTME: Exposes the threshold catalog, per-mode tables and configuration errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Configuration error types
pub mod error;
/// Threshold tables and the catalog
pub mod thresholds;

pub use error::ConfigError;
pub use thresholds::{
    ChannelThresholds, ExerciseProfile, FormTolerances, ModeTable, ModeThresholds,
    ThresholdCatalog,
};
