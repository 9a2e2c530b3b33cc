// ABOUTME: Frame-level landmark errors raised by angle extraction
// ABOUTME: Recoverable per frame; the pipeline skips the frame instead of failing the session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::LandmarkIndex;
use thiserror::Error;

/// Reasons a frame cannot produce joint angles
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    /// Frame does not carry a slot for a required joint
    #[error("landmark {index:?} missing from frame with {available} slots")]
    Missing {
        /// Joint that was required
        index: LandmarkIndex,
        /// Number of slots the frame actually carried
        available: usize,
    },

    /// Required joint is present but its confidence is below the floor
    #[error("landmark {index:?} visibility {visibility:.2} below floor {floor:.2}")]
    LowVisibility {
        /// Joint that was required
        index: LandmarkIndex,
        /// Reported visibility
        visibility: f64,
        /// Configured minimum
        floor: f64,
    },

    /// Required joint has NaN or infinite coordinates
    #[error("landmark {index:?} has non-finite coordinates")]
    NonFinite {
        /// Joint that was required
        index: LandmarkIndex,
    },
}

impl LandmarkError {
    /// Joint responsible for the failure
    #[must_use]
    pub const fn index(&self) -> LandmarkIndex {
        match self {
            Self::Missing { index, .. }
            | Self::LowVisibility { index, .. }
            | Self::NonFinite { index } => *index,
        }
    }
}
