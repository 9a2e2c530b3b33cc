// ABOUTME: Exercise phase enum and the transition event record
// ABOUTME: Three-state cycle shared by every exercise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::exercise::ExerciseAngles;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse position within a repetition cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExercisePhase {
    /// Start / lockout position
    #[default]
    Top,
    /// Dead zone between the boundaries
    Transition,
    /// Deepest position of the movement
    Bottom,
}

impl fmt::Display for ExercisePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Transition => f.write_str("transition"),
            Self::Bottom => f.write_str("bottom"),
        }
    }
}

/// One detected phase change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Phase before the change
    pub previous_phase: ExercisePhase,
    /// Phase after the change
    pub current_phase: ExercisePhase,
    /// Timestamp of the frame that committed the change
    pub timestamp_ms: u64,
    /// Angles of that frame
    pub trigger_angles: ExerciseAngles,
}

impl StateTransition {
    /// Whether the change leaves the top position
    #[must_use]
    pub fn leaves_top(&self) -> bool {
        self.previous_phase == ExercisePhase::Top
    }

    /// Whether the change arrives at the top position
    #[must_use]
    pub fn reaches_top(&self) -> bool {
        self.current_phase == ExercisePhase::Top
    }

    /// Whether the change arrives at the bottom position
    #[must_use]
    pub fn reaches_bottom(&self) -> bool {
        self.current_phase == ExercisePhase::Bottom
    }
}
