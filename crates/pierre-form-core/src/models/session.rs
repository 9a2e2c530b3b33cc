// ABOUTME: Session record types: identifiers, persisted session data, summaries and trends
// ABOUTME: Records are created at session start, folded per rep and frozen at completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::exercise::{ExerciseMode, ExerciseType};
use super::violation::ViolationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Storage key: sessions are retained per user and exercise
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Owning user
    pub user_id: String,
    /// Exercise performed
    pub exercise: ExerciseType,
}

impl SessionKey {
    /// Build a key
    #[must_use]
    pub fn new(user_id: impl Into<String>, exercise: ExerciseType) -> Self {
        Self {
            user_id: user_id.into(),
            exercise,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.user_id, self.exercise)
    }
}

/// Lifecycle stage of a session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLifecycle {
    /// No reps recorded yet
    Created,
    /// Receiving rep updates
    Active,
    /// Finalized and persisted
    Completed,
}

/// Occurrences of one violation kind across a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCount {
    /// Rule kind
    pub kind: ViolationKind,
    /// Number of reps that carried it
    pub count: u32,
}

/// Improvement over the previous session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    /// Average rep quality of the most recent prior session
    pub previous_best: f64,
    /// Average rep quality of this session
    pub new_best: f64,
    /// `new_best - previous_best`
    pub improvement: f64,
}

/// One exercise session, persisted at completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSessionData {
    /// Session identifier
    pub id: SessionId,
    /// Owning user
    pub user_id: String,
    /// Exercise performed
    pub exercise_type: ExerciseType,
    /// Mode at session start
    pub mode: ExerciseMode,
    /// Wall-clock start
    pub start_time: DateTime<Utc>,
    /// Wall-clock completion
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and completion
    pub duration_seconds: Option<f64>,
    /// Completed reps
    pub total_reps: u32,
    /// Reps meeting the correctness threshold
    pub valid_reps: u32,
    /// Reps below the correctness threshold
    pub invalid_reps: u32,
    /// Mean of `rep_qualities`
    pub average_rep_quality: f64,
    /// Violation kinds aggregated by count
    pub form_violations: Vec<ViolationCount>,
    /// Per-rep 0-100 scores in completion order
    pub rep_qualities: Vec<f64>,
    /// Phase transitions observed
    pub state_transitions_count: u32,
    /// Mean seconds per rep over the whole session
    pub average_rep_duration: f64,
    /// Running mean of per-frame view confidence
    pub camera_view_quality: f64,
    /// Times the view degraded to an unreliable state
    pub repositioning_count: u32,
    /// Set when this session beat the previous one
    pub personal_best: Option<PersonalBest>,
    /// Frames folded into `camera_view_quality`
    #[serde(default)]
    pub view_samples: u32,
    /// Whether the most recent view sample was reliable
    #[serde(default = "default_view_reliable")]
    pub view_reliable: bool,
}

const fn default_view_reliable() -> bool {
    true
}

impl ExerciseSessionData {
    /// Fresh session with all counters at zero
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        exercise_type: ExerciseType,
        mode: ExerciseMode,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            exercise_type,
            mode,
            start_time,
            end_time: None,
            duration_seconds: None,
            total_reps: 0,
            valid_reps: 0,
            invalid_reps: 0,
            average_rep_quality: 0.0,
            form_violations: Vec::new(),
            rep_qualities: Vec::new(),
            state_transitions_count: 0,
            average_rep_duration: 0.0,
            camera_view_quality: 0.0,
            repositioning_count: 0,
            personal_best: None,
            view_samples: 0,
            view_reliable: true,
        }
    }

    /// Storage key for this session
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id.clone(), self.exercise_type)
    }

    /// Current lifecycle stage
    #[must_use]
    pub fn lifecycle(&self) -> SessionLifecycle {
        if self.end_time.is_some() {
            SessionLifecycle::Completed
        } else if self.total_reps == 0 && self.state_transitions_count == 0 {
            SessionLifecycle::Created
        } else {
            SessionLifecycle::Active
        }
    }

    /// Count recorded for a violation kind
    #[must_use]
    pub fn violation_count(&self, kind: ViolationKind) -> u32 {
        self.form_violations
            .iter()
            .find(|entry| entry.kind == kind)
            .map_or(0, |entry| entry.count)
    }
}

/// Direction of quality over the retained history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTrend {
    /// Newer sessions score notably higher
    Improving,
    /// No notable change
    Stable,
    /// Newer sessions score notably lower
    Declining,
}

/// Aggregate over a user's retained sessions for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Retained sessions
    pub total_sessions: usize,
    /// Reps across retained sessions
    pub total_reps: u64,
    /// Mean of per-session average quality
    pub average_quality: f64,
    /// Newer half against older half
    pub progress_trend: ProgressTrend,
    /// Percentage change from older half to newer half
    pub improvement_rate: f64,
    /// Most frequent violation kinds, most frequent first
    pub common_violations: Vec<ViolationCount>,
    /// Areas the user does well
    pub strength_areas: Vec<String>,
    /// Areas needing work
    pub weakness_areas: Vec<String>,
}

impl SessionSummary {
    /// Summary for a user with no retained sessions
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total_sessions: 0,
            total_reps: 0,
            average_quality: 0.0,
            progress_trend: ProgressTrend::Stable,
            improvement_rate: 0.0,
            common_violations: Vec::new(),
            strength_areas: Vec::new(),
            weakness_areas: Vec::new(),
        }
    }
}
