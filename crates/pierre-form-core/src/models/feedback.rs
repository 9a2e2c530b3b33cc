// ABOUTME: Feedback payload types handed to the audio/visual delivery collaborator
// ABOUTME: Priority levels, visual cues and host directives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::landmarks::LandmarkIndex;
use super::violation::Severity;
use serde::{Deserialize, Serialize};

/// Urgency of a feedback payload, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPriority {
    /// High-severity violation or unusable camera view
    Critical,
    /// Medium-severity violation
    Warning,
    /// Low-severity violation, suboptimal view or inactivity
    Advisory,
    /// Completed rep or milestone
    Encouragement,
    /// Nothing to report
    #[default]
    Neutral,
}

impl FeedbackPriority {
    /// Larger is more urgent
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::Warning => 3,
            Self::Advisory => 2,
            Self::Encouragement => 1,
            Self::Neutral => 0,
        }
    }

    /// Whether this priority should displace `other`
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        self.rank() > other.rank()
    }

    /// Priority for a violation of the given severity
    #[must_use]
    pub const fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::High => Self::Critical,
            Severity::Medium => Self::Warning,
            Severity::Low => Self::Advisory,
        }
    }
}

/// What a visual cue draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// Highlight the joints involved in a violation
    ViolationHighlight,
    /// Show the current phase
    PhaseIndicator,
    /// Celebrate a completed rep
    RepCelebration,
    /// Camera repositioning guide
    ViewGuide,
    /// Help or status panel
    StatusPanel,
}

/// One overlay element for the rendering collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualCue {
    /// Cue category
    pub kind: CueKind,
    /// Joints to highlight
    pub landmarks: Vec<LandmarkIndex>,
    /// Caption
    pub text: String,
    /// Severity of the underlying violation, if any
    pub severity: Option<Severity>,
    /// Rendering emphasis, 0.0 to 1.0
    pub weight: f64,
}

impl VisualCue {
    /// Cue without joint highlights
    #[must_use]
    pub fn caption(kind: CueKind, text: impl Into<String>, weight: f64) -> Self {
        Self {
            kind,
            landmarks: Vec::new(),
            text: text.into(),
            severity: None,
            weight,
        }
    }
}

/// Feedback for one frame or directive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    /// Messages for speech synthesis, most important first
    pub audio_messages: Vec<String>,
    /// Overlay elements
    pub visual_cues: Vec<VisualCue>,
    /// Urgency of the payload
    pub priority: FeedbackPriority,
}

impl FeedbackResponse {
    /// Whether the payload carries anything to deliver
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.audio_messages.is_empty() && self.visual_cues.is_empty()
    }
}

/// Host request answered outside the per-frame flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackDirective {
    /// Explain how to perform the exercise and position the camera
    Help,
    /// Report current phase and counts
    Status,
}
