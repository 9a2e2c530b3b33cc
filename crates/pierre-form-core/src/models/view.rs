// ABOUTME: Camera view assessment types produced once per frame
// ABOUTME: View class, confidence and repositioning recommendations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::view::RELIABLE_CONFIDENCE;
use serde::{Deserialize, Serialize};

/// Camera orientation relative to the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraView {
    /// Body faces the camera
    OptimalFront,
    /// Body is side-on to the camera
    OptimalSide,
    /// Diagonal orientation; verdicts degrade
    Suboptimal,
    /// Torso not trackable this frame
    Unusable,
}

impl CameraView {
    /// Whether this is one of the two optimal orientations
    #[must_use]
    pub const fn is_optimal(self) -> bool {
        matches!(self, Self::OptimalFront | Self::OptimalSide)
    }
}

/// Suggested change to the camera setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewRecommendation {
    /// Rotate to face the camera
    FaceCamera,
    /// Rotate to show a side profile
    TurnSideways,
    /// Body is clipped by the frame edge
    StepBackIntoFrame,
    /// Landmarks are detected with low confidence
    ImproveLighting,
}

impl ViewRecommendation {
    /// Message shown or spoken to the user
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FaceCamera => "Turn to face the camera",
            Self::TurnSideways => "Turn sideways so the camera sees your profile",
            Self::StepBackIntoFrame => "Step back so your whole body is in frame",
            Self::ImproveLighting => "Improve the lighting so your joints are easier to see",
        }
    }
}

/// Result of the per-frame camera view assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewAnalysis {
    /// Classified orientation
    pub view: CameraView,
    /// Estimated body yaw in degrees (0 front, 90 side)
    pub offset_angle: f64,
    /// 0.0 to 1.0 trust in this frame's verdicts
    pub confidence: f64,
    /// Repositioning suggestions, empty when the setup is fine
    pub recommendations: Vec<ViewRecommendation>,
}

impl ViewAnalysis {
    /// Assessment for a frame whose torso could not be tracked
    #[must_use]
    pub fn unusable(recommendations: Vec<ViewRecommendation>) -> Self {
        Self {
            view: CameraView::Unusable,
            offset_angle: 0.0,
            confidence: 0.0,
            recommendations,
        }
    }

    /// Whether phase and violation verdicts can be trusted this frame
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.view != CameraView::Unusable && self.confidence >= RELIABLE_CONFIDENCE
    }

    /// Whether the user should be asked to move
    #[must_use]
    pub fn needs_repositioning(&self) -> bool {
        !self.recommendations.is_empty()
    }
}
