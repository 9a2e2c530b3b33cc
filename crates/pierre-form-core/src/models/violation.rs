// ABOUTME: Form violation types: rule kinds, severity grading and the per-frame diagnostic
// ABOUTME: Severity is graded by how far a measurement exceeds its tolerance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::view::CameraView;
use crate::constants::scoring::{HIGH_PENALTY, LOW_PENALTY, MEDIUM_PENALTY};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far outside tolerance a measurement fell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Within one grading unit beyond the limit
    Low,
    /// Within two grading units beyond the limit
    Medium,
    /// More than two grading units beyond the limit
    High,
}

impl Severity {
    /// Grade a deviation beyond a limit, measured in `unit`s
    ///
    /// Non-positive units degrade to `High` for any positive deviation.
    #[must_use]
    pub fn from_deviation(deviation: f64, unit: f64) -> Self {
        if unit <= 0.0 || !unit.is_finite() {
            return Self::High;
        }
        if deviation <= unit {
            Self::Low
        } else if deviation <= 2.0 * unit {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Weight compared against a mode's feedback sensitivity
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Low => 0.34,
            Self::Medium => 0.67,
            Self::High => 1.0,
        }
    }

    /// Points deducted from a rep's quality score
    #[must_use]
    pub const fn penalty(self) -> f64 {
        match self {
            Self::Low => LOW_PENALTY,
            Self::Medium => MEDIUM_PENALTY,
            Self::High => HIGH_PENALTY,
        }
    }
}

/// Biomechanical rule that produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Torso tilted too far from vertical
    ExcessiveForwardLean,
    /// Primary joint flexed past the safe depth
    ExcessiveDepth,
    /// Knee travels too far past the toes
    KneeOverToe,
    /// Left and right joints disagree
    AsymmetricStance,
    /// Hips sag or pike away from the shoulder-ankle line
    BodyLineBreak,
    /// Upper arm swings away from the torso
    UpperArmSwing,
}

impl ViolationKind {
    /// Camera orientation the rule needs to be trustworthy, if any
    #[must_use]
    pub const fn required_view(self) -> Option<CameraView> {
        match self {
            Self::ExcessiveForwardLean | Self::KneeOverToe | Self::BodyLineBreak => {
                Some(CameraView::OptimalSide)
            }
            Self::AsymmetricStance => Some(CameraView::OptimalFront),
            Self::ExcessiveDepth | Self::UpperArmSwing => None,
        }
    }

    /// Whether a verdict from this rule is trustworthy under `view`
    ///
    /// Only a conflicting optimal view rejects a rule; suboptimal views keep it.
    #[must_use]
    pub fn compatible_with(self, view: CameraView) -> bool {
        match (self.required_view(), view) {
            (_, CameraView::Unusable) => false,
            (Some(required), current) if current.is_optimal() => required == current,
            _ => true,
        }
    }

    /// Short label for summaries and visual cues
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExcessiveForwardLean => "forward lean",
            Self::ExcessiveDepth => "excessive depth",
            Self::KneeOverToe => "knee over toe",
            Self::AsymmetricStance => "asymmetry",
            Self::BodyLineBreak => "body line",
            Self::UpperArmSwing => "upper arm swing",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One rule breach detected in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormViolation {
    /// Rule that fired
    pub kind: ViolationKind,
    /// Graded severity
    pub severity: Severity,
    /// What went wrong
    pub description: String,
    /// How to fix it, in plain language
    pub correction_hint: String,
    /// Amount beyond the limit, in the rule's measurement unit
    pub deviation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_grading_boundaries() {
        assert_eq!(Severity::from_deviation(5.0, 5.0), Severity::Low);
        assert_eq!(Severity::from_deviation(9.9, 5.0), Severity::Medium);
        assert_eq!(Severity::from_deviation(10.1, 5.0), Severity::High);
        assert_eq!(Severity::from_deviation(1.0, 0.0), Severity::High);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_view_compatibility() {
        let lean = ViolationKind::ExcessiveForwardLean;
        assert!(lean.compatible_with(CameraView::OptimalSide));
        assert!(!lean.compatible_with(CameraView::OptimalFront));
        assert!(lean.compatible_with(CameraView::Suboptimal));
        assert!(!ViolationKind::ExcessiveDepth.compatible_with(CameraView::Unusable));
        assert!(ViolationKind::ExcessiveDepth.compatible_with(CameraView::OptimalFront));
    }
}
