// ABOUTME: Exercise catalog types: exercise kinds, analysis modes, angle channels
// ABOUTME: Each exercise declares its primary channel, preferred view and monitored rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::view::CameraView;
use super::violation::ViolationKind;
use crate::constants::landmarks::STRAIGHT_JOINT_DEGREES;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis strictness profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseMode {
    /// Wider bands, fewer and simpler messages
    Beginner,
    /// Tighter bands, technical language, shorter inactivity timeout
    Pro,
}

impl ExerciseMode {
    /// Both modes
    pub const ALL: [Self; 2] = [Self::Beginner, Self::Pro];
}

impl fmt::Display for ExerciseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => f.write_str("beginner"),
            Self::Pro => f.write_str("pro"),
        }
    }
}

/// Joint angle channel measured per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleChannel {
    /// Hip-knee-ankle
    Knee,
    /// Shoulder-hip-knee
    Hip,
    /// Knee-ankle-toe
    Ankle,
    /// Shoulder-elbow-wrist
    Elbow,
}

impl fmt::Display for AngleChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Knee => f.write_str("knee"),
            Self::Hip => f.write_str("hip"),
            Self::Ankle => f.write_str("ankle"),
            Self::Elbow => f.write_str("elbow"),
        }
    }
}

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    /// Bodyweight or barbell squat
    Squat,
    /// Push-up
    Pushup,
    /// Front plank hold
    Plank,
    /// Forward lunge
    Lunge,
    /// Dumbbell bicep curl
    BicepCurl,
}

impl ExerciseType {
    /// Every supported exercise
    pub const ALL: [Self; 5] = [
        Self::Squat,
        Self::Pushup,
        Self::Plank,
        Self::Lunge,
        Self::BicepCurl,
    ];

    /// Channel that drives phase detection
    #[must_use]
    pub const fn primary_channel(self) -> AngleChannel {
        match self {
            Self::Squat | Self::Lunge => AngleChannel::Knee,
            Self::Pushup | Self::BicepCurl => AngleChannel::Elbow,
            Self::Plank => AngleChannel::Hip,
        }
    }

    /// Channels that must be measurable for a frame to be analyzed
    #[must_use]
    pub const fn required_channels(self) -> &'static [AngleChannel] {
        match self {
            Self::Squat | Self::Lunge => &[AngleChannel::Knee, AngleChannel::Hip],
            Self::Pushup => &[AngleChannel::Elbow, AngleChannel::Hip],
            Self::BicepCurl => &[AngleChannel::Elbow],
            Self::Plank => &[AngleChannel::Hip],
        }
    }

    /// Camera orientation that shows this exercise best
    #[must_use]
    pub const fn preferred_view(self) -> CameraView {
        match self {
            Self::BicepCurl => CameraView::OptimalFront,
            Self::Squat | Self::Pushup | Self::Plank | Self::Lunge => CameraView::OptimalSide,
        }
    }

    /// Form rules evaluated for this exercise
    #[must_use]
    pub const fn monitored_rules(self) -> &'static [ViolationKind] {
        match self {
            Self::Squat => &[
                ViolationKind::ExcessiveForwardLean,
                ViolationKind::ExcessiveDepth,
                ViolationKind::KneeOverToe,
                ViolationKind::AsymmetricStance,
            ],
            Self::Lunge => &[
                ViolationKind::ExcessiveForwardLean,
                ViolationKind::KneeOverToe,
            ],
            Self::Pushup => &[
                ViolationKind::BodyLineBreak,
                ViolationKind::AsymmetricStance,
                ViolationKind::ExcessiveDepth,
            ],
            Self::Plank => &[ViolationKind::BodyLineBreak],
            Self::BicepCurl => &[
                ViolationKind::UpperArmSwing,
                ViolationKind::AsymmetricStance,
            ],
        }
    }

    /// Whether a Top-Bottom-Top cycle closes a repetition (plank is a hold)
    #[must_use]
    pub const fn counts_reps(self) -> bool {
        !matches!(self, Self::Plank)
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Squat => "squat",
            Self::Pushup => "push-up",
            Self::Plank => "plank",
            Self::Lunge => "lunge",
            Self::BicepCurl => "bicep curl",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Joint angles derived from a single frame, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAngles {
    /// Hip-knee-ankle included angle
    pub knee_angle: f64,
    /// Shoulder-hip-knee included angle
    pub hip_angle: f64,
    /// Knee-ankle-toe included angle
    pub ankle_angle: f64,
    /// Shoulder-elbow-wrist included angle
    pub elbow_angle: f64,
    /// Camera-to-body yaw; 0 faces the camera, 90 is side-on
    pub offset_angle: f64,
}

impl ExerciseAngles {
    /// Every movement channel straight, camera facing the body
    #[must_use]
    pub const fn straight() -> Self {
        Self {
            knee_angle: STRAIGHT_JOINT_DEGREES,
            hip_angle: STRAIGHT_JOINT_DEGREES,
            ankle_angle: STRAIGHT_JOINT_DEGREES,
            elbow_angle: STRAIGHT_JOINT_DEGREES,
            offset_angle: 0.0,
        }
    }

    /// Value of one channel
    #[must_use]
    pub const fn channel(&self, channel: AngleChannel) -> f64 {
        match channel {
            AngleChannel::Knee => self.knee_angle,
            AngleChannel::Hip => self.hip_angle,
            AngleChannel::Ankle => self.ankle_angle,
            AngleChannel::Elbow => self.elbow_angle,
        }
    }

    /// Overwrite one channel
    pub fn set_channel(&mut self, channel: AngleChannel, degrees: f64) {
        match channel {
            AngleChannel::Knee => self.knee_angle = degrees,
            AngleChannel::Hip => self.hip_angle = degrees,
            AngleChannel::Ankle => self.ankle_angle = degrees,
            AngleChannel::Elbow => self.elbow_angle = degrees,
        }
    }
}

impl Default for ExerciseAngles {
    fn default() -> Self {
        Self::straight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_channel_is_always_required() {
        for exercise in ExerciseType::ALL {
            assert!(exercise
                .required_channels()
                .contains(&exercise.primary_channel()));
        }
    }

    #[test]
    fn test_only_plank_is_a_hold() {
        assert!(!ExerciseType::Plank.counts_reps());
        assert!(ExerciseType::Squat.counts_reps());
        assert!(ExerciseType::BicepCurl.counts_reps());
    }

    #[test]
    fn test_channel_accessors_round_trip() {
        let mut angles = ExerciseAngles::straight();
        angles.set_channel(AngleChannel::Elbow, 42.0);
        assert!((angles.channel(AngleChannel::Elbow) - 42.0).abs() < f64::EPSILON);
        assert!((angles.knee_angle - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exercise_serializes_snake_case() {
        let json = serde_json::to_string(&ExerciseType::BicepCurl).unwrap();
        assert_eq!(json, "\"bicep_curl\"");
    }
}
