// ABOUTME: Joint angle extraction from a landmark frame for a given exercise
// ABOUTME: Picks the better-visible body side per channel and fails only on required channels
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Angle Calculator
//!
//! Each channel is measured from a joint triplet:
//!
//! | Channel | Triplet |
//! |---|---|
//! | Knee | hip, knee, ankle |
//! | Hip | shoulder, hip, knee |
//! | Ankle | knee, ankle, toe |
//! | Elbow | shoulder, elbow, wrist |
//!
//! Channels the exercise requires must be measurable on at least one side.
//! Other channels fall back to a straight joint.

use crate::camera_view::CameraViewAnalyzer;
use crate::geometry::included_angle;
use pierre_form_core::constants::landmarks::{DEFAULT_MIN_VISIBILITY, STRAIGHT_JOINT_DEGREES};
use pierre_form_core::errors::LandmarkError;
use pierre_form_core::models::{
    AngleChannel, BodySide, ExerciseAngles, ExerciseType, Joint, PoseFrame,
};

const CHANNELS: [AngleChannel; 4] = [
    AngleChannel::Knee,
    AngleChannel::Hip,
    AngleChannel::Ankle,
    AngleChannel::Elbow,
];

/// Joints forming the triplet for a channel, vertex in the middle
#[must_use]
pub const fn triplet(channel: AngleChannel) -> [Joint; 3] {
    match channel {
        AngleChannel::Knee => [Joint::Hip, Joint::Knee, Joint::Ankle],
        AngleChannel::Hip => [Joint::Shoulder, Joint::Hip, Joint::Knee],
        AngleChannel::Ankle => [Joint::Knee, Joint::Ankle, Joint::FootIndex],
        AngleChannel::Elbow => [Joint::Shoulder, Joint::Elbow, Joint::Wrist],
    }
}

/// Angle of one channel on one body side
///
/// # Errors
///
/// Returns `LandmarkError` if any triplet joint is missing, non-finite or below `floor`
pub fn side_angle(
    frame: &PoseFrame,
    side: BodySide,
    channel: AngleChannel,
    floor: f64,
) -> Result<f64, LandmarkError> {
    let [a, vertex, c] = triplet(channel);
    let a = frame.require(side.landmark(a), floor)?;
    let vertex = frame.require(side.landmark(vertex), floor)?;
    let c = frame.require(side.landmark(c), floor)?;
    Ok(included_angle(a, vertex, c))
}

/// Sides ordered by mean triplet visibility, better first
#[must_use]
pub fn sides_by_visibility(frame: &PoseFrame, channel: AngleChannel) -> [BodySide; 2] {
    let visibility = |side: BodySide| {
        let indices = triplet(channel).map(|joint| side.landmark(joint));
        frame.mean_visibility(&indices)
    };
    if visibility(BodySide::Right) > visibility(BodySide::Left) {
        [BodySide::Right, BodySide::Left]
    } else {
        [BodySide::Left, BodySide::Right]
    }
}

/// Stateless joint angle extractor
#[derive(Debug, Clone)]
pub struct AngleCalculator {
    min_visibility: f64,
    view: CameraViewAnalyzer,
}

impl Default for AngleCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VISIBILITY)
    }
}

impl AngleCalculator {
    /// Create a calculator with a visibility floor
    #[must_use]
    pub fn new(min_visibility: f64) -> Self {
        Self {
            min_visibility,
            view: CameraViewAnalyzer::new(min_visibility),
        }
    }

    /// Visibility floor in force
    #[must_use]
    pub const fn min_visibility(&self) -> f64 {
        self.min_visibility
    }

    /// Angle of one channel using the better-visible side, falling back to the other
    ///
    /// # Errors
    ///
    /// Returns the better side's `LandmarkError` when neither side is measurable
    pub fn channel_angle(&self, frame: &PoseFrame, channel: AngleChannel) -> Result<f64, LandmarkError> {
        let [preferred, fallback] = sides_by_visibility(frame, channel);
        side_angle(frame, preferred, channel, self.min_visibility)
            .or_else(|err| side_angle(frame, fallback, channel, self.min_visibility).map_err(|_| err))
    }

    /// All channels for a frame, plus the camera yaw as `offset_angle`
    ///
    /// # Errors
    ///
    /// Returns `LandmarkError` when a channel required by `exercise` cannot be measured
    pub fn calculate(
        &self,
        frame: &PoseFrame,
        exercise: ExerciseType,
    ) -> Result<ExerciseAngles, LandmarkError> {
        let required = exercise.required_channels();
        let mut angles = ExerciseAngles::straight();
        for channel in CHANNELS {
            match self.channel_angle(frame, channel) {
                Ok(degrees) => angles.set_channel(channel, degrees),
                Err(err) if required.contains(&channel) => return Err(err),
                Err(_) => angles.set_channel(channel, STRAIGHT_JOINT_DEGREES),
            }
        }
        angles.offset_angle = self.view.estimate_yaw(frame).unwrap_or(0.0);
        Ok(angles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::constants::landmarks::LANDMARK_COUNT;
    use pierre_form_core::models::{LandmarkIndex, PoseLandmark};

    fn standing_frame() -> PoseFrame {
        let mut landmarks = vec![PoseLandmark::new(0.5, 0.5, 0.0, 0.9); LANDMARK_COUNT];
        let mut set = |index: LandmarkIndex, x: f64, y: f64| {
            landmarks[index.as_usize()] = PoseLandmark::new(x, y, 0.0, 0.95);
        };
        for (shoulder, hip, knee, ankle, toe, elbow, wrist, dx) in [
            (
                LandmarkIndex::LeftShoulder,
                LandmarkIndex::LeftHip,
                LandmarkIndex::LeftKnee,
                LandmarkIndex::LeftAnkle,
                LandmarkIndex::LeftFootIndex,
                LandmarkIndex::LeftElbow,
                LandmarkIndex::LeftWrist,
                0.05,
            ),
            (
                LandmarkIndex::RightShoulder,
                LandmarkIndex::RightHip,
                LandmarkIndex::RightKnee,
                LandmarkIndex::RightAnkle,
                LandmarkIndex::RightFootIndex,
                LandmarkIndex::RightElbow,
                LandmarkIndex::RightWrist,
                -0.05,
            ),
        ] {
            set(shoulder, 0.5 + dx, 0.2);
            set(elbow, 0.5 + dx, 0.35);
            set(wrist, 0.5 + dx, 0.5);
            set(hip, 0.5 + dx, 0.5);
            set(knee, 0.5 + dx, 0.7);
            set(ankle, 0.5 + dx, 0.9);
            set(toe, 0.6 + dx, 0.9);
        }
        PoseFrame::new(0, landmarks)
    }

    #[test]
    fn test_standing_knee_is_straight() {
        let angles = AngleCalculator::default()
            .calculate(&standing_frame(), ExerciseType::Squat)
            .unwrap();
        assert!((angles.knee_angle - 180.0).abs() < 1e-6);
        assert!((angles.hip_angle - 180.0).abs() < 1e-6);
        assert!((angles.ankle_angle - 90.0).abs() < 1e-6);
        assert!(angles.offset_angle.abs() < 1e-6);
    }

    #[test]
    fn test_required_channel_fails_when_both_sides_hidden() {
        let mut frame = standing_frame();
        frame.landmarks[LandmarkIndex::LeftKnee.as_usize()].visibility = 0.1;
        frame.landmarks[LandmarkIndex::RightKnee.as_usize()].visibility = 0.2;
        let err = AngleCalculator::default()
            .calculate(&frame, ExerciseType::Squat)
            .unwrap_err();
        assert!(matches!(err, LandmarkError::LowVisibility { .. }));
    }

    #[test]
    fn test_falls_back_to_other_side() {
        let mut frame = standing_frame();
        frame.landmarks[LandmarkIndex::LeftKnee.as_usize()].visibility = 0.1;
        let angles = AngleCalculator::default()
            .calculate(&frame, ExerciseType::Squat)
            .unwrap();
        assert!((angles.knee_angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_unrequired_channel_defaults_to_straight() {
        let mut frame = standing_frame();
        for index in [LandmarkIndex::LeftWrist, LandmarkIndex::RightWrist] {
            frame.landmarks[index.as_usize()].visibility = 0.0;
        }
        let angles = AngleCalculator::default()
            .calculate(&frame, ExerciseType::Squat)
            .unwrap();
        assert!((angles.elbow_angle - 180.0).abs() < f64::EPSILON);
        assert!(AngleCalculator::default()
            .calculate(&frame, ExerciseType::BicepCurl)
            .is_err());
    }

    #[test]
    fn test_truncated_frame_reports_missing() {
        let frame = PoseFrame::new(0, vec![PoseLandmark::hidden(); 20]);
        let err = AngleCalculator::default()
            .calculate(&frame, ExerciseType::Squat)
            .unwrap_err();
        assert!(matches!(err, LandmarkError::Missing { .. } | LandmarkError::LowVisibility { .. }));
    }
}
