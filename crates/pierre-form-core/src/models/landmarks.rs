// ABOUTME: Pose landmark frame model using the 33-slot BlazePose topology
// ABOUTME: Positional semantics: the slot index is the joint identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::LandmarkError;
use serde::{Deserialize, Serialize};

/// A single tracked body-joint point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmark {
    /// Horizontal position, 0.0 (left edge) to 1.0 (right edge)
    pub x: f64,
    /// Vertical position, 0.0 (top edge) to 1.0 (bottom edge)
    pub y: f64,
    /// Depth relative to the hips, same scale as `x`; smaller is closer to the camera
    pub z: f64,
    /// Detection confidence, 0.0 to 1.0
    pub visibility: f64,
}

impl PoseLandmark {
    /// Create a landmark
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// A landmark the detector did not see at all
    #[must_use]
    pub const fn hidden() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Whether every coordinate is a finite number
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance in the image plane
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// `BlazePose` landmark slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum LandmarkIndex {
    /// Nose
    Nose = 0,
    /// Left eye (inner)
    LeftEyeInner = 1,
    /// Left eye
    LeftEye = 2,
    /// Left eye (outer)
    LeftEyeOuter = 3,
    /// Right eye (inner)
    RightEyeInner = 4,
    /// Right eye
    RightEye = 5,
    /// Right eye (outer)
    RightEyeOuter = 6,
    /// Left ear
    LeftEar = 7,
    /// Right ear
    RightEar = 8,
    /// Mouth (left corner)
    MouthLeft = 9,
    /// Mouth (right corner)
    MouthRight = 10,
    /// Left shoulder
    LeftShoulder = 11,
    /// Right shoulder
    RightShoulder = 12,
    /// Left elbow
    LeftElbow = 13,
    /// Right elbow
    RightElbow = 14,
    /// Left wrist
    LeftWrist = 15,
    /// Right wrist
    RightWrist = 16,
    /// Left pinky knuckle
    LeftPinky = 17,
    /// Right pinky knuckle
    RightPinky = 18,
    /// Left index knuckle
    LeftIndex = 19,
    /// Right index knuckle
    RightIndex = 20,
    /// Left thumb
    LeftThumb = 21,
    /// Right thumb
    RightThumb = 22,
    /// Left hip
    LeftHip = 23,
    /// Right hip
    RightHip = 24,
    /// Left knee
    LeftKnee = 25,
    /// Right knee
    RightKnee = 26,
    /// Left ankle
    LeftAnkle = 27,
    /// Right ankle
    RightAnkle = 28,
    /// Left heel
    LeftHeel = 29,
    /// Right heel
    RightHeel = 30,
    /// Left foot index (toe)
    LeftFootIndex = 31,
    /// Right foot index (toe)
    RightFootIndex = 32,
}

impl LandmarkIndex {
    /// Slot position in a frame
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self as usize
    }
}

/// Joints that exist on both sides of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    /// Shoulder
    Shoulder,
    /// Elbow
    Elbow,
    /// Wrist
    Wrist,
    /// Hip
    Hip,
    /// Knee
    Knee,
    /// Ankle
    Ankle,
    /// Heel
    Heel,
    /// Toe
    FootIndex,
}

/// Body side used when selecting joint triplets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodySide {
    /// Subject's left
    Left,
    /// Subject's right
    Right,
}

impl BodySide {
    /// Both sides, left first
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// Landmark slot for a joint on this side
    #[must_use]
    pub const fn landmark(self, joint: Joint) -> LandmarkIndex {
        match (self, joint) {
            (Self::Left, Joint::Shoulder) => LandmarkIndex::LeftShoulder,
            (Self::Right, Joint::Shoulder) => LandmarkIndex::RightShoulder,
            (Self::Left, Joint::Elbow) => LandmarkIndex::LeftElbow,
            (Self::Right, Joint::Elbow) => LandmarkIndex::RightElbow,
            (Self::Left, Joint::Wrist) => LandmarkIndex::LeftWrist,
            (Self::Right, Joint::Wrist) => LandmarkIndex::RightWrist,
            (Self::Left, Joint::Hip) => LandmarkIndex::LeftHip,
            (Self::Right, Joint::Hip) => LandmarkIndex::RightHip,
            (Self::Left, Joint::Knee) => LandmarkIndex::LeftKnee,
            (Self::Right, Joint::Knee) => LandmarkIndex::RightKnee,
            (Self::Left, Joint::Ankle) => LandmarkIndex::LeftAnkle,
            (Self::Right, Joint::Ankle) => LandmarkIndex::RightAnkle,
            (Self::Left, Joint::Heel) => LandmarkIndex::LeftHeel,
            (Self::Right, Joint::Heel) => LandmarkIndex::RightHeel,
            (Self::Left, Joint::FootIndex) => LandmarkIndex::LeftFootIndex,
            (Self::Right, Joint::FootIndex) => LandmarkIndex::RightFootIndex,
        }
    }
}

/// One frame of landmarks from the external pose estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Monotonic capture timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Landmark slots, normally `LANDMARK_COUNT` long
    pub landmarks: Vec<PoseLandmark>,
}

impl PoseFrame {
    /// Create a frame
    #[must_use]
    pub const fn new(timestamp_ms: u64, landmarks: Vec<PoseLandmark>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    /// Landmark at a slot, if the frame carries it
    #[must_use]
    pub fn get(&self, index: LandmarkIndex) -> Option<&PoseLandmark> {
        self.landmarks.get(index.as_usize())
    }

    /// Landmark at a slot if present, finite and at least `floor` visible
    #[must_use]
    pub fn visible(&self, index: LandmarkIndex, floor: f64) -> Option<&PoseLandmark> {
        self.get(index)
            .filter(|lm| lm.is_finite() && lm.visibility >= floor)
    }

    /// Landmark at a slot, or the reason it cannot be used
    ///
    /// # Errors
    ///
    /// Returns `LandmarkError` if the slot is absent, non-finite or below `floor`
    pub fn require(&self, index: LandmarkIndex, floor: f64) -> Result<&PoseLandmark, LandmarkError> {
        let landmark = self.get(index).ok_or(LandmarkError::Missing {
            index,
            available: self.landmarks.len(),
        })?;
        if !landmark.is_finite() {
            return Err(LandmarkError::NonFinite { index });
        }
        if landmark.visibility < floor {
            return Err(LandmarkError::LowVisibility {
                index,
                visibility: landmark.visibility,
                floor,
            });
        }
        Ok(landmark)
    }

    /// Mean visibility over a set of slots; absent slots count as zero
    #[must_use]
    pub fn mean_visibility(&self, indices: &[LandmarkIndex]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let total: f64 = indices
            .iter()
            .map(|index| {
                self.get(*index)
                    .filter(|lm| lm.is_finite())
                    .map_or(0.0, |lm| lm.visibility.clamp(0.0, 1.0))
            })
            .sum();
        total / indices.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::landmarks::LANDMARK_COUNT;

    fn frame_with(index: LandmarkIndex, landmark: PoseLandmark) -> PoseFrame {
        let mut landmarks = vec![PoseLandmark::new(0.5, 0.5, 0.0, 0.9); LANDMARK_COUNT];
        landmarks[index.as_usize()] = landmark;
        PoseFrame::new(0, landmarks)
    }

    #[test]
    fn test_require_reports_low_visibility() {
        let frame = frame_with(
            LandmarkIndex::LeftKnee,
            PoseLandmark::new(0.5, 0.6, 0.0, 0.2),
        );
        let err = frame.require(LandmarkIndex::LeftKnee, 0.5).unwrap_err();
        assert_eq!(err.index(), LandmarkIndex::LeftKnee);
        assert!(matches!(err, LandmarkError::LowVisibility { .. }));
    }

    #[test]
    fn test_require_reports_missing_slot() {
        let frame = PoseFrame::new(0, vec![PoseLandmark::hidden(); 12]);
        let err = frame.require(LandmarkIndex::RightAnkle, 0.5).unwrap_err();
        assert!(matches!(err, LandmarkError::Missing { available: 12, .. }));
    }

    #[test]
    fn test_require_rejects_nan() {
        let frame = frame_with(
            LandmarkIndex::LeftHip,
            PoseLandmark::new(f64::NAN, 0.5, 0.0, 1.0),
        );
        assert!(matches!(
            frame.require(LandmarkIndex::LeftHip, 0.5),
            Err(LandmarkError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_side_mapping_matches_blazepose_slots() {
        assert_eq!(BodySide::Left.landmark(Joint::Knee).as_usize(), 25);
        assert_eq!(BodySide::Right.landmark(Joint::FootIndex).as_usize(), 32);
    }
}
