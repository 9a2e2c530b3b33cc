// ABOUTME: Camera view assessment from torso landmark asymmetry and visibility
// ABOUTME: Classifies front/side/suboptimal/unusable views and suggests repositioning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::geometry::pair_yaw;
use pierre_form_core::constants::landmarks::DEFAULT_MIN_VISIBILITY;
use pierre_form_core::constants::view::{
    FRAME_MARGIN, FRONT_VIEW_MAX_YAW_DEG, LOW_LIGHT_VISIBILITY, NON_PREFERRED_VIEW_FACTOR,
    OCCLUDED_SIDE_YAW_DEG, SIDE_VIEW_MIN_YAW_DEG, SUBOPTIMAL_VIEW_FACTOR,
};
use pierre_form_core::models::{
    CameraView, ExerciseType, LandmarkIndex, PoseFrame, ViewAnalysis, ViewRecommendation,
};

const TORSO: [LandmarkIndex; 4] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
];

const BODY: [LandmarkIndex; 12] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftElbow,
    LandmarkIndex::RightElbow,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
];

/// Stateless camera view analyzer
#[derive(Debug, Clone)]
pub struct CameraViewAnalyzer {
    min_visibility: f64,
}

impl Default for CameraViewAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VISIBILITY)
    }
}

impl CameraViewAnalyzer {
    /// Create an analyzer with a visibility floor
    #[must_use]
    pub const fn new(min_visibility: f64) -> Self {
        Self { min_visibility }
    }

    /// Body yaw in degrees, averaged over the shoulder and hip pairs
    ///
    /// Falls back to a side-on estimate when only one side of the torso is
    /// visible, and `None` when no shoulder or no hip can be seen.
    #[must_use]
    pub fn estimate_yaw(&self, frame: &PoseFrame) -> Option<f64> {
        let floor = self.min_visibility;
        let pairs = [
            (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
            (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
        ];
        let yaws: Vec<f64> = pairs
            .iter()
            .filter_map(|(left, right)| {
                Some(pair_yaw(frame.visible(*left, floor)?, frame.visible(*right, floor)?))
            })
            .collect();
        if !yaws.is_empty() {
            return Some(yaws.iter().sum::<f64>() / yaws.len() as f64);
        }
        let any_visible = |indices: [LandmarkIndex; 2]| {
            indices
                .iter()
                .any(|index| frame.visible(*index, floor).is_some())
        };
        let shoulder = any_visible([LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder]);
        let hip = any_visible([LandmarkIndex::LeftHip, LandmarkIndex::RightHip]);
        (shoulder && hip).then_some(OCCLUDED_SIDE_YAW_DEG)
    }

    /// Classify the view and score trust in this frame's verdicts
    #[must_use]
    pub fn analyze(&self, frame: &PoseFrame, exercise: ExerciseType) -> ViewAnalysis {
        let Some(yaw) = self.estimate_yaw(frame) else {
            return ViewAnalysis::unusable(vec![
                ViewRecommendation::StepBackIntoFrame,
                ViewRecommendation::ImproveLighting,
            ]);
        };

        let view = classify(yaw);
        let preferred = exercise.preferred_view();
        let match_factor = if view == preferred {
            1.0
        } else if view.is_optimal() {
            NON_PREFERRED_VIEW_FACTOR
        } else {
            SUBOPTIMAL_VIEW_FACTOR
        };
        let torso_visibility = frame.mean_visibility(&TORSO);
        let confidence = (torso_visibility * match_factor).clamp(0.0, 1.0);

        let mut recommendations = Vec::new();
        if view != preferred {
            recommendations.push(match preferred {
                CameraView::OptimalFront => ViewRecommendation::FaceCamera,
                _ => ViewRecommendation::TurnSideways,
            });
        }
        if self.body_clipped(frame) {
            recommendations.push(ViewRecommendation::StepBackIntoFrame);
        }
        if frame.mean_visibility(&BODY) < LOW_LIGHT_VISIBILITY {
            recommendations.push(ViewRecommendation::ImproveLighting);
        }

        ViewAnalysis {
            view,
            offset_angle: yaw,
            confidence,
            recommendations,
        }
    }

    fn body_clipped(&self, frame: &PoseFrame) -> bool {
        let inside = FRAME_MARGIN..=(1.0 - FRAME_MARGIN);
        BODY.iter().any(|index| match frame.get(*index) {
            Some(lm) if lm.is_finite() && lm.visibility > 0.0 => {
                !inside.contains(&lm.x) || !inside.contains(&lm.y)
            }
            Some(_) => false,
            None => true,
        })
    }
}

fn classify(yaw: f64) -> CameraView {
    if yaw <= FRONT_VIEW_MAX_YAW_DEG {
        CameraView::OptimalFront
    } else if yaw >= SIDE_VIEW_MIN_YAW_DEG {
        CameraView::OptimalSide
    } else {
        CameraView::Suboptimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::constants::landmarks::LANDMARK_COUNT;
    use pierre_form_core::models::PoseLandmark;

    fn frame_with_torso(shoulder_dx: f64, shoulder_dz: f64, visibility: f64) -> PoseFrame {
        let mut landmarks = vec![PoseLandmark::new(0.5, 0.5, 0.0, visibility); LANDMARK_COUNT];
        let half_x = shoulder_dx / 2.0;
        let half_z = shoulder_dz / 2.0;
        landmarks[LandmarkIndex::LeftShoulder.as_usize()] =
            PoseLandmark::new(0.5 + half_x, 0.3, -half_z, visibility);
        landmarks[LandmarkIndex::RightShoulder.as_usize()] =
            PoseLandmark::new(0.5 - half_x, 0.3, half_z, visibility);
        landmarks[LandmarkIndex::LeftHip.as_usize()] =
            PoseLandmark::new(0.5 + half_x, 0.55, -half_z, visibility);
        landmarks[LandmarkIndex::RightHip.as_usize()] =
            PoseLandmark::new(0.5 - half_x, 0.55, half_z, visibility);
        PoseFrame::new(0, landmarks)
    }

    #[test]
    fn test_front_view_for_curl_is_optimal() {
        let analysis = CameraViewAnalyzer::default()
            .analyze(&frame_with_torso(0.2, 0.0, 0.9), ExerciseType::BicepCurl);
        assert_eq!(analysis.view, CameraView::OptimalFront);
        assert!((analysis.confidence - 0.9).abs() < 1e-9);
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.is_reliable());
    }

    #[test]
    fn test_front_view_for_squat_asks_to_turn() {
        let analysis = CameraViewAnalyzer::default()
            .analyze(&frame_with_torso(0.2, 0.0, 0.9), ExerciseType::Squat);
        assert_eq!(analysis.view, CameraView::OptimalFront);
        assert!(analysis
            .recommendations
            .contains(&ViewRecommendation::TurnSideways));
        assert!(analysis.confidence < 0.9);
    }

    #[test]
    fn test_diagonal_view_is_suboptimal() {
        let analysis = CameraViewAnalyzer::default()
            .analyze(&frame_with_torso(0.1, 0.1, 0.9), ExerciseType::Squat);
        assert_eq!(analysis.view, CameraView::Suboptimal);
        assert!((analysis.offset_angle - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_side_view_from_depth() {
        let analysis = CameraViewAnalyzer::default()
            .analyze(&frame_with_torso(0.0, 0.2, 0.9), ExerciseType::Squat);
        assert_eq!(analysis.view, CameraView::OptimalSide);
        assert!((analysis.offset_angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_torso_is_unusable() {
        let analysis = CameraViewAnalyzer::default()
            .analyze(&frame_with_torso(0.2, 0.0, 0.1), ExerciseType::Squat);
        assert_eq!(analysis.view, CameraView::Unusable);
        assert!(!analysis.is_reliable());
        assert!(analysis.needs_repositioning());
    }

    #[test]
    fn test_clipped_body_asks_to_step_back() {
        let mut frame = frame_with_torso(0.2, 0.0, 0.9);
        frame.landmarks[LandmarkIndex::LeftAnkle.as_usize()].y = 1.05;
        let analysis = CameraViewAnalyzer::default().analyze(&frame, ExerciseType::BicepCurl);
        assert!(analysis
            .recommendations
            .contains(&ViewRecommendation::StepBackIntoFrame));
    }
}
