// ABOUTME: Biomechanical form rules evaluated per frame for each exercise
// ABOUTME: Emits at most one graded violation per rule kind, skipping rules whose joints are hidden
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Form Analysis
//!
//! Rules compare a landmark relationship or an angle against the mode's
//! `FormTolerances` and grade the overshoot with `Severity::from_deviation`.
//! A rule whose landmarks are not visible is skipped, never reported.

use crate::angle_calculator::side_angle;
use crate::geometry::{included_angle, offset_below_line, tilt_from_vertical};
use pierre_form_core::config::ModeThresholds;
use pierre_form_core::constants::landmarks::{DEFAULT_MIN_VISIBILITY, MIN_SEGMENT_LENGTH};
use pierre_form_core::models::{
    AngleChannel, BodySide, ExerciseAngles, ExercisePhase, ExerciseType, FormViolation, Joint,
    PoseFrame, PoseLandmark, Severity, ViolationKind,
};

/// Stateless rule evaluator
#[derive(Debug, Clone)]
pub struct FormAnalyzer {
    min_visibility: f64,
}

impl Default for FormAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VISIBILITY)
    }
}

/// Landmarks of one body side, present only when all are visible
struct SideJoints<'a> {
    points: Vec<&'a PoseLandmark>,
}

impl FormAnalyzer {
    /// Create an analyzer with a visibility floor
    #[must_use]
    pub const fn new(min_visibility: f64) -> Self {
        Self { min_visibility }
    }

    /// Evaluate the exercise's monitored rules against one frame
    #[must_use]
    pub fn analyze(
        &self,
        frame: &PoseFrame,
        angles: &ExerciseAngles,
        exercise: ExerciseType,
        thresholds: &ModeThresholds,
        phase: ExercisePhase,
    ) -> Vec<FormViolation> {
        exercise
            .monitored_rules()
            .iter()
            .filter_map(|kind| match kind {
                ViolationKind::ExcessiveForwardLean => self.forward_lean(frame, thresholds),
                ViolationKind::ExcessiveDepth => {
                    excessive_depth(angles, exercise, thresholds, phase)
                }
                ViolationKind::KneeOverToe => self.knee_over_toe(frame, thresholds),
                ViolationKind::AsymmetricStance => self.asymmetry(frame, exercise, thresholds),
                ViolationKind::BodyLineBreak => self.body_line(frame, thresholds),
                ViolationKind::UpperArmSwing => self.upper_arm_swing(frame, thresholds),
            })
            .collect()
    }

    fn side<'a>(&self, frame: &'a PoseFrame, side: BodySide, joints: &[Joint]) -> Option<SideJoints<'a>> {
        let points = joints
            .iter()
            .map(|joint| frame.visible(side.landmark(*joint), self.min_visibility))
            .collect::<Option<Vec<_>>>()?;
        Some(SideJoints { points })
    }

    /// Per-side measurement over the visible sides, keeping the largest
    fn worst_side<F>(&self, frame: &PoseFrame, joints: &[Joint], measure: F) -> Option<f64>
    where
        F: Fn(&[&PoseLandmark]) -> Option<f64>,
    {
        BodySide::BOTH
            .iter()
            .filter_map(|side| self.side(frame, *side, joints))
            .filter_map(|side| measure(&side.points))
            .fold(None, |worst: Option<f64>, value| {
                Some(worst.map_or(value, |w| w.max(value)))
            })
    }

    fn forward_lean(&self, frame: &PoseFrame, thresholds: &ModeThresholds) -> Option<FormViolation> {
        let lean = self.worst_side(frame, &[Joint::Shoulder, Joint::Hip], |p| {
            Some(tilt_from_vertical(p[1], p[0]))
        })?;
        let limit = thresholds.form.max_torso_lean_deg;
        violation(
            ViolationKind::ExcessiveForwardLean,
            lean - limit,
            thresholds.form.severity_unit_deg,
            format!("Torso leaning {lean:.0} degrees forward (limit {limit:.0})"),
            "Keep your chest up and your back straight",
        )
    }

    fn knee_over_toe(&self, frame: &PoseFrame, thresholds: &ModeThresholds) -> Option<FormViolation> {
        let joints = [Joint::Knee, Joint::Ankle, Joint::Heel, Joint::FootIndex];
        let ratio = self.worst_side(frame, &joints, |p| {
            let (knee, ankle, heel, toe) = (p[0], p[1], p[2], p[3]);
            let facing = toe.x - heel.x;
            let shin = knee.planar_distance(ankle);
            if facing.abs() < MIN_SEGMENT_LENGTH || shin < MIN_SEGMENT_LENGTH {
                return None;
            }
            Some((knee.x - toe.x) * facing.signum() / shin)
        })?;
        let limit = thresholds.form.knee_over_toe_ratio;
        violation(
            ViolationKind::KneeOverToe,
            ratio - limit,
            limit,
            format!(
                "Knee travels {:.0}% of shin length past the toes",
                ratio.max(0.0) * 100.0
            ),
            "Sit your hips back so your knees stay over your feet",
        )
    }

    fn asymmetry(
        &self,
        frame: &PoseFrame,
        exercise: ExerciseType,
        thresholds: &ModeThresholds,
    ) -> Option<FormViolation> {
        let channel = match exercise.primary_channel() {
            AngleChannel::Elbow => AngleChannel::Elbow,
            _ => AngleChannel::Knee,
        };
        let left = side_angle(frame, BodySide::Left, channel, self.min_visibility).ok()?;
        let right = side_angle(frame, BodySide::Right, channel, self.min_visibility).ok()?;
        let difference = (left - right).abs();
        let limit = thresholds.form.asymmetry_deg;
        violation(
            ViolationKind::AsymmetricStance,
            difference - limit,
            thresholds.form.severity_unit_deg,
            format!("Left and right {channel} angles differ by {difference:.0} degrees"),
            "Move both sides evenly",
        )
    }

    fn body_line(&self, frame: &PoseFrame, thresholds: &ModeThresholds) -> Option<FormViolation> {
        let joints = [Joint::Shoulder, Joint::Hip, Joint::Ankle];
        let (straightness, sag) = BodySide::BOTH
            .iter()
            .filter_map(|side| self.side(frame, *side, &joints))
            .map(|side| {
                let (shoulder, hip, ankle) = (side.points[0], side.points[1], side.points[2]);
                (
                    included_angle(shoulder, hip, ankle),
                    offset_below_line(shoulder, ankle, hip),
                )
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))?;
        let limit = thresholds.form.body_line_deg;
        let description = match sag {
            Some(offset) if offset > 0.0 => "Hips sagging below the shoulder-ankle line",
            Some(_) => "Hips piking above the shoulder-ankle line",
            None => "Body is not in a straight line",
        };
        violation(
            ViolationKind::BodyLineBreak,
            limit - straightness,
            thresholds.form.severity_unit_deg,
            format!("{description} ({straightness:.0} degrees)"),
            "Squeeze your glutes and keep your body in one straight line",
        )
    }

    fn upper_arm_swing(&self, frame: &PoseFrame, thresholds: &ModeThresholds) -> Option<FormViolation> {
        let swing = self.worst_side(frame, &[Joint::Hip, Joint::Shoulder, Joint::Elbow], |p| {
            Some(included_angle(p[0], p[1], p[2]))
        })?;
        let limit = thresholds.form.upper_arm_swing_deg;
        violation(
            ViolationKind::UpperArmSwing,
            swing - limit,
            thresholds.form.severity_unit_deg,
            format!("Upper arm swinging {swing:.0} degrees away from the torso"),
            "Pin your elbows to your sides",
        )
    }
}

fn excessive_depth(
    angles: &ExerciseAngles,
    exercise: ExerciseType,
    thresholds: &ModeThresholds,
    phase: ExercisePhase,
) -> Option<FormViolation> {
    if phase != ExercisePhase::Bottom {
        return None;
    }
    let channel = exercise.primary_channel();
    let band = thresholds.channel(channel)?;
    let angle = angles.channel(channel);
    let limit = 2.0f64.mul_add(-band.warning_tolerance, band.bottom_boundary);
    violation(
        ViolationKind::ExcessiveDepth,
        limit - angle,
        band.warning_tolerance,
        format!("{channel} angle {angle:.0} degrees is deeper than the safe {limit:.0}"),
        "Control the descent and stop a little higher",
    )
}

fn violation(
    kind: ViolationKind,
    deviation: f64,
    unit: f64,
    description: String,
    correction_hint: &str,
) -> Option<FormViolation> {
    (deviation.is_finite() && deviation > 0.0).then(|| FormViolation {
        kind,
        severity: Severity::from_deviation(deviation, unit),
        description,
        correction_hint: correction_hint.to_owned(),
        deviation,
    })
}
