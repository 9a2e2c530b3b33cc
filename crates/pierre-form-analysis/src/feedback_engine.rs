// ABOUTME: Prioritized, mode-aware feedback generation from violations, view, phase and rep results
// ABOUTME: Only the top priority level speaks; every violation still produces a visual cue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Adaptive Feedback Engine
//!
//! Priority order, most urgent first:
//!
//! 1. **Critical**: high-severity violation or unusable camera view
//! 2. **Warning**: medium-severity violation
//! 3. **Advisory**: low-severity violation, repositioning, inactivity, form warnings
//! 4. **Encouragement**: completed reps and milestones
//! 5. **Neutral**: nothing to report
//!
//! Audio comes only from the top level present, capped per mode. A violation
//! produces audio only when its severity weight meets the mode's feedback
//! sensitivity.

use pierre_form_core::constants::feedback::{
    BEGINNER_MAX_AUDIO, MILESTONE_EVERY, MILESTONE_REPS, PRO_MAX_AUDIO,
};
use pierre_form_core::models::{
    AngleChannel, BodySide, CameraView, CueKind, ExerciseMode, ExercisePhase, ExerciseType,
    FeedbackDirective, FeedbackPriority, FeedbackResponse, FormViolation, Joint, LandmarkIndex,
    RepCountResult, RepCounts, ViewAnalysis, ViolationKind, VisualCue,
};
use serde::{Deserialize, Serialize};

const PHASE_CUE_WEIGHT: f64 = 0.2;
const VIEW_CUE_WEIGHT: f64 = 0.5;

/// Everything the engine may react to for one frame
#[derive(Debug, Clone, Copy)]
pub struct FeedbackContext<'a> {
    /// Exercise being performed
    pub exercise: ExerciseType,
    /// Active mode
    pub mode: ExerciseMode,
    /// Current phase
    pub phase: ExercisePhase,
    /// Violations surviving the view filter
    pub violations: &'a [FormViolation],
    /// View assessment, absent when the frame was skipped
    pub view: Option<&'a ViewAnalysis>,
    /// Rep counter output for the frame
    pub rep_result: Option<&'a RepCountResult>,
    /// Totals after this frame
    pub counts: RepCounts,
    /// Minimum severity weight for spoken violations
    pub feedback_sensitivity: f64,
}

impl<'a> FeedbackContext<'a> {
    /// Context with no per-frame inputs
    #[must_use]
    pub const fn new(
        exercise: ExerciseType,
        mode: ExerciseMode,
        counts: RepCounts,
        feedback_sensitivity: f64,
    ) -> Self {
        Self {
            exercise,
            mode,
            phase: ExercisePhase::Top,
            violations: &[],
            view: None,
            rep_result: None,
            counts,
            feedback_sensitivity,
        }
    }

    /// Attach the frame's phase, violations, view and rep result
    #[must_use]
    pub fn with_frame(
        mut self,
        phase: ExercisePhase,
        violations: &'a [FormViolation],
        view: Option<&'a ViewAnalysis>,
        rep_result: Option<&'a RepCountResult>,
    ) -> Self {
        self.phase = phase;
        self.violations = violations;
        self.view = view;
        self.rep_result = rep_result;
        self
    }
}

/// Audio caps per mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEngineConfig {
    /// Spoken messages per response in beginner mode
    pub beginner_max_audio: usize,
    /// Spoken messages per response in pro mode
    pub pro_max_audio: usize,
}

impl Default for FeedbackEngineConfig {
    fn default() -> Self {
        Self {
            beginner_max_audio: BEGINNER_MAX_AUDIO,
            pro_max_audio: PRO_MAX_AUDIO,
        }
    }
}

struct Candidate {
    priority: FeedbackPriority,
    audio: Option<String>,
}

/// Stateless feedback generator
#[derive(Debug, Clone, Default)]
pub struct FeedbackEngine {
    config: FeedbackEngineConfig,
}

impl FeedbackEngine {
    /// Create an engine with custom audio caps
    #[must_use]
    pub const fn new(config: FeedbackEngineConfig) -> Self {
        Self { config }
    }

    const fn max_audio(&self, mode: ExerciseMode) -> usize {
        match mode {
            ExerciseMode::Beginner => self.config.beginner_max_audio,
            ExerciseMode::Pro => self.config.pro_max_audio,
        }
    }

    /// Build the feedback payload for one frame; never fails
    #[must_use]
    pub fn generate(&self, ctx: &FeedbackContext<'_>) -> FeedbackResponse {
        let mut candidates = Vec::new();
        let mut cues = Vec::new();

        if let Some(view) = ctx.view {
            view_feedback(view, &mut candidates, &mut cues);
        }

        let mut ordered: Vec<&FormViolation> = ctx.violations.iter().collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));
        for violation in ordered {
            cues.push(violation_cue(violation, ctx.exercise));
            let audible = violation.severity.weight() >= ctx.feedback_sensitivity;
            candidates.push(Candidate {
                priority: FeedbackPriority::for_severity(violation.severity),
                audio: audible.then(|| spoken_hint(violation, ctx.mode)),
            });
        }

        if let Some(rep) = ctx.rep_result {
            rep_feedback(rep, ctx, &mut candidates, &mut cues);
        }

        cues.push(VisualCue::caption(
            CueKind::PhaseIndicator,
            ctx.phase.to_string(),
            PHASE_CUE_WEIGHT,
        ));

        let priority = candidates
            .iter()
            .map(|candidate| candidate.priority)
            .max_by_key(|priority| priority.rank())
            .unwrap_or(FeedbackPriority::Neutral);
        let audio_messages = candidates
            .into_iter()
            .filter(|candidate| candidate.priority == priority)
            .filter_map(|candidate| candidate.audio)
            .take(self.max_audio(ctx.mode))
            .collect();

        FeedbackResponse {
            audio_messages,
            visual_cues: cues,
            priority,
        }
    }

    /// Answer a host directive; the response always carries text
    #[must_use]
    pub fn respond_to_directive(
        &self,
        directive: FeedbackDirective,
        ctx: &FeedbackContext<'_>,
    ) -> FeedbackResponse {
        let text = match directive {
            FeedbackDirective::Help => help_text(ctx.exercise, ctx.mode),
            FeedbackDirective::Status => status_text(ctx),
        };
        FeedbackResponse {
            audio_messages: vec![text.clone()],
            visual_cues: vec![VisualCue::caption(CueKind::StatusPanel, text, 1.0)],
            priority: FeedbackPriority::Neutral,
        }
    }

    /// Announcement when a session begins
    #[must_use]
    pub fn session_start(&self, exercise: ExerciseType, mode: ExerciseMode) -> FeedbackResponse {
        let mut audio_messages = vec![format!("Starting {exercise}. Get into position!")];
        if mode == ExerciseMode::Beginner {
            audio_messages.push(format!("Remember: {}", first_tip(exercise)));
        }
        FeedbackResponse {
            audio_messages,
            visual_cues: vec![VisualCue::caption(
                CueKind::ViewGuide,
                positioning_tip(exercise),
                VIEW_CUE_WEIGHT,
            )],
            priority: FeedbackPriority::Encouragement,
        }
    }

    /// Spoken summary when a session ends
    #[must_use]
    pub fn session_complete(&self, exercise: ExerciseType, counts: &RepCounts) -> FeedbackResponse {
        let text = if counts.total_reps == 0 {
            "Workout complete! Great job today!".to_owned()
        } else {
            format!(
                "Workout complete: {} {exercise} reps, {} with good form. Best streak {}.",
                counts.total_reps, counts.correct_reps, counts.best_streak
            )
        };
        FeedbackResponse {
            audio_messages: vec![text.clone()],
            visual_cues: vec![VisualCue::caption(CueKind::StatusPanel, text, 1.0)],
            priority: FeedbackPriority::Encouragement,
        }
    }
}

fn view_feedback(view: &ViewAnalysis, candidates: &mut Vec<Candidate>, cues: &mut Vec<VisualCue>) {
    let first = view.recommendations.first().map(|r| r.message().to_owned());
    match view.view {
        CameraView::Unusable => {
            let text = first.unwrap_or_else(|| "Move so the camera can see your whole body".to_owned());
            cues.push(VisualCue::caption(CueKind::ViewGuide, text.clone(), 1.0));
            candidates.push(Candidate {
                priority: FeedbackPriority::Critical,
                audio: Some(text),
            });
        }
        CameraView::OptimalFront | CameraView::OptimalSide | CameraView::Suboptimal => {
            if let Some(text) = first {
                cues.push(VisualCue::caption(CueKind::ViewGuide, text.clone(), VIEW_CUE_WEIGHT));
                candidates.push(Candidate {
                    priority: FeedbackPriority::Advisory,
                    audio: Some(text),
                });
            }
        }
    }
}

fn rep_feedback(
    rep: &RepCountResult,
    ctx: &FeedbackContext<'_>,
    candidates: &mut Vec<Candidate>,
    cues: &mut Vec<VisualCue>,
) {
    if rep.should_reset {
        candidates.push(Candidate {
            priority: FeedbackPriority::Advisory,
            audio: rep.feedback.clone(),
        });
        return;
    }
    if rep.rep_completed {
        let (priority, text) = if rep.is_valid_rep() {
            (
                FeedbackPriority::Encouragement,
                milestone_text(ctx.counts.correct_reps, ctx.exercise),
            )
        } else {
            (
                FeedbackPriority::Advisory,
                form_warning_text(rep.quality_score.unwrap_or(0.0)),
            )
        };
        let caption = rep.feedback.clone().unwrap_or_else(|| text.clone());
        cues.push(VisualCue::caption(CueKind::RepCelebration, caption, 0.8));
        candidates.push(Candidate {
            priority,
            audio: Some(text),
        });
        return;
    }
    if let Some(text) = &rep.feedback {
        candidates.push(Candidate {
            priority: FeedbackPriority::Advisory,
            audio: Some(text.clone()),
        });
    }
}

fn milestone_text(correct_reps: u32, exercise: ExerciseType) -> String {
    match correct_reps {
        1 => format!("Perfect {exercise}! One quality rep!"),
        5 => format!("Excellent! Five quality {exercise} reps!"),
        10 => "Outstanding! Ten quality reps! You're crushing it!".to_owned(),
        n if n > 0 && n % MILESTONE_EVERY == 0 && !MILESTONE_REPS.contains(&n) => {
            format!("Amazing! {n} quality reps completed!")
        }
        n => format!("Rep {n}! Great form!"),
    }
}

fn form_warning_text(score: f64) -> String {
    if score < 60.0 {
        "That rep needs work. Focus on proper form!".to_owned()
    } else if score < 75.0 {
        "Close! Tighten up your form on the next rep.".to_owned()
    } else {
        "Almost there! Just a bit more precision.".to_owned()
    }
}

fn spoken_hint(violation: &FormViolation, mode: ExerciseMode) -> String {
    match mode {
        ExerciseMode::Beginner => violation.correction_hint.clone(),
        ExerciseMode::Pro => technical_hint(violation.kind).to_owned(),
    }
}

const fn technical_hint(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::ExcessiveForwardLean => {
            "Reduce trunk flexion: brace the core and keep the torso angle within tolerance"
        }
        ViolationKind::ExcessiveDepth => {
            "Limit range of motion: control the eccentric and stop above the depth threshold"
        }
        ViolationKind::KneeOverToe => {
            "Load the posterior chain: drive the hips back to limit anterior knee travel"
        }
        ViolationKind::AsymmetricStance => {
            "Correct the bilateral imbalance: match left and right joint angles"
        }
        ViolationKind::BodyLineBreak => {
            "Hold a neutral spine: posterior pelvic tilt with glutes engaged"
        }
        ViolationKind::UpperArmSwing => {
            "Stabilize the shoulder: keep the humerus vertical and remove momentum"
        }
    }
}

fn both_sides(joints: &[Joint]) -> Vec<LandmarkIndex> {
    BodySide::BOTH
        .iter()
        .flat_map(|side| joints.iter().map(move |joint| side.landmark(*joint)))
        .collect()
}

fn primary_joint(exercise: ExerciseType) -> Joint {
    match exercise.primary_channel() {
        AngleChannel::Knee => Joint::Knee,
        AngleChannel::Hip => Joint::Hip,
        AngleChannel::Ankle => Joint::Ankle,
        AngleChannel::Elbow => Joint::Elbow,
    }
}

fn violation_cue(violation: &FormViolation, exercise: ExerciseType) -> VisualCue {
    let landmarks = match violation.kind {
        ViolationKind::ExcessiveForwardLean => both_sides(&[Joint::Shoulder, Joint::Hip]),
        ViolationKind::ExcessiveDepth | ViolationKind::AsymmetricStance => {
            both_sides(&[primary_joint(exercise)])
        }
        ViolationKind::KneeOverToe => both_sides(&[Joint::Knee, Joint::FootIndex]),
        ViolationKind::BodyLineBreak => both_sides(&[Joint::Shoulder, Joint::Hip, Joint::Ankle]),
        ViolationKind::UpperArmSwing => both_sides(&[Joint::Shoulder, Joint::Elbow]),
    };
    VisualCue {
        kind: CueKind::ViolationHighlight,
        landmarks,
        text: violation.description.clone(),
        severity: Some(violation.severity),
        weight: violation.severity.weight(),
    }
}

const fn first_tip(exercise: ExerciseType) -> &'static str {
    match exercise {
        ExerciseType::Squat => "keep your chest up and push your knees out",
        ExerciseType::Pushup => "keep your body in a straight line from head to heels",
        ExerciseType::Plank => "squeeze your glutes and do not let your hips drop",
        ExerciseType::Lunge => "keep your front knee over your ankle",
        ExerciseType::BicepCurl => "keep your elbows pinned to your sides",
    }
}

fn positioning_tip(exercise: ExerciseType) -> String {
    match exercise.preferred_view() {
        CameraView::OptimalFront => "Face the camera with your whole body in frame".to_owned(),
        _ => "Stand side-on to the camera with your whole body in frame".to_owned(),
    }
}

fn help_text(exercise: ExerciseType, mode: ExerciseMode) -> String {
    let movement = match exercise {
        ExerciseType::Squat => "Lower your hips until your thighs are parallel, then stand tall",
        ExerciseType::Pushup => "Lower your chest toward the floor, then press back up",
        ExerciseType::Plank => "Hold a straight line from shoulders to ankles",
        ExerciseType::Lunge => "Step forward and lower your back knee, then push back up",
        ExerciseType::BicepCurl => "Curl the weight to your shoulders, then lower it slowly",
    };
    format!(
        "{movement}. {}. You are in {mode} mode.",
        positioning_tip(exercise)
    )
}

fn status_text(ctx: &FeedbackContext<'_>) -> String {
    let counts = &ctx.counts;
    if ctx.exercise.counts_reps() {
        format!(
            "{} position. {} reps, {} with good form. Current streak {}.",
            capitalize(&ctx.phase.to_string()),
            counts.total_reps,
            counts.correct_reps,
            counts.current_streak
        )
    } else {
        format!("{} position. Keep holding.", capitalize(&ctx.phase.to_string()))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
