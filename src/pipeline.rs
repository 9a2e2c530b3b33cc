// ABOUTME: Per-session frame pipeline wiring angles, view, phase, form rules, reps and feedback
// ABOUTME: Explicit SessionState handle carries all mutable state; the pipeline itself is shared
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Form Pipeline
//!
//! `FormPipeline` holds configuration and the stateless analyzers and can be
//! shared across threads. Everything that changes from frame to frame lives
//! in a [`SessionState`] owned by the caller, so many sessions can run side
//! by side without globals.
//!
//! Per frame, in order:
//!
//! 1. frames whose timestamp does not advance are skipped
//! 2. the camera view is assessed (never fails)
//! 3. joint angles are extracted; missing landmarks skip the frame
//! 4. the state machine may emit a phase transition
//! 5. form rules run and are filtered by the current view
//! 6. the rep counter consumes the transition and violations
//! 7. the feedback engine builds the frame's payload
//!
//! Completed reps, transitions and view samples are folded into the
//! session's record as they happen.

use crate::config::FormCoachConfig;
use crate::logging::FormCoachLogger;
use crate::session_data::record;
use chrono::Utc;
use pierre_form_analysis::{
    AngleCalculator, CameraViewAnalyzer, ExerciseStateMachine, FeedbackContext, FeedbackEngine,
    FeedbackEngineConfig, FormAnalyzer, RepCounter, RepScoring,
};
use pierre_form_core::config::{ConfigError, ExerciseProfile, ModeThresholds, ThresholdCatalog};
use pierre_form_core::constants::landmarks::DEFAULT_MIN_VISIBILITY;
use pierre_form_core::constants::phase::DEFAULT_MIN_STABLE_FRAMES;
use pierre_form_core::errors::{AppResult, LandmarkError};
use pierre_form_core::models::{
    ExerciseAngles, ExerciseMode, ExercisePhase, ExerciseSessionData, ExerciseType,
    FeedbackDirective, FeedbackResponse, FormViolation, LandmarkIndex, PoseFrame, RepCountResult,
    RepCounts, SessionId, StateTransition, ViewAnalysis,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Tunables shared by every session of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Landmark visibility floor
    pub min_visibility: f64,
    /// Frames a phase candidate must hold before committing
    pub min_stable_frames: u32,
    /// Rep correctness policy
    pub scoring: RepScoring,
    /// Audio caps per mode
    pub feedback: FeedbackEngineConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_visibility: DEFAULT_MIN_VISIBILITY,
            min_stable_frames: DEFAULT_MIN_STABLE_FRAMES,
            scoring: RepScoring::default(),
            feedback: FeedbackEngineConfig::default(),
        }
    }
}

impl PipelineSettings {
    /// Settings taken from runtime configuration
    #[must_use]
    pub fn from_config(config: &FormCoachConfig) -> Self {
        Self {
            min_visibility: config.min_visibility,
            min_stable_frames: config.min_stable_frames,
            ..Self::default()
        }
    }
}

/// Why a frame produced no analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FrameSkipReason {
    /// Timestamp did not advance past the previous frame
    NonMonotonicTimestamp {
        /// Last accepted timestamp
        previous_ms: u64,
    },
    /// A landmark required by the exercise was unusable
    InsufficientLandmarks {
        /// Joint responsible
        landmark: LandmarkIndex,
        /// Human-readable cause
        detail: String,
    },
}

impl From<&LandmarkError> for FrameSkipReason {
    fn from(error: &LandmarkError) -> Self {
        Self::InsufficientLandmarks {
            landmark: error.index(),
            detail: error.to_string(),
        }
    }
}

/// Everything the pipeline produced for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    /// Frame timestamp
    pub timestamp_ms: u64,
    /// Joint angles, absent when the frame was skipped
    pub angles: Option<ExerciseAngles>,
    /// View assessment, absent for out-of-order frames
    pub view: Option<ViewAnalysis>,
    /// Phase after this frame
    pub phase: ExercisePhase,
    /// Transition committed on this frame
    pub transition: Option<StateTransition>,
    /// Violations that survived the view filter
    pub violations: Vec<FormViolation>,
    /// Rep counter output
    pub rep: RepCountResult,
    /// Feedback payload for the frame
    pub feedback: FeedbackResponse,
    /// Set when the frame carried no usable information
    pub skipped: Option<FrameSkipReason>,
}

/// Mutable per-session state, owned by the caller
#[derive(Debug, Clone)]
pub struct SessionState {
    profile: ExerciseProfile,
    machine: ExerciseStateMachine,
    counter: RepCounter,
    data: ExerciseSessionData,
    last_timestamp_ms: Option<u64>,
}

impl SessionState {
    /// Session identifier, shared with the session record
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.data.id
    }

    /// Exercise in progress
    #[must_use]
    pub const fn exercise(&self) -> ExerciseType {
        self.profile.exercise
    }

    /// Active mode
    #[must_use]
    pub const fn mode(&self) -> ExerciseMode {
        self.profile.mode
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> ExercisePhase {
        self.machine.phase()
    }

    /// Rep totals so far
    #[must_use]
    pub const fn counts(&self) -> &RepCounts {
        self.counter.counts()
    }

    /// Profile in force
    #[must_use]
    pub const fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    /// Threshold table in force
    #[must_use]
    pub fn current_thresholds(&self) -> &ModeThresholds {
        &self.profile.thresholds
    }

    /// Session record accumulated so far
    #[must_use]
    pub const fn data(&self) -> &ExerciseSessionData {
        &self.data
    }

    /// Timestamp of the last accepted frame
    #[must_use]
    pub const fn last_timestamp_ms(&self) -> Option<u64> {
        self.last_timestamp_ms
    }

    fn feedback_context<'a>(&self) -> FeedbackContext<'a> {
        FeedbackContext::new(
            self.profile.exercise,
            self.profile.mode,
            *self.counter.counts(),
            self.profile.thresholds.feedback_sensitivity,
        )
    }
}

/// Result of ending a session
#[derive(Debug, Clone)]
pub struct FinishedSession {
    /// Record with timing finalized, ready for the session data manager
    pub data: ExerciseSessionData,
    /// Final rep totals
    pub counts: RepCounts,
    /// Whether an in-flight attempt was discarded
    pub abandoned_attempt: bool,
    /// End-of-session announcement
    pub feedback: FeedbackResponse,
}

/// Shared frame processor
#[derive(Debug, Clone)]
pub struct FormPipeline {
    catalog: ThresholdCatalog,
    settings: PipelineSettings,
    angles: AngleCalculator,
    view: CameraViewAnalyzer,
    form: FormAnalyzer,
    feedback: FeedbackEngine,
}

impl FormPipeline {
    /// Pipeline with default settings
    #[must_use]
    pub fn new(catalog: ThresholdCatalog) -> Self {
        Self::with_settings(catalog, PipelineSettings::default())
    }

    /// Pipeline with explicit settings
    #[must_use]
    pub fn with_settings(catalog: ThresholdCatalog, settings: PipelineSettings) -> Self {
        Self {
            catalog,
            settings,
            angles: AngleCalculator::new(settings.min_visibility),
            view: CameraViewAnalyzer::new(settings.min_visibility),
            form: FormAnalyzer::new(settings.min_visibility),
            feedback: FeedbackEngine::new(settings.feedback),
        }
    }

    /// Pipeline built from runtime configuration, loading the threshold catalog
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the threshold file cannot be loaded
    pub fn from_config(config: &FormCoachConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_settings(
            config.load_catalog()?,
            PipelineSettings::from_config(config),
        ))
    }

    /// Threshold catalog
    #[must_use]
    pub const fn catalog(&self) -> &ThresholdCatalog {
        &self.catalog
    }

    /// Settings in force
    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Open a session whose first frame arrives at or after `start_timestamp_ms`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the catalog has no valid table for the exercise and mode
    pub fn start_session(
        &self,
        user_id: &str,
        exercise: ExerciseType,
        mode: ExerciseMode,
        start_timestamp_ms: u64,
    ) -> AppResult<SessionState> {
        let profile = self.catalog.profile(exercise, mode)?;
        let data = ExerciseSessionData::new(user_id, exercise, mode, Utc::now());
        FormCoachLogger::log_session_started(data.id, user_id, exercise, mode);
        Ok(SessionState {
            counter: RepCounter::new(&profile, start_timestamp_ms, self.settings.scoring),
            machine: ExerciseStateMachine::new(self.settings.min_stable_frames),
            profile,
            data,
            last_timestamp_ms: None,
        })
    }

    /// Announcement for the session's exercise and mode
    #[must_use]
    pub fn session_start_feedback(&self, state: &SessionState) -> FeedbackResponse {
        self.feedback.session_start(state.exercise(), state.mode())
    }

    /// Run one frame through every stage
    pub fn process_frame(&self, state: &mut SessionState, frame: &PoseFrame) -> FrameOutcome {
        let timestamp_ms = frame.timestamp_ms;
        if let Some(previous_ms) = state.last_timestamp_ms.filter(|prev| timestamp_ms <= *prev) {
            trace!(timestamp_ms, previous_ms, "Out-of-order frame skipped");
            return FrameOutcome {
                timestamp_ms,
                angles: None,
                view: None,
                phase: state.phase(),
                transition: None,
                violations: Vec::new(),
                rep: RepCountResult::idle(),
                feedback: FeedbackResponse::default(),
                skipped: Some(FrameSkipReason::NonMonotonicTimestamp { previous_ms }),
            };
        }
        state.last_timestamp_ms = Some(timestamp_ms);

        let exercise = state.exercise();
        let view = self.view.analyze(frame, exercise);
        record::apply_view_sample(&mut state.data, view.confidence, view.is_reliable());

        let angles = match self.angles.calculate(frame, exercise) {
            Ok(angles) => angles,
            Err(error) => {
                trace!(timestamp_ms, error = %error, "Frame skipped");
                let ctx = state.feedback_context().with_frame(
                    state.phase(),
                    &[],
                    Some(&view),
                    None,
                );
                let feedback = self.feedback.generate(&ctx);
                return FrameOutcome {
                    timestamp_ms,
                    angles: None,
                    phase: state.phase(),
                    transition: None,
                    violations: Vec::new(),
                    rep: RepCountResult::idle(),
                    feedback,
                    skipped: Some(FrameSkipReason::from(&error)),
                    view: Some(view),
                };
            }
        };

        let transition = state.machine.update(&angles, &state.profile, timestamp_ms);
        if transition.is_some() {
            record::apply_transition(&mut state.data);
        }
        let phase = state.machine.phase();

        let violations: Vec<FormViolation> = self
            .form
            .analyze(frame, &angles, exercise, &state.profile.thresholds, phase)
            .into_iter()
            .filter(|violation| violation.kind.compatible_with(view.view))
            .collect();

        let primary_angle = angles.channel(exercise.primary_channel());
        let rep = state.counter.process(
            transition.as_ref(),
            &violations,
            timestamp_ms,
            Some(primary_angle),
        );
        if rep.rep_completed {
            record::apply_rep(
                &mut state.data,
                rep.quality_score.unwrap_or_default(),
                rep.is_valid_rep(),
                &rep.violation_kinds,
            );
        }

        let ctx = state
            .feedback_context()
            .with_frame(phase, &violations, Some(&view), Some(&rep));
        let feedback = self.feedback.generate(&ctx);

        FrameOutcome {
            timestamp_ms,
            angles: Some(angles),
            view: Some(view),
            phase,
            transition,
            violations,
            rep,
            feedback,
            skipped: None,
        }
    }

    /// Switch mode between frames, abandoning any in-flight attempt
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the catalog has no valid table; the session is unchanged
    pub fn switch_mode(&self, state: &mut SessionState, mode: ExerciseMode) -> AppResult<()> {
        let profile = self.catalog.profile(state.exercise(), mode).inspect_err(|e| {
            FormCoachLogger::log_rejected_configuration(state.id(), &e.to_string());
        })?;
        Self::adopt_profile(state, profile);
        Ok(())
    }

    /// Switch exercise between frames
    ///
    /// The record for the previous exercise is returned with timing finalized
    /// and a fresh record and rep totals start for the new exercise.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the catalog has no valid table; the session is unchanged
    pub fn switch_exercise(
        &self,
        state: &mut SessionState,
        exercise: ExerciseType,
    ) -> AppResult<ExerciseSessionData> {
        let profile = self.catalog.profile(exercise, state.mode()).inspect_err(|e| {
            FormCoachLogger::log_rejected_configuration(state.id(), &e.to_string());
        })?;
        let start_ms = state.last_timestamp_ms.unwrap_or_default();
        let fresh = ExerciseSessionData::new(
            state.data.user_id.clone(),
            exercise,
            state.mode(),
            Utc::now(),
        );
        let mut previous = std::mem::replace(&mut state.data, fresh);
        record::apply_finalize(&mut previous, Utc::now());

        FormCoachLogger::log_profile_switch(
            state.id(),
            exercise,
            profile.mode,
            state.counter.in_attempt(),
        );
        state.counter = RepCounter::new(&profile, start_ms, self.settings.scoring);
        state.machine.reset();
        state.profile = profile;
        Ok(previous)
    }

    /// Replace the active threshold table after validating it
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the table is invalid; the session is unchanged
    pub fn apply_thresholds(
        &self,
        state: &mut SessionState,
        thresholds: ModeThresholds,
    ) -> AppResult<()> {
        let profile =
            ExerciseProfile::new(state.exercise(), state.mode(), thresholds).inspect_err(|e| {
                FormCoachLogger::log_rejected_configuration(state.id(), &e.to_string());
            })?;
        Self::adopt_profile(state, profile);
        Ok(())
    }

    fn adopt_profile(state: &mut SessionState, profile: ExerciseProfile) {
        let abandoned = state.counter.abandon_attempt();
        state.counter.apply_profile(&profile);
        FormCoachLogger::log_profile_switch(state.id(), profile.exercise, profile.mode, abandoned);
        // The phase is kept, so an interrupted movement finishes without opening an attempt
        state.profile = profile;
    }

    /// Answer a host directive with the session's current status
    #[must_use]
    pub fn respond_to_directive(
        &self,
        state: &SessionState,
        directive: FeedbackDirective,
    ) -> FeedbackResponse {
        let ctx = state.feedback_context().with_frame(state.phase(), &[], None, None);
        self.feedback.respond_to_directive(directive, &ctx)
    }

    /// End the session: discard the in-flight attempt and finalize timing now
    #[must_use]
    pub fn finish_session(&self, mut state: SessionState) -> FinishedSession {
        let abandoned_attempt = state.counter.abandon_attempt();
        record::apply_finalize(&mut state.data, Utc::now());
        let counts = *state.counter.counts();
        debug!(
            session.id = %state.id(),
            total_reps = counts.total_reps,
            abandoned_attempt,
            "Session finished"
        );
        FinishedSession {
            feedback: self.feedback.session_complete(state.exercise(), &counts),
            data: state.data,
            counts,
            abandoned_attempt,
        }
    }
}
