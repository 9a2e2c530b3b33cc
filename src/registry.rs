// ABOUTME: Registry of live session handles for hosts running many sessions concurrently
// ABOUTME: DashMap shards the lookup and a per-session mutex keeps frames of one session ordered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::pipeline::{FinishedSession, FormPipeline, FrameOutcome, SessionState};
use dashmap::DashMap;
use pierre_form_core::config::ModeThresholds;
use pierre_form_core::errors::{AppError, AppResult};
use pierre_form_core::models::{
    ExerciseMode, ExerciseSessionData, ExerciseType, FeedbackDirective, FeedbackResponse,
    PoseFrame, SessionId,
};
use std::sync::{Arc, Mutex};

/// Live sessions keyed by id, all sharing one pipeline
pub struct SessionRegistry {
    pipeline: Arc<FormPipeline>,
    sessions: DashMap<SessionId, Mutex<SessionState>>,
}

impl SessionRegistry {
    /// Empty registry over a shared pipeline
    #[must_use]
    pub fn new(pipeline: Arc<FormPipeline>) -> Self {
        Self {
            pipeline,
            sessions: DashMap::new(),
        }
    }

    /// Shared pipeline
    #[must_use]
    pub fn pipeline(&self) -> &FormPipeline {
        &self.pipeline
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Ids of live sessions
    #[must_use]
    pub fn active_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Open a session and return its id
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when no valid table exists for the exercise and mode
    pub fn start(
        &self,
        user_id: &str,
        exercise: ExerciseType,
        mode: ExerciseMode,
        start_timestamp_ms: u64,
    ) -> AppResult<SessionId> {
        let state = self
            .pipeline
            .start_session(user_id, exercise, mode, start_timestamp_ms)?;
        let id = state.id();
        self.sessions.insert(id, Mutex::new(state));
        Ok(id)
    }

    /// Run `f` against a live session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids and `InternalError` for a poisoned session
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&FormPipeline, &mut SessionState) -> R,
    ) -> AppResult<R> {
        let entry = self
            .sessions
            .get(&id)
            .ok_or_else(|| AppError::session_not_found(id))?;
        let mut state = entry
            .value()
            .lock()
            .map_err(|_| AppError::internal(format!("session {id} state is poisoned")))?;
        Ok(f(&self.pipeline, &mut state))
    }

    /// Process one frame for a live session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids
    pub fn process_frame(&self, id: SessionId, frame: &PoseFrame) -> AppResult<FrameOutcome> {
        self.with_session(id, |pipeline, state| pipeline.process_frame(state, frame))
    }

    /// Switch mode for a live session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` or `InvalidConfiguration`
    pub fn switch_mode(&self, id: SessionId, mode: ExerciseMode) -> AppResult<()> {
        self.with_session(id, |pipeline, state| pipeline.switch_mode(state, mode))?
    }

    /// Switch exercise for a live session, returning the finished previous record
    ///
    /// The session keeps its registry key; the returned record carries the old id.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` or `InvalidConfiguration`
    pub fn switch_exercise(
        &self,
        id: SessionId,
        exercise: ExerciseType,
    ) -> AppResult<ExerciseSessionData> {
        self.with_session(id, |pipeline, state| {
            pipeline.switch_exercise(state, exercise)
        })?
    }

    /// Replace the threshold table of a live session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` or `InvalidConfiguration`
    pub fn apply_thresholds(&self, id: SessionId, thresholds: ModeThresholds) -> AppResult<()> {
        self.with_session(id, |pipeline, state| {
            pipeline.apply_thresholds(state, thresholds)
        })?
    }

    /// Answer a host directive for a live session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids
    pub fn respond_to_directive(
        &self,
        id: SessionId,
        directive: FeedbackDirective,
    ) -> AppResult<FeedbackResponse> {
        self.with_session(id, |pipeline, state| {
            pipeline.respond_to_directive(state, directive)
        })
    }

    /// Remove and finish a session
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids and `InternalError` for a poisoned session
    pub fn finish(&self, id: SessionId) -> AppResult<FinishedSession> {
        let (_, state) = self
            .sessions
            .remove(&id)
            .ok_or_else(|| AppError::session_not_found(id))?;
        let state = state
            .into_inner()
            .map_err(|_| AppError::internal(format!("session {id} state is poisoned")))?;
        Ok(self.pipeline.finish_session(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::config::ThresholdCatalog;
    use pierre_form_core::errors::ErrorCode;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(FormPipeline::new(ThresholdCatalog::builtin())))
    }

    #[test]
    fn test_start_and_finish() {
        let registry = registry();
        let id = registry
            .start("user-1", ExerciseType::Squat, ExerciseMode::Beginner, 0)
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_ids(), vec![id]);

        let finished = registry.finish(id).unwrap();
        assert_eq!(finished.data.id, id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_session() {
        let registry = registry();
        let err = registry
            .switch_mode(SessionId::new(), ExerciseMode::Pro)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = registry();
        let a = registry
            .start("user-a", ExerciseType::Squat, ExerciseMode::Beginner, 0)
            .unwrap();
        let b = registry
            .start("user-b", ExerciseType::Pushup, ExerciseMode::Pro, 0)
            .unwrap();
        registry.switch_mode(a, ExerciseMode::Pro).unwrap();
        let mode_b = registry.with_session(b, |_, state| state.mode()).unwrap();
        let mode_a = registry.with_session(a, |_, state| state.mode()).unwrap();
        assert_eq!(mode_a, ExerciseMode::Pro);
        assert_eq!(mode_b, ExerciseMode::Pro);
        let exercise_b = registry.with_session(b, |_, state| state.exercise()).unwrap();
        assert_eq!(exercise_b, ExerciseType::Pushup);
    }
}
