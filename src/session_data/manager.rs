// ABOUTME: Session Data Manager: session lifecycle, persistence with retention, summaries and transfer
// ABOUTME: Completion computes timing and personal best, then stores newest-first under a retention cap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::export::SessionExport;
use super::record;
use super::summary::{summarize, TrendConfig};
use crate::logging::FormCoachLogger;
use crate::storage::SessionStore;
use chrono::{DateTime, Utc};
use pierre_form_core::constants::sessions::MAX_RETAINED_SESSIONS;
use pierre_form_core::errors::{AppError, AppResult};
use pierre_form_core::models::{
    ExerciseMode, ExerciseSessionData, ExerciseType, PersonalBest, SessionId, SessionKey,
    SessionSummary, ViolationKind,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Owns session history for every user through a `SessionStore`
pub struct SessionDataManager<S> {
    store: Arc<S>,
    trend: TrendConfig,
    retention_limit: usize,
    // Serializes load-modify-save cycles so concurrent completions do not drop sessions
    write_lock: Arc<Mutex<()>>,
}

impl<S> Clone for SessionDataManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            trend: self.trend,
            retention_limit: self.retention_limit,
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

/// Completion time used for ordering, falling back to the start time
fn recency(session: &ExerciseSessionData) -> DateTime<Utc> {
    session.end_time.unwrap_or(session.start_time)
}

impl<S: SessionStore + 'static> SessionDataManager<S> {
    /// Manager with default trend thresholds and retention
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    /// Manager over a store shared with other owners
    #[must_use]
    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            store,
            trend: TrendConfig::default(),
            retention_limit: MAX_RETAINED_SESSIONS,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Override the trend thresholds
    #[must_use]
    pub const fn with_trend(mut self, trend: TrendConfig) -> Self {
        self.trend = trend;
        self
    }

    /// Override the per user and exercise retention cap (minimum 1)
    #[must_use]
    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.retention_limit = limit.max(1);
        self
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Trend thresholds in force
    #[must_use]
    pub const fn trend(&self) -> TrendConfig {
        self.trend
    }

    /// Start a session now
    #[must_use]
    pub fn create_session(
        &self,
        user_id: &str,
        exercise: ExerciseType,
        mode: ExerciseMode,
    ) -> ExerciseSessionData {
        self.create_session_at(user_id, exercise, mode, Utc::now())
    }

    /// Start a session at an explicit wall-clock time
    #[must_use]
    pub fn create_session_at(
        &self,
        user_id: &str,
        exercise: ExerciseType,
        mode: ExerciseMode,
        start_time: DateTime<Utc>,
    ) -> ExerciseSessionData {
        let session = ExerciseSessionData::new(user_id, exercise, mode, start_time);
        FormCoachLogger::log_session_started(session.id, user_id, exercise, mode);
        session
    }

    /// Fold one completed rep into `session`
    #[must_use]
    pub fn update_session_rep(
        &self,
        session: ExerciseSessionData,
        quality_score: f64,
        is_valid: bool,
        violations: &[ViolationKind],
    ) -> ExerciseSessionData {
        record::update_session_rep(session, quality_score, is_valid, violations)
    }

    /// Count one phase transition
    #[must_use]
    pub fn record_transition(&self, session: ExerciseSessionData) -> ExerciseSessionData {
        record::record_transition(session)
    }

    /// Fold one frame's view confidence
    #[must_use]
    pub fn record_view_sample(
        &self,
        session: ExerciseSessionData,
        confidence: f64,
        reliable: bool,
    ) -> ExerciseSessionData {
        record::record_view_sample(session, confidence, reliable)
    }

    /// Finalize and persist a session now
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the session was already persisted, or a storage error
    pub async fn complete_session(
        &self,
        session: ExerciseSessionData,
    ) -> AppResult<ExerciseSessionData> {
        self.complete_session_at(session, Utc::now()).await
    }

    /// Finalize and persist a session with an explicit completion time
    ///
    /// Timing already stamped by the caller is kept. The personal best is
    /// measured against the most recent prior session only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the session was already persisted, or a storage error
    pub async fn complete_session_at(
        &self,
        session: ExerciseSessionData,
        end_time: DateTime<Utc>,
    ) -> AppResult<ExerciseSessionData> {
        let started = Instant::now();
        let mut session = if session.end_time.is_some() {
            session
        } else {
            record::finalize_timing(session, end_time)
        };
        let key = session.key();

        let guard = self.write_lock.lock().await;
        let mut history = self.store.load(&key).await?;
        if history.iter().any(|stored| stored.id == session.id) {
            return Err(AppError::invalid_input(format!(
                "session {} is already completed",
                session.id
            )));
        }

        let quality = session.average_rep_quality;
        session.personal_best = history
            .first()
            .filter(|previous| quality > previous.average_rep_quality)
            .map(|previous| PersonalBest {
                previous_best: previous.average_rep_quality,
                new_best: quality,
                improvement: quality - previous.average_rep_quality,
            });

        history.insert(0, session.clone());
        let evicted = history.len().saturating_sub(self.retention_limit);
        history.truncate(self.retention_limit);
        let saved = self.store.save(&key, &history).await;
        drop(guard);

        FormCoachLogger::log_storage_operation(
            "complete_session",
            &key.to_string(),
            saved.is_ok(),
            started.elapsed().as_millis() as u64,
        );
        saved?;

        if evicted > 0 {
            debug!(key = %key, evicted, "Retention cap evicted oldest sessions");
        }
        FormCoachLogger::log_session_completed(
            session.id,
            &session.user_id,
            session.total_reps,
            session.average_rep_quality,
            session.duration_seconds.unwrap_or_default(),
        );
        if let Some(best) = &session.personal_best {
            info!(
                session.id = %session.id,
                user.id = %session.user_id,
                improvement = best.improvement,
                "New personal best"
            );
        }
        Ok(session)
    }

    /// Finalize and persist without blocking the caller
    ///
    /// Failures are logged and also returned through the join handle.
    #[must_use]
    pub fn complete_in_background(
        &self,
        session: ExerciseSessionData,
    ) -> JoinHandle<AppResult<ExerciseSessionData>> {
        let manager = self.clone();
        let end_time = Utc::now();
        tokio::spawn(async move {
            let session_id = session.id;
            let result = manager.complete_session_at(session, end_time).await;
            if let Err(e) = &result {
                error!(session.id = %session_id, error = %e, "Background session completion failed");
            }
            result
        })
    }

    /// Trend and aggregate summary for one user and exercise
    ///
    /// # Errors
    ///
    /// Returns a storage error if history cannot be loaded
    pub async fn generate_summary(
        &self,
        user_id: &str,
        exercise: ExerciseType,
    ) -> AppResult<SessionSummary> {
        let sessions = self.get_sessions(user_id, exercise).await?;
        Ok(summarize(exercise, &sessions, &self.trend))
    }

    /// Retained sessions, newest first
    ///
    /// # Errors
    ///
    /// Returns a storage error if history cannot be loaded
    pub async fn get_sessions(
        &self,
        user_id: &str,
        exercise: ExerciseType,
    ) -> AppResult<Vec<ExerciseSessionData>> {
        self.store.load(&SessionKey::new(user_id, exercise)).await
    }

    /// One retained session by id
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when no retained session of the user has that id
    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: SessionId,
    ) -> AppResult<ExerciseSessionData> {
        for key in self.store.keys_for_user(user_id).await? {
            if let Some(found) = self
                .store
                .load(&key)
                .await?
                .into_iter()
                .find(|session| session.id == session_id)
            {
                return Ok(found);
            }
        }
        Err(AppError::session_not_found(session_id))
    }

    /// Delete retained sessions for one exercise, or all exercises when `None`
    ///
    /// Returns how many sessions were removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if history cannot be read or cleared
    pub async fn clear_sessions(
        &self,
        user_id: &str,
        exercise: Option<ExerciseType>,
    ) -> AppResult<usize> {
        let keys = match exercise {
            Some(exercise) => vec![SessionKey::new(user_id, exercise)],
            None => self.store.keys_for_user(user_id).await?,
        };
        let _guard = self.write_lock.lock().await;
        let mut removed = 0;
        for key in keys {
            removed += self.store.load(&key).await?.len();
            self.store.clear(&key).await?;
        }
        info!(user.id = %user_id, exercise = ?exercise, removed, "Sessions cleared");
        Ok(removed)
    }

    /// Every retained session of a user as a versioned document
    ///
    /// # Errors
    ///
    /// Returns a storage error if history cannot be loaded
    pub async fn export_sessions(&self, user_id: &str) -> AppResult<SessionExport> {
        let mut sessions = Vec::new();
        for key in self.store.keys_for_user(user_id).await? {
            sessions.extend(self.store.load(&key).await?);
        }
        debug!(user.id = %user_id, sessions = sessions.len(), "Sessions exported");
        Ok(SessionExport::new(user_id, sessions))
    }

    /// Export as a base64 transport string
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error
    pub async fn export_blob(&self, user_id: &str) -> AppResult<String> {
        self.export_sessions(user_id).await?.to_blob()
    }

    /// Restore sessions verbatim, skipping ids already retained
    ///
    /// Merged history is reordered newest first and capped by the retention
    /// limit. Returns how many imported sessions were retained.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a session belongs to another user, or a storage error
    pub async fn import_sessions(&self, export: &SessionExport) -> AppResult<usize> {
        if let Some(foreign) = export
            .sessions
            .iter()
            .find(|session| session.user_id != export.user_id)
        {
            return Err(AppError::invalid_input(format!(
                "session {} belongs to {}, not {}",
                foreign.id, foreign.user_id, export.user_id
            )));
        }

        let mut by_key: BTreeMap<SessionKey, Vec<&ExerciseSessionData>> = BTreeMap::new();
        for session in &export.sessions {
            by_key.entry(session.key()).or_default().push(session);
        }

        let _guard = self.write_lock.lock().await;
        let mut imported = 0;
        for (key, incoming) in by_key {
            let mut history = self.store.load(&key).await?;
            let mut seen: HashSet<SessionId> = history.iter().map(|s| s.id).collect();
            let mut fresh = HashSet::new();
            for session in incoming {
                if seen.insert(session.id) {
                    fresh.insert(session.id);
                    history.push(session.clone());
                }
            }
            if fresh.is_empty() {
                continue;
            }
            history.sort_by(|a, b| recency(b).cmp(&recency(a)));
            history.truncate(self.retention_limit);
            imported += history.iter().filter(|s| fresh.contains(&s.id)).count();
            self.store.save(&key, &history).await?;
        }

        info!(
            user.id = %export.user_id,
            offered = export.sessions.len(),
            imported,
            "Sessions imported"
        );
        Ok(imported)
    }

    /// Import from a base64 transport string
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` or `SerializationError` for a bad blob, or a storage error
    pub async fn import_blob(&self, blob: &str) -> AppResult<usize> {
        self.import_sessions(&SessionExport::from_blob(blob)?).await
    }
}
