// ABOUTME: Persistence boundary for completed exercise sessions
// ABOUTME: SessionStore trait plus in-memory, JSON file and retrying implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Storage
//!
//! Sessions are stored per `SessionKey` (user and exercise) as a newest-first
//! list. The store only persists what it is given; ordering and the retention
//! cap are the session data manager's responsibility.

/// JSON file store, one document per user
pub mod json_file;
/// In-memory store backed by a shared map
pub mod memory;
/// Exponential backoff wrapper for any store
pub mod retry;

pub use json_file::JsonFileSessionStore;
pub use memory::InMemorySessionStore;
pub use retry::RetryingStore;

use async_trait::async_trait;
use pierre_form_core::errors::AppResult;
use pierre_form_core::models::{ExerciseSessionData, SessionKey};
use std::sync::Arc;

/// Storage backend for session history
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Sessions for a key, newest first; empty when none were saved
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` or `SerializationError` when the backend cannot be read
    async fn load(&self, key: &SessionKey) -> AppResult<Vec<ExerciseSessionData>>;

    /// Replace the sessions stored under a key
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` when the backend rejects the write
    async fn save(&self, key: &SessionKey, sessions: &[ExerciseSessionData]) -> AppResult<()>;

    /// Remove every session stored under a key
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` when the backend rejects the delete
    async fn clear(&self, key: &SessionKey) -> AppResult<()>;

    /// Keys holding at least one session for a user
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` when the backend cannot be listed
    async fn keys_for_user(&self, user_id: &str) -> AppResult<Vec<SessionKey>>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    async fn load(&self, key: &SessionKey) -> AppResult<Vec<ExerciseSessionData>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &SessionKey, sessions: &[ExerciseSessionData]) -> AppResult<()> {
        (**self).save(key, sessions).await
    }

    async fn clear(&self, key: &SessionKey) -> AppResult<()> {
        (**self).clear(key).await
    }

    async fn keys_for_user(&self, user_id: &str) -> AppResult<Vec<SessionKey>> {
        (**self).keys_for_user(user_id).await
    }
}
