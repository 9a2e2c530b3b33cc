// ABOUTME: Integration tests for session stores and the retrying store decorator
// ABOUTME: Uses a scripted failing store to exercise exponential backoff and error passthrough
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use async_trait::async_trait;
use common::{completed_session, init_test_logging};
use pierre_form_coach::config::RetryConfig;
use pierre_form_coach::session_data::SessionDataManager;
use pierre_form_coach::storage::{InMemorySessionStore, RetryingStore, SessionStore};
use pierre_form_core::errors::{AppError, AppResult, ErrorCode};
use pierre_form_core::models::{ExerciseSessionData, ExerciseType, SessionKey};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Store whose writes fail a scripted number of times before succeeding
struct FlakyStore {
    inner: InMemorySessionStore,
    failures_left: AtomicU32,
    failure: ErrorCode,
    save_calls: AtomicU32,
}

impl FlakyStore {
    fn new(failures: u32, failure: ErrorCode) -> Self {
        Self {
            inner: InMemorySessionStore::new(),
            failures_left: AtomicU32::new(failures),
            failure,
            save_calls: AtomicU32::new(0),
        }
    }

    fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn load(&self, key: &SessionKey) -> AppResult<Vec<ExerciseSessionData>> {
        self.inner.load(key).await
    }

    async fn save(&self, key: &SessionKey, sessions: &[ExerciseSessionData]) -> AppResult<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::new(self.failure, "scripted failure"));
        }
        self.inner.save(key, sessions).await
    }

    async fn clear(&self, key: &SessionKey) -> AppResult<()> {
        self.inner.clear(key).await
    }

    async fn keys_for_user(&self, user_id: &str) -> AppResult<Vec<SessionKey>> {
        self.inner.keys_for_user(user_id).await
    }
}

fn retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff_ms: 100,
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_with_backoff() {
    init_test_logging();
    let flaky = Arc::new(FlakyStore::new(2, ErrorCode::StorageFailure));
    let store = RetryingStore::new(Arc::clone(&flaky), retry(3));
    let key = SessionKey::new("athlete-1", ExerciseType::Squat);
    let session = completed_session("athlete-1", 0, &[90.0]);

    let started = Instant::now();
    store.save(&key, &[session.clone()]).await.unwrap();

    assert_eq!(flaky.save_calls(), 3);
    // 100 ms then 200 ms of backoff
    assert!(started.elapsed().as_millis() >= 300);
    assert_eq!(store.load(&key).await.unwrap(), vec![session]);
}

#[tokio::test(start_paused = true)]
async fn test_retries_give_up_after_limit() {
    init_test_logging();
    let flaky = Arc::new(FlakyStore::new(10, ErrorCode::StorageFailure));
    let store = RetryingStore::new(Arc::clone(&flaky), retry(2));
    let key = SessionKey::new("athlete-1", ExerciseType::Squat);

    let err = store.save(&key, &[]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageFailure);
    assert_eq!(flaky.save_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_non_storage_errors_are_not_retried() {
    init_test_logging();
    let flaky = Arc::new(FlakyStore::new(1, ErrorCode::SerializationError));
    let store = RetryingStore::new(Arc::clone(&flaky), retry(3));
    let key = SessionKey::new("athlete-1", ExerciseType::Squat);

    let err = store.save(&key, &[]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SerializationError);
    assert_eq!(flaky.save_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manager_completes_through_flaky_store() {
    init_test_logging();
    let flaky = Arc::new(FlakyStore::new(1, ErrorCode::StorageFailure));
    let manager = SessionDataManager::new(RetryingStore::new(Arc::clone(&flaky), retry(3)));

    let saved = manager
        .complete_session(completed_session("athlete-1", 0, &[90.0]))
        .await
        .unwrap();

    assert_eq!(
        manager
            .get_sessions("athlete-1", ExerciseType::Squat)
            .await
            .unwrap(),
        vec![saved]
    );
    assert_eq!(flaky.save_calls(), 2);
}

#[tokio::test]
async fn test_in_memory_keys_are_per_user() {
    let store = InMemorySessionStore::new();
    let squat = completed_session("athlete-1", 0, &[90.0]);
    store.save(&squat.key(), &[squat.clone()]).await.unwrap();
    store
        .save(
            &SessionKey::new("athlete-2", ExerciseType::Squat),
            &[completed_session("athlete-2", 0, &[90.0])],
        )
        .await
        .unwrap();

    assert_eq!(
        store.keys_for_user("athlete-1").await.unwrap(),
        vec![squat.key()]
    );
    assert!(store.keys_for_user("athlete-3").await.unwrap().is_empty());
}
