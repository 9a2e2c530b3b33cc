// ABOUTME: Retrying wrapper around any SessionStore with exponential backoff
// ABOUTME: Retries recoverable storage failures and passes other errors straight through
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::SessionStore;
use crate::config::RetryConfig;
use async_trait::async_trait;
use pierre_form_core::errors::{AppResult, ErrorCode};
use pierre_form_core::models::{ExerciseSessionData, SessionKey};
use std::future::Future;
use tokio::time::sleep;
use tracing::{error, warn};

/// Store decorator that retries transient failures
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    retry: RetryConfig,
}

impl<S: SessionStore> RetryingStore<S> {
    /// Wrap `inner` with a retry policy
    #[must_use]
    pub const fn new(inner: S, retry: RetryConfig) -> Self {
        Self { inner, retry }
    }

    /// Wrapped store
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        mut f: F,
    ) -> AppResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
        T: Send,
    {
        let mut attempts = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e)
                    if e.code == ErrorCode::StorageFailure && attempts < self.retry.max_retries =>
                {
                    attempts += 1;
                    let backoff = self.retry.backoff(attempts);
                    warn!(
                        storage.operation = operation,
                        storage.key = %key,
                        attempt = attempts,
                        max_retries = self.retry.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Storage operation failed, retrying after backoff"
                    );
                    sleep(backoff).await;
                }
                Err(e) => {
                    error!(
                        storage.operation = operation,
                        storage.key = %key,
                        attempts = attempts + 1,
                        error = %e,
                        "Storage operation failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for RetryingStore<S> {
    async fn load(&self, key: &SessionKey) -> AppResult<Vec<ExerciseSessionData>> {
        let label = key.to_string();
        self.with_retry("load", &label, || self.inner.load(key)).await
    }

    async fn save(&self, key: &SessionKey, sessions: &[ExerciseSessionData]) -> AppResult<()> {
        let label = key.to_string();
        self.with_retry("save", &label, || self.inner.save(key, sessions))
            .await
    }

    async fn clear(&self, key: &SessionKey) -> AppResult<()> {
        let label = key.to_string();
        self.with_retry("clear", &label, || self.inner.clear(key)).await
    }

    async fn keys_for_user(&self, user_id: &str) -> AppResult<Vec<SessionKey>> {
        self.with_retry("keys_for_user", user_id, || self.inner.keys_for_user(user_id))
            .await
    }
}
