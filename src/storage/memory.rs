// ABOUTME: In-memory session store for tests, replay and single-process deployments
// ABOUTME: Shared map guarded by a tokio RwLock so clones see the same data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::SessionStore;
use async_trait::async_trait;
use pierre_form_core::errors::AppResult;
use pierre_form_core::models::{ExerciseSessionData, SessionKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session store held entirely in memory
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    store: Arc<RwLock<HashMap<SessionKey, Vec<ExerciseSessionData>>>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys holding sessions
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether no sessions are stored
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &SessionKey) -> AppResult<Vec<ExerciseSessionData>> {
        Ok(self.store.read().await.get(key).cloned().unwrap_or_default())
    }

    async fn save(&self, key: &SessionKey, sessions: &[ExerciseSessionData]) -> AppResult<()> {
        let mut store = self.store.write().await;
        if sessions.is_empty() {
            store.remove(key);
        } else {
            store.insert(key.clone(), sessions.to_vec());
        }
        drop(store);
        Ok(())
    }

    async fn clear(&self, key: &SessionKey) -> AppResult<()> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn keys_for_user(&self, user_id: &str) -> AppResult<Vec<SessionKey>> {
        let mut keys: Vec<SessionKey> = self
            .store
            .read()
            .await
            .keys()
            .filter(|key| key.user_id == user_id)
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pierre_form_core::models::{ExerciseMode, ExerciseType};

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = InMemorySessionStore::new();
        let key = SessionKey::new("user-1", ExerciseType::Squat);
        let session = ExerciseSessionData::new(
            "user-1",
            ExerciseType::Squat,
            ExerciseMode::Beginner,
            Utc::now(),
        );

        store.save(&key, &[session.clone()]).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap(), vec![session]);
        assert_eq!(store.keys_for_user("user-1").await.unwrap(), vec![key.clone()]);
        assert!(store.keys_for_user("user-2").await.unwrap().is_empty());

        store.clear(&key).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemorySessionStore::new();
        let clone = store.clone();
        let key = SessionKey::new("user-1", ExerciseType::Plank);
        let session = ExerciseSessionData::new(
            "user-1",
            ExerciseType::Plank,
            ExerciseMode::Pro,
            Utc::now(),
        );
        clone.save(&key, &[session]).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
