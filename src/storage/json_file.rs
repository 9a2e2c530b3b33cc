// ABOUTME: JSON file session store keeping one document per user under a directory
// ABOUTME: Writes go through a temp file and rename so readers never see partial documents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::SessionStore;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use pierre_form_core::constants::sessions::EXPORT_FORMAT_VERSION;
use pierre_form_core::errors::{AppError, AppResult};
use pierre_form_core::models::{ExerciseSessionData, ExerciseType, SessionKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk document for one user
#[derive(Debug, Default, Serialize, Deserialize)]
struct UserDocument {
    format_version: u32,
    exercises: BTreeMap<ExerciseType, Vec<ExerciseSessionData>>,
}

/// Session store writing `<dir>/<encoded user id>.json`
///
/// User ids are base64url-encoded so any id maps to a safe file name.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles across users; writes are rare
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` when the directory cannot be created
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::storage(format!("cannot create store directory {}", dir.display()))
                .with_source(e)
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn user_path(&self, user_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", URL_SAFE_NO_PAD.encode(user_id.as_bytes())))
    }

    async fn read_document(&self, user_id: &str) -> AppResult<UserDocument> {
        let path = self.user_path(user_id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(UserDocument {
                format_version: EXPORT_FORMAT_VERSION,
                exercises: BTreeMap::new(),
            }),
            Err(e) => Err(AppError::storage(format!("cannot read {}", path.display()))
                .with_source(e)),
        }
    }

    async fn write_document(&self, user_id: &str, document: &UserDocument) -> AppResult<()> {
        let path = self.user_path(user_id);
        if document.exercises.is_empty() {
            return match fs::remove_file(&path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(AppError::storage(format!(
                    "cannot remove {}",
                    path.display()
                ))
                .with_source(e)),
                _ => Ok(()),
            };
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await.map_err(|e| {
            AppError::storage(format!("cannot write {}", tmp.display())).with_source(e)
        })?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            AppError::storage(format!("cannot replace {}", path.display())).with_source(e)
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Session document written");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn load(&self, key: &SessionKey) -> AppResult<Vec<ExerciseSessionData>> {
        let mut document = self.read_document(&key.user_id).await?;
        Ok(document.exercises.remove(&key.exercise).unwrap_or_default())
    }

    async fn save(&self, key: &SessionKey, sessions: &[ExerciseSessionData]) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document(&key.user_id).await?;
        document.format_version = EXPORT_FORMAT_VERSION;
        if sessions.is_empty() {
            document.exercises.remove(&key.exercise);
        } else {
            document.exercises.insert(key.exercise, sessions.to_vec());
        }
        self.write_document(&key.user_id, &document).await
    }

    async fn clear(&self, key: &SessionKey) -> AppResult<()> {
        self.save(key, &[]).await
    }

    async fn keys_for_user(&self, user_id: &str) -> AppResult<Vec<SessionKey>> {
        let document = self.read_document(user_id).await?;
        Ok(document
            .exercises
            .keys()
            .map(|exercise| SessionKey::new(user_id, *exercise))
            .collect())
    }
}
