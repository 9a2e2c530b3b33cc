// ABOUTME: Versioned export document for a user's sessions and its base64 transport form
// ABOUTME: Import validates the version before any session is restored
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use pierre_form_core::constants::sessions::EXPORT_FORMAT_VERSION;
use pierre_form_core::errors::{AppError, AppResult};
use pierre_form_core::models::ExerciseSessionData;
use serde::{Deserialize, Serialize};

/// Every retained session of one user, across exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    /// Document layout version
    pub format_version: u32,
    /// Owning user
    pub user_id: String,
    /// When the export was produced
    pub exported_at: DateTime<Utc>,
    /// Sessions, newest first within each exercise
    pub sessions: Vec<ExerciseSessionData>,
}

impl SessionExport {
    /// Wrap sessions in a current-version document
    #[must_use]
    pub fn new(user_id: impl Into<String>, sessions: Vec<ExerciseSessionData>) -> Self {
        Self {
            format_version: EXPORT_FORMAT_VERSION,
            user_id: user_id.into(),
            exported_at: Utc::now(),
            sessions,
        }
    }

    /// Pretty JSON form
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if encoding fails
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check a JSON document
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` for malformed JSON and `InvalidInput` for an unknown version
    pub fn from_json(json: &str) -> AppResult<Self> {
        let export: Self = serde_json::from_str(json)?;
        export.check_version()?;
        Ok(export)
    }

    /// Base64 transport string of the JSON document
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if encoding fails
    pub fn to_blob(&self) -> AppResult<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Decode a transport string produced by [`Self::to_blob`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for bad base64 or an unknown version, `SerializationError` for bad JSON
    pub fn from_blob(blob: &str) -> AppResult<Self> {
        let bytes = STANDARD.decode(blob.trim()).map_err(|e| {
            AppError::invalid_input("session export blob is not valid base64").with_source(e)
        })?;
        let export: Self = serde_json::from_slice(&bytes)?;
        export.check_version()?;
        Ok(export)
    }

    fn check_version(&self) -> AppResult<()> {
        if self.format_version == EXPORT_FORMAT_VERSION {
            Ok(())
        } else {
            Err(AppError::invalid_input(format!(
                "unsupported session export version {} (expected {EXPORT_FORMAT_VERSION})",
                self.format_version
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::errors::ErrorCode;
    use pierre_form_core::models::{ExerciseMode, ExerciseType};

    #[test]
    fn test_blob_preserves_document() {
        let mut session = ExerciseSessionData::new(
            "user-1",
            ExerciseType::Lunge,
            ExerciseMode::Pro,
            Utc::now(),
        );
        session.rep_qualities = vec![67.0, 0.1 + 0.2];
        session.average_rep_quality = (67.0 + 0.1 + 0.2) / 2.0;
        let export = SessionExport::new("user-1", vec![session]);

        let restored = SessionExport::from_blob(&export.to_blob().unwrap()).unwrap();
        assert_eq!(restored, export);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut export = SessionExport::new("user-1", Vec::new());
        export.format_version = 99;
        let json = serde_json::to_string(&export).unwrap();
        let err = SessionExport::from_json(&json).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_rejects_garbage_blob() {
        let err = SessionExport::from_blob("not base64 at all!").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
