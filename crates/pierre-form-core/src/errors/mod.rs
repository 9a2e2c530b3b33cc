// ABOUTME: Unified error handling for the form coaching pipeline
// ABOUTME: Defines ErrorCode, AppError and conversions from domain-specific errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Frame-level problems (`LandmarkError`) are absorbed by the pipeline and
//! degrade a frame to "no new information". Configuration and storage
//! problems surface to the caller as `AppError` values carrying an
//! `ErrorCode`.

/// Frame-level landmark errors
pub mod landmark;

pub use landmark::LandmarkError;

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Required joints missing or below the confidence floor
    #[serde(rename = "INSUFFICIENT_LANDMARKS")]
    InsufficientLandmarks,
    /// Malformed threshold table or exercise configuration
    #[serde(rename = "INVALID_CONFIGURATION")]
    InvalidConfiguration,
    /// Session was evicted or never persisted
    #[serde(rename = "SESSION_NOT_FOUND")]
    SessionNotFound,
    /// Persistence boundary failure
    #[serde(rename = "STORAGE_FAILURE")]
    StorageFailure,
    /// Export / import payload could not be (de)serialized
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError,
    /// Caller supplied an invalid argument
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InsufficientLandmarks => "Required body landmarks are missing or not visible",
            Self::InvalidConfiguration => "Exercise configuration is invalid",
            Self::SessionNotFound => "The requested session was not found",
            Self::StorageFailure => "Session storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::InvalidInput => "The provided input is invalid",
            Self::InternalError => "An internal error occurred",
        }
    }

    /// Whether callers may continue after this error without intervention
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientLandmarks | Self::SessionNotFound | Self::StorageFailure => true,
            Self::InvalidConfiguration
            | Self::SerializationError
            | Self::InvalidInput
            | Self::InternalError => false,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Unified error type for the pipeline and session layer
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Required landmarks missing for this frame
    #[must_use]
    pub fn insufficient_landmarks(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientLandmarks, message)
    }

    /// Threshold table or exercise configuration rejected
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Session lookup failed
    #[must_use]
    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SessionNotFound,
            format!("Session {session_id} not found"),
        )
    }

    /// Storage boundary failure
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageFailure, message)
    }

    /// Serialization failure
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Invalid caller input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<LandmarkError> for AppError {
    fn from(error: LandmarkError) -> Self {
        Self::insufficient_landmarks(error.to_string()).with_source(error)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::invalid_configuration(error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}
