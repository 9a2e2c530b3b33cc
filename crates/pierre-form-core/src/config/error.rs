// ABOUTME: Configuration error types for threshold table validation
// ABOUTME: Defines error variants for invalid ranges, missing fields and unreadable files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration error types for threshold table validation.

use std::{env, io};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Boundaries out of order or outside 0-180 degrees
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// Required configuration entry is missing
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Environment variable access or parse error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] env::VarError),

    /// Failed to parse configuration document or value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Numeric value outside valid range for parameter
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),

    /// Threshold file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
