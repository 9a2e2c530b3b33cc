// ABOUTME: Error types for the form coach library, re-exported from pierre-form-core
// ABOUTME: Keeps crate::errors::AppError paths stable for the session layer and binaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use pierre_form_core::config::ConfigError;
pub use pierre_form_core::errors::{AppError, AppResult, ErrorCode, LandmarkError};
