// ABOUTME: Session Data Manager module: record folds, completion, summaries and export/import
// ABOUTME: Consumes rep completions from the pipeline and persists through a SessionStore
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Data
//!
//! A session record moves `Created -> Active -> Completed`. While active it
//! is owned by the caller (usually a pipeline `SessionState`) and updated
//! through pure folds. Completion stamps timing, computes the personal best
//! and hands the record to the store, after which it is never mutated.

/// Versioned export documents
pub mod export;
/// Lifecycle and persistence
pub mod manager;
/// Pure record folds
pub mod record;
/// Trend and aggregate summaries
pub mod summary;

pub use export::SessionExport;
pub use manager::SessionDataManager;
pub use record::{finalize_timing, record_transition, record_view_sample, update_session_rep};
pub use summary::{improvement_rate, summarize, TrendConfig};
