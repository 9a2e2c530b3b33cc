// ABOUTME: Feedback delivery module: audio throttling and the background dispatcher
// ABOUTME: Sits between FeedbackEngine output and the host's speech and overlay collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Feedback Delivery
//!
//! The pipeline produces a `FeedbackResponse` for every frame. Speaking each
//! one would be noise, so responses pass through a `FeedbackQueue` into a
//! `FeedbackDispatcher` task that speaks at most one message per interval and
//! lets urgent corrections jump ahead of queued tips. Visual cues are not
//! throttled.

/// Background task and sink trait
pub mod dispatcher;
/// Pure audio throttle
pub mod throttle;

pub use dispatcher::{FeedbackDispatcher, FeedbackQueue, FeedbackSink};
pub use throttle::{AudioMessage, DeliveryStats, FeedbackThrottle, ThrottleOutcome};
