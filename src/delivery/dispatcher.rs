// ABOUTME: Background feedback dispatcher fed by a bounded channel from the frame loop
// ABOUTME: Applies the audio throttle on a tokio task and forwards payloads to a FeedbackSink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::throttle::{AudioMessage, DeliveryStats, FeedbackThrottle};
use crate::config::DeliveryConfig;
use async_trait::async_trait;
use pierre_form_core::errors::{AppError, AppResult};
use pierre_form_core::models::{FeedbackResponse, VisualCue};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};

/// Audio and visual output collaborator
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Speak one message
    ///
    /// # Errors
    ///
    /// Returns an error when the speech backend rejects the message
    async fn deliver_audio(&self, message: &AudioMessage) -> AppResult<()>;

    /// Draw overlay cues
    ///
    /// # Errors
    ///
    /// Returns an error when the renderer rejects the cues
    async fn deliver_visual(&self, cues: &[VisualCue]) -> AppResult<()>;
}

struct Submission {
    response: FeedbackResponse,
    submitted_at: Instant,
}

/// Non-blocking handle the frame loop submits feedback through
#[derive(Clone)]
pub struct FeedbackQueue {
    tx: mpsc::Sender<Submission>,
}

impl FeedbackQueue {
    /// Queue a response without waiting
    ///
    /// Returns `false` when the payload is empty, the queue is full or the
    /// dispatcher has stopped.
    pub fn submit(&self, response: FeedbackResponse) -> bool {
        if response.is_empty() {
            return false;
        }
        let submission = Submission {
            response,
            submitted_at: Instant::now(),
        };
        match self.tx.try_send(submission) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Feedback queue full, dropping response");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Feedback dispatcher stopped, dropping response");
                false
            }
        }
    }
}

/// Running dispatcher task
///
/// Dropping the dispatcher without calling `shutdown` also stops the task.
pub struct FeedbackDispatcher {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<DeliveryStats>,
}

impl FeedbackDispatcher {
    /// Spawn the dispatcher on the current runtime
    #[must_use]
    pub fn spawn(config: DeliveryConfig, sink: Arc<dyn FeedbackSink>) -> (FeedbackQueue, Self) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let handle = tokio::spawn(run(FeedbackThrottle::new(config), sink, rx, shutdown_rx));
        (FeedbackQueue { tx }, Self { shutdown_tx, handle })
    }

    /// Stop the task and return its counters
    ///
    /// Responses still in the channel are discarded.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if the task panicked
    pub async fn shutdown(self) -> AppResult<DeliveryStats> {
        if let Err(e) = self.shutdown_tx.try_send(()) {
            debug!(error = ?e, "Dispatcher shutdown signal send failed (task likely stopped)");
        }
        self.handle
            .await
            .map_err(|e| AppError::internal("Feedback dispatcher task failed").with_source(e))
    }
}

async fn run(
    mut throttle: FeedbackThrottle,
    sink: Arc<dyn FeedbackSink>,
    mut rx: mpsc::Receiver<Submission>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> DeliveryStats {
    let origin = Instant::now();
    let elapsed_ms = |at: Instant| at.saturating_duration_since(origin).as_millis() as u64;

    loop {
        let wake = throttle
            .next_deadline_ms()
            .map(|ms| origin + Duration::from_millis(ms));

        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                debug!("Feedback dispatcher received shutdown signal");
                break;
            }
            received = rx.recv() => {
                let Some(submission) = received else {
                    debug!("Feedback queue closed");
                    break;
                };
                let outcome = throttle.submit(
                    &submission.response,
                    elapsed_ms(submission.submitted_at),
                    elapsed_ms(Instant::now()),
                );
                if !outcome.visual_cues.is_empty() {
                    if let Err(e) = sink.deliver_visual(&outcome.visual_cues).await {
                        warn!(error = %e, "Visual feedback delivery failed");
                    }
                }
                if let Some(audio) = outcome.audio {
                    speak(sink.as_ref(), &audio).await;
                }
            }
            () = sleep_until_deadline(wake) => {
                if let Some(audio) = throttle.poll(elapsed_ms(Instant::now())) {
                    speak(sink.as_ref(), &audio).await;
                }
            }
        }
    }

    throttle.stats()
}

async fn speak(sink: &dyn FeedbackSink, audio: &AudioMessage) {
    if let Err(e) = sink.deliver_audio(audio).await {
        warn!(error = %e, priority = ?audio.priority, "Audio feedback delivery failed");
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
