// ABOUTME: Pure audio throttling for feedback delivery, driven by caller-supplied timestamps
// ABOUTME: Enforces a minimum spoken interval, priority preemption and stale-message expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::DeliveryConfig;
use pierre_form_core::models::{FeedbackPriority, FeedbackResponse, VisualCue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One spoken message released by the throttle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMessage {
    /// Text for speech synthesis
    pub text: String,
    /// Urgency inherited from the response
    pub priority: FeedbackPriority,
}

/// What to hand the sink right now
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThrottleOutcome {
    /// Visual cues, always delivered immediately
    pub visual_cues: Vec<VisualCue>,
    /// Spoken message, when one is due
    pub audio: Option<AudioMessage>,
}

/// Counters kept by the throttle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// Spoken messages released
    pub audio_delivered: u64,
    /// Queued messages displaced by a more urgent one
    pub audio_preempted: u64,
    /// Messages dropped because equal or more urgent audio was already queued
    pub audio_suppressed: u64,
    /// Queued messages dropped for exceeding the max age
    pub audio_expired: u64,
    /// Responses whose visual cues were delivered
    pub visual_delivered: u64,
}

#[derive(Debug, Clone)]
struct PendingAudio {
    message: AudioMessage,
    submitted_ms: u64,
}

/// Audio gate between the pipeline and speech synthesis
///
/// At most one message waits at a time. A more urgent submission replaces it;
/// anything else is dropped. Waiting audio older than the max age is discarded
/// rather than spoken late.
#[derive(Debug, Clone)]
pub struct FeedbackThrottle {
    config: DeliveryConfig,
    last_audio_ms: Option<u64>,
    pending: Option<PendingAudio>,
    stats: DeliveryStats,
}

impl FeedbackThrottle {
    /// Throttle with the given timing
    #[must_use]
    pub const fn new(config: DeliveryConfig) -> Self {
        Self {
            config,
            last_audio_ms: None,
            pending: None,
            stats: DeliveryStats {
                audio_delivered: 0,
                audio_preempted: 0,
                audio_suppressed: 0,
                audio_expired: 0,
                visual_delivered: 0,
            },
        }
    }

    /// Delivery counters so far
    #[must_use]
    pub const fn stats(&self) -> DeliveryStats {
        self.stats
    }

    /// Priority of the waiting message, if any
    #[must_use]
    pub fn pending_priority(&self) -> Option<FeedbackPriority> {
        self.pending.as_ref().map(|pending| pending.message.priority)
    }

    /// Accept a response submitted at `submitted_ms` and observed at `now_ms`
    ///
    /// The response's audio messages are spoken together as one utterance, so
    /// the per-mode audio cap bounds how much is said at once.
    pub fn submit(
        &mut self,
        response: &FeedbackResponse,
        submitted_ms: u64,
        now_ms: u64,
    ) -> ThrottleOutcome {
        if !response.visual_cues.is_empty() {
            self.stats.visual_delivered += 1;
        }

        // A message that can no longer be spoken must not block a fresh one
        self.expire_stale(now_ms);
        if !response.audio_messages.is_empty() {
            let candidate = PendingAudio {
                message: AudioMessage {
                    text: response.audio_messages.join(" "),
                    priority: response.priority,
                },
                submitted_ms,
            };
            self.enqueue(candidate);
        }

        ThrottleOutcome {
            visual_cues: response.visual_cues.clone(),
            audio: self.poll(now_ms),
        }
    }

    /// Release the waiting message if the interval has elapsed
    pub fn poll(&mut self, now_ms: u64) -> Option<AudioMessage> {
        self.expire_stale(now_ms);
        self.pending.as_ref()?;

        let due = match self.last_audio_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.min_audio_interval_ms,
            None => true,
        };
        if !due {
            return None;
        }

        let pending = self.pending.take()?;
        self.last_audio_ms = Some(now_ms);
        self.stats.audio_delivered += 1;
        Some(pending.message)
    }

    fn expire_stale(&mut self, now_ms: u64) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        let age_ms = now_ms.saturating_sub(pending.submitted_ms);
        if age_ms > self.config.max_audio_age_ms {
            debug!(
                priority = ?pending.message.priority,
                age_ms,
                "Dropping stale audio feedback"
            );
            self.pending = None;
            self.stats.audio_expired += 1;
        }
    }

    /// Earliest time `poll` could change state, when audio is waiting
    #[must_use]
    pub fn next_deadline_ms(&self) -> Option<u64> {
        let pending = self.pending.as_ref()?;
        let eligible = self.last_audio_ms.map_or(pending.submitted_ms, |last| {
            last + self.config.min_audio_interval_ms
        });
        let expires = pending.submitted_ms + self.config.max_audio_age_ms + 1;
        Some(eligible.min(expires))
    }

    fn enqueue(&mut self, candidate: PendingAudio) {
        match &self.pending {
            Some(current) if candidate.message.priority.outranks(current.message.priority) => {
                debug!(
                    queued = ?current.message.priority,
                    incoming = ?candidate.message.priority,
                    "Preempting queued audio feedback"
                );
                self.stats.audio_preempted += 1;
                self.pending = Some(candidate);
            }
            Some(_) => self.stats.audio_suppressed += 1,
            None => self.pending = Some(candidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::models::CueKind;

    fn config() -> DeliveryConfig {
        DeliveryConfig {
            min_audio_interval_ms: 3_000,
            max_audio_age_ms: 2_000,
            queue_capacity: 8,
        }
    }

    fn audio(text: &str, priority: FeedbackPriority) -> FeedbackResponse {
        FeedbackResponse {
            audio_messages: vec![text.to_owned()],
            visual_cues: Vec::new(),
            priority,
        }
    }

    #[test]
    fn test_first_message_is_spoken_immediately() {
        let mut throttle = FeedbackThrottle::new(config());
        let outcome = throttle.submit(&audio("Good rep", FeedbackPriority::Encouragement), 0, 0);
        assert_eq!(outcome.audio.map(|a| a.text), Some("Good rep".to_owned()));
    }

    #[test]
    fn test_interval_holds_back_audio() {
        let mut throttle = FeedbackThrottle::new(config());
        throttle.submit(&audio("first", FeedbackPriority::Advisory), 0, 0);
        let outcome = throttle.submit(&audio("second", FeedbackPriority::Advisory), 1_500, 1_500);
        assert!(outcome.audio.is_none());
        assert_eq!(throttle.next_deadline_ms(), Some(3_000));
        assert_eq!(throttle.poll(3_000).map(|a| a.text), Some("second".to_owned()));
    }

    #[test]
    fn test_higher_priority_preempts_queued_audio() {
        let mut throttle = FeedbackThrottle::new(config());
        throttle.submit(&audio("first", FeedbackPriority::Advisory), 0, 0);
        throttle.submit(&audio("tip", FeedbackPriority::Advisory), 1_200, 1_200);
        throttle.submit(&audio("knees", FeedbackPriority::Critical), 1_500, 1_500);
        throttle.submit(&audio("later tip", FeedbackPriority::Warning), 1_600, 1_600);

        assert_eq!(throttle.pending_priority(), Some(FeedbackPriority::Critical));
        let spoken = throttle.poll(3_000).unwrap();
        assert_eq!(spoken.text, "knees");
        assert_eq!(throttle.stats().audio_preempted, 1);
        assert_eq!(throttle.stats().audio_suppressed, 1);
    }

    #[test]
    fn test_stale_audio_is_dropped() {
        let mut throttle = FeedbackThrottle::new(config());
        throttle.submit(&audio("first", FeedbackPriority::Advisory), 0, 0);
        throttle.submit(&audio("old", FeedbackPriority::Warning), 500, 500);
        assert!(throttle.poll(3_000).is_none());
        assert_eq!(throttle.stats().audio_expired, 1);
        assert!(throttle.pending_priority().is_none());
    }

    #[test]
    fn test_stale_waiting_audio_does_not_block_fresh_message() {
        let mut throttle = FeedbackThrottle::new(config());
        throttle.submit(&audio("first", FeedbackPriority::Advisory), 0, 0);
        throttle.submit(&audio("old", FeedbackPriority::Advisory), 100, 100);
        // "old" is 2400 ms old when the next message arrives
        let outcome = throttle.submit(&audio("fresh", FeedbackPriority::Advisory), 2_500, 2_500);
        assert!(outcome.audio.is_none());
        assert_eq!(throttle.pending_priority(), Some(FeedbackPriority::Advisory));

        assert_eq!(throttle.poll(3_000).map(|a| a.text), Some("fresh".to_owned()));
        let stats = throttle.stats();
        assert_eq!(stats.audio_expired, 1);
        assert_eq!(stats.audio_suppressed, 0);
        assert_eq!(stats.audio_delivered, 2);
    }

    #[test]
    fn test_response_messages_are_spoken_as_one_utterance() {
        let mut throttle = FeedbackThrottle::new(config());
        let response = FeedbackResponse {
            audio_messages: vec!["Chest up.".to_owned(), "Knees out.".to_owned()],
            visual_cues: Vec::new(),
            priority: FeedbackPriority::Warning,
        };
        let spoken = throttle.submit(&response, 0, 0).audio.unwrap();
        assert_eq!(spoken.text, "Chest up. Knees out.");
        assert_eq!(spoken.priority, FeedbackPriority::Warning);
    }

    #[test]
    fn test_visual_cues_bypass_throttle() {
        let mut throttle = FeedbackThrottle::new(config());
        throttle.submit(&audio("first", FeedbackPriority::Advisory), 0, 0);
        let response = FeedbackResponse {
            audio_messages: vec!["again".to_owned()],
            visual_cues: vec![VisualCue::caption(CueKind::PhaseIndicator, "Bottom", 0.5)],
            priority: FeedbackPriority::Advisory,
        };
        let outcome = throttle.submit(&response, 100, 100);
        assert_eq!(outcome.visual_cues.len(), 1);
        assert!(outcome.audio.is_none());
        assert_eq!(throttle.stats().visual_delivered, 1);
    }
}
