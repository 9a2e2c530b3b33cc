// ABOUTME: Trend and summary computation over a user's retained sessions for one exercise
// ABOUTME: Splits newest-first history in half and compares average quality between halves
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_form_core::constants::sessions::{
    COMMON_VIOLATION_LIMIT, DECLINING_THRESHOLD_PERCENT, IMPROVING_THRESHOLD_PERCENT,
    STRENGTH_RATE, STRONG_AVERAGE_QUALITY, WEAKNESS_RATE, WEAK_CAMERA_QUALITY,
};
use pierre_form_core::models::{
    ExerciseSessionData, ExerciseType, ProgressTrend, SessionSummary, ViolationCount,
    ViolationKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Percentage change thresholds separating the three trends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Improvement rate above which the trend is Improving
    pub improving_threshold_percent: f64,
    /// Improvement rate below which the trend is Declining
    pub declining_threshold_percent: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            improving_threshold_percent: IMPROVING_THRESHOLD_PERCENT,
            declining_threshold_percent: DECLINING_THRESHOLD_PERCENT,
        }
    }
}

impl TrendConfig {
    /// Classify an improvement rate
    #[must_use]
    pub fn classify(&self, improvement_rate: f64) -> ProgressTrend {
        if improvement_rate > self.improving_threshold_percent {
            ProgressTrend::Improving
        } else if improvement_rate < self.declining_threshold_percent {
            ProgressTrend::Declining
        } else {
            ProgressTrend::Stable
        }
    }
}

fn mean_quality(sessions: &[ExerciseSessionData]) -> f64 {
    if sessions.is_empty() {
        return 0.0;
    }
    sessions.iter().map(|s| s.average_rep_quality).sum::<f64>() / sessions.len() as f64
}

/// Percentage change from the older half to the newer half
///
/// `sessions` must be newest first. The newer half is `[0, len/2)`.
#[must_use]
pub fn improvement_rate(sessions: &[ExerciseSessionData]) -> f64 {
    if sessions.len() < 2 {
        return 0.0;
    }
    let (newer, older) = sessions.split_at(sessions.len() / 2);
    let older_avg = mean_quality(older);
    if older_avg == 0.0 {
        return 0.0;
    }
    (mean_quality(newer) - older_avg) / older_avg * 100.0
}

fn violation_totals(sessions: &[ExerciseSessionData]) -> BTreeMap<ViolationKind, u64> {
    let mut totals = BTreeMap::new();
    for entry in sessions.iter().flat_map(|s| &s.form_violations) {
        *totals.entry(entry.kind).or_insert(0_u64) += u64::from(entry.count);
    }
    totals
}

/// Aggregate newest-first `sessions` of one exercise
#[must_use]
pub fn summarize(
    exercise: ExerciseType,
    sessions: &[ExerciseSessionData],
    trend: &TrendConfig,
) -> SessionSummary {
    if sessions.is_empty() {
        return SessionSummary::empty();
    }

    let total_reps: u64 = sessions.iter().map(|s| u64::from(s.total_reps)).sum();
    let average_quality = mean_quality(sessions);
    let rate = improvement_rate(sessions);
    let totals = violation_totals(sessions);

    let mut common: Vec<ViolationCount> = totals
        .iter()
        .map(|(kind, count)| ViolationCount {
            kind: *kind,
            count: u32::try_from(*count).unwrap_or(u32::MAX),
        })
        .collect();
    common.sort_by(|a, b| b.count.cmp(&a.count).then(a.kind.cmp(&b.kind)));
    common.truncate(COMMON_VIOLATION_LIMIT);

    let mut strength_areas = Vec::new();
    let mut weakness_areas = Vec::new();

    if average_quality >= STRONG_AVERAGE_QUALITY {
        strength_areas.push("consistent form quality".to_owned());
    }
    if total_reps > 0 {
        for kind in exercise.monitored_rules() {
            let occurrences = totals.get(kind).copied().unwrap_or(0);
            let rate = occurrences as f64 / total_reps as f64;
            if rate >= WEAKNESS_RATE {
                weakness_areas.push(kind.label().to_owned());
            } else if rate <= STRENGTH_RATE {
                strength_areas.push(kind.label().to_owned());
            }
        }
    }

    let sampled: Vec<f64> = sessions
        .iter()
        .filter(|s| s.view_samples > 0)
        .map(|s| s.camera_view_quality)
        .collect();
    if !sampled.is_empty() && sampled.iter().sum::<f64>() / (sampled.len() as f64) < WEAK_CAMERA_QUALITY
    {
        weakness_areas.push("camera positioning".to_owned());
    }

    SessionSummary {
        total_sessions: sessions.len(),
        total_reps,
        average_quality,
        progress_trend: trend.classify(rate),
        improvement_rate: rate,
        common_violations: common,
        strength_areas,
        weakness_areas,
    }
}
