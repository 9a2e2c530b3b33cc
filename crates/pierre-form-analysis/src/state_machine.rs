// ABOUTME: Hysteresis-banded exercise phase detection on the primary angle channel
// ABOUTME: Retains the previous phase on noisy input and debounces candidate phases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_form_core::config::{ChannelThresholds, ExerciseProfile};
use pierre_form_core::constants::phase::DEFAULT_MIN_STABLE_FRAMES;
use pierre_form_core::models::{ExerciseAngles, ExercisePhase, StateTransition};
use tracing::debug;

const MAX_DEGREES: f64 = 180.0;

/// Per-session phase tracker
///
/// # Transitions
///
/// - **Top**: to Transition once the angle drops below the dead zone's upper edge.
/// - **Transition**: to Bottom at or below the bottom boundary, back to Top at
///   or above the top boundary.
/// - **Bottom**: to Transition once the angle rises above the dead zone's lower edge.
///
/// Top and Bottom never switch directly. Angles that are NaN or outside
/// 0-180 keep the current phase.
#[derive(Debug, Clone)]
pub struct ExerciseStateMachine {
    phase: ExercisePhase,
    min_stable_frames: u32,
    /// Candidate phase and how many consecutive frames proposed it
    pending: Option<(ExercisePhase, u32)>,
    /// Profile the pending candidate was measured against
    profile: Option<ExerciseProfile>,
}

impl Default for ExerciseStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_STABLE_FRAMES)
    }
}

impl ExerciseStateMachine {
    /// Start at Top; candidates must hold `min_stable_frames` frames (at least one)
    #[must_use]
    pub fn new(min_stable_frames: u32) -> Self {
        Self {
            phase: ExercisePhase::Top,
            min_stable_frames: min_stable_frames.max(1),
            pending: None,
            profile: None,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> ExercisePhase {
        self.phase
    }

    /// Consecutive frames a candidate must hold
    #[must_use]
    pub const fn min_stable_frames(&self) -> u32 {
        self.min_stable_frames
    }

    /// Return to Top and forget any candidate
    pub fn reset(&mut self) {
        self.phase = ExercisePhase::Top;
        self.pending = None;
    }

    /// Feed one frame's angles; returns a transition when the phase changes
    pub fn update(
        &mut self,
        angles: &ExerciseAngles,
        profile: &ExerciseProfile,
        timestamp_ms: u64,
    ) -> Option<StateTransition> {
        if !self
            .profile
            .as_ref()
            .is_some_and(|previous| previous.same_table(profile))
        {
            if self.pending.take().is_some() {
                debug!(
                    exercise = %profile.exercise,
                    mode = %profile.mode,
                    "Threshold table changed, discarding pending phase candidate"
                );
            }
            self.profile = Some(profile.clone());
        }

        let Some(band) = profile.primary() else {
            self.pending = None;
            return None;
        };
        let angle = angles.channel(profile.exercise.primary_channel());
        if !angle.is_finite() || !(0.0..=MAX_DEGREES).contains(&angle) {
            self.pending = None;
            return None;
        }

        let Some(candidate) = next_phase(self.phase, angle, band) else {
            self.pending = None;
            return None;
        };

        let held = match self.pending {
            Some((phase, frames)) if phase == candidate => frames + 1,
            _ => 1,
        };
        if held < self.min_stable_frames {
            self.pending = Some((candidate, held));
            return None;
        }

        self.pending = None;
        let previous = self.phase;
        self.phase = candidate;
        debug!(
            from = %previous,
            to = %candidate,
            angle,
            timestamp_ms,
            "Exercise phase transition"
        );
        Some(StateTransition {
            previous_phase: previous,
            current_phase: candidate,
            timestamp_ms,
            trigger_angles: *angles,
        })
    }
}

/// Phase the angle points to from `current`, or `None` to stay put
fn next_phase(current: ExercisePhase, angle: f64, band: &ChannelThresholds) -> Option<ExercisePhase> {
    match current {
        ExercisePhase::Top => {
            (angle < band.transition_high()).then_some(ExercisePhase::Transition)
        }
        ExercisePhase::Transition => {
            if angle <= band.bottom_boundary {
                Some(ExercisePhase::Bottom)
            } else if angle >= band.top_boundary {
                Some(ExercisePhase::Top)
            } else {
                None
            }
        }
        ExercisePhase::Bottom => {
            (angle > band.transition_low()).then_some(ExercisePhase::Transition)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_form_core::config::ThresholdCatalog;
    use pierre_form_core::models::{ExerciseMode, ExerciseType};

    fn profile(mode: ExerciseMode) -> ExerciseProfile {
        ThresholdCatalog::builtin()
            .profile(ExerciseType::Squat, mode)
            .unwrap()
    }

    fn knee(angle: f64) -> ExerciseAngles {
        ExerciseAngles {
            knee_angle: angle,
            ..ExerciseAngles::straight()
        }
    }

    fn drive(machine: &mut ExerciseStateMachine, profile: &ExerciseProfile, path: &[f64]) -> Vec<ExercisePhase> {
        let mut phases = vec![machine.phase()];
        for (i, angle) in path.iter().enumerate() {
            if let Some(t) = machine.update(&knee(*angle), profile, i as u64 * 33) {
                phases.push(t.current_phase);
            }
        }
        phases
    }

    #[test]
    fn test_beginner_squat_visits_bottom() {
        let mut machine = ExerciseStateMachine::default();
        let phases = drive(
            &mut machine,
            &profile(ExerciseMode::Beginner),
            &[170.0, 120.0, 75.0, 120.0, 170.0],
        );
        assert_eq!(
            phases,
            vec![
                ExercisePhase::Top,
                ExercisePhase::Transition,
                ExercisePhase::Bottom,
                ExercisePhase::Transition,
                ExercisePhase::Top,
            ]
        );
    }

    #[test]
    fn test_pro_squat_never_reaches_bottom() {
        let mut machine = ExerciseStateMachine::default();
        let phases = drive(
            &mut machine,
            &profile(ExerciseMode::Pro),
            &[170.0, 120.0, 75.0, 120.0, 170.0],
        );
        assert!(!phases.contains(&ExercisePhase::Bottom));
        assert_eq!(machine.phase(), ExercisePhase::Top);
    }

    #[test]
    fn test_jitter_in_dead_zone_does_not_toggle() {
        let mut machine = ExerciseStateMachine::default();
        let profile = profile(ExerciseMode::Beginner);
        drive(&mut machine, &profile, &[120.0, 80.0]);
        assert_eq!(machine.phase(), ExercisePhase::Bottom);
        let phases = drive(&mut machine, &profile, &[95.0, 99.0, 92.0, 98.0]);
        assert_eq!(phases, vec![ExercisePhase::Bottom]);
    }

    #[test]
    fn test_top_and_bottom_never_switch_directly() {
        let mut machine = ExerciseStateMachine::default();
        let profile = profile(ExerciseMode::Beginner);
        let t = machine.update(&knee(40.0), &profile, 0).unwrap();
        assert_eq!(t.current_phase, ExercisePhase::Transition);
        let t = machine.update(&knee(40.0), &profile, 33).unwrap();
        assert_eq!(t.current_phase, ExercisePhase::Bottom);
        let t = machine.update(&knee(179.0), &profile, 66).unwrap();
        assert_eq!(t.previous_phase, ExercisePhase::Bottom);
        assert_eq!(t.current_phase, ExercisePhase::Transition);
    }

    #[test]
    fn test_invalid_angles_retain_phase() {
        let mut machine = ExerciseStateMachine::default();
        let profile = profile(ExerciseMode::Beginner);
        for angle in [f64::NAN, f64::INFINITY, -5.0, 400.0] {
            assert!(machine.update(&knee(angle), &profile, 0).is_none());
            assert_eq!(machine.phase(), ExercisePhase::Top);
        }
    }

    #[test]
    fn test_debounce_requires_consecutive_frames() {
        let mut machine = ExerciseStateMachine::new(3);
        let profile = profile(ExerciseMode::Beginner);
        assert!(machine.update(&knee(120.0), &profile, 0).is_none());
        assert!(machine.update(&knee(120.0), &profile, 33).is_none());
        assert!(machine.update(&knee(120.0), &profile, 66).is_some());
        assert_eq!(machine.phase(), ExercisePhase::Transition);
    }

    #[test]
    fn test_profile_change_clears_pending_candidate() {
        let mut machine = ExerciseStateMachine::new(2);
        let beginner = profile(ExerciseMode::Beginner);
        let pro = profile(ExerciseMode::Pro);
        assert!(machine.update(&knee(120.0), &beginner, 0).is_none());
        assert!(machine.update(&knee(120.0), &pro, 33).is_none());
        assert!(machine.update(&knee(120.0), &pro, 66).is_some());
    }

    #[test]
    fn test_reset_returns_to_top() {
        let mut machine = ExerciseStateMachine::default();
        drive(&mut machine, &profile(ExerciseMode::Beginner), &[120.0, 80.0]);
        machine.reset();
        assert_eq!(machine.phase(), ExercisePhase::Top);
    }
}
