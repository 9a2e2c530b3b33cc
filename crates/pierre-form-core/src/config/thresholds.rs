// ABOUTME: Per-exercise, per-mode threshold tables with built-in defaults and YAML overrides
// ABOUTME: Validates hysteresis ordering and that pro tables are stricter than beginner tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Threshold Tables
//!
//! A `ModeThresholds` value is immutable once loaded. Switching mode or
//! exercise swaps the whole table through a new `ExerciseProfile`.

use super::error::ConfigError;
use crate::models::{AngleChannel, ExerciseMode, ExerciseType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const MAX_DEGREES: f64 = 180.0;

/// Hysteresis band for one angle channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelThresholds {
    /// Angle at or above which the movement is back at the top
    pub top_boundary: f64,
    /// Dead zone `(low, high)` between the boundaries
    pub transition_range: (f64, f64),
    /// Angle at or below which the movement is at the bottom
    pub bottom_boundary: f64,
    /// Degrees per severity unit for depth grading
    pub warning_tolerance: f64,
}

impl ChannelThresholds {
    /// Create a band
    #[must_use]
    pub const fn new(top: f64, low: f64, high: f64, bottom: f64, tolerance: f64) -> Self {
        Self {
            top_boundary: top,
            transition_range: (low, high),
            bottom_boundary: bottom,
            warning_tolerance: tolerance,
        }
    }

    /// Lower edge of the dead zone
    #[must_use]
    pub const fn transition_low(&self) -> f64 {
        self.transition_range.0
    }

    /// Upper edge of the dead zone
    #[must_use]
    pub const fn transition_high(&self) -> f64 {
        self.transition_range.1
    }

    /// Enforce `bottom < low < high < top` inside 0-180 with a positive tolerance
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first broken rule
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (low, high) = self.transition_range;
        let values = [self.top_boundary, low, high, self.bottom_boundary];
        if values
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0 || *v > MAX_DEGREES)
        {
            return Err(ConfigError::InvalidRange(
                "boundaries must lie within 0-180 degrees",
            ));
        }
        if !(self.bottom_boundary < low && low < high && high < self.top_boundary) {
            return Err(ConfigError::InvalidRange(
                "boundaries must satisfy bottom < transition low < transition high < top",
            ));
        }
        if !self.warning_tolerance.is_finite() || self.warning_tolerance <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "warning tolerance must be positive",
            ));
        }
        Ok(())
    }
}

/// Limits for landmark-geometry form rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormTolerances {
    /// Maximum torso tilt from vertical (degrees)
    pub max_torso_lean_deg: f64,
    /// Maximum knee travel past the toes, as a fraction of shin length
    pub knee_over_toe_ratio: f64,
    /// Maximum left/right joint angle difference (degrees)
    pub asymmetry_deg: f64,
    /// Minimum shoulder-hip-ankle straightness (degrees)
    pub body_line_deg: f64,
    /// Maximum upper-arm angle away from the torso (degrees)
    pub upper_arm_swing_deg: f64,
    /// Degrees per severity unit for angle-based rules
    pub severity_unit_deg: f64,
}

impl FormTolerances {
    /// Default beginner limits
    #[must_use]
    pub const fn beginner() -> Self {
        Self {
            max_torso_lean_deg: 50.0,
            knee_over_toe_ratio: 0.15,
            asymmetry_deg: 20.0,
            body_line_deg: 160.0,
            upper_arm_swing_deg: 35.0,
            severity_unit_deg: 10.0,
        }
    }

    /// Default pro limits
    #[must_use]
    pub const fn pro() -> Self {
        Self {
            max_torso_lean_deg: 40.0,
            knee_over_toe_ratio: 0.08,
            asymmetry_deg: 12.0,
            body_line_deg: 168.0,
            upper_arm_swing_deg: 25.0,
            severity_unit_deg: 5.0,
        }
    }

    /// All limits positive, angles within 0-180
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValueOutOfRange` for the first bad limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        let angles = [
            self.max_torso_lean_deg,
            self.asymmetry_deg,
            self.body_line_deg,
            self.upper_arm_swing_deg,
            self.severity_unit_deg,
        ];
        if angles
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0 || *v > MAX_DEGREES)
        {
            return Err(ConfigError::ValueOutOfRange(
                "form angle limits must lie within (0, 180] degrees",
            ));
        }
        if !self.knee_over_toe_ratio.is_finite() || self.knee_over_toe_ratio <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "knee over toe ratio must be positive",
            ));
        }
        Ok(())
    }
}

/// Complete threshold table for one exercise in one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeThresholds {
    /// Hysteresis bands per angle channel
    pub channels: BTreeMap<AngleChannel, ChannelThresholds>,
    /// Landmark rule limits
    pub form: FormTolerances,
    /// Minimum severity weight that produces audio (0.0 to 1.0)
    pub feedback_sensitivity: f64,
    /// Idle time after which the next transition resets the attempt
    pub inactivity_timeout_seconds: f64,
}

impl ModeThresholds {
    /// Band for a channel
    #[must_use]
    pub fn channel(&self, channel: AngleChannel) -> Option<&ChannelThresholds> {
        self.channels.get(&channel)
    }

    /// Inactivity timeout in milliseconds
    #[must_use]
    pub fn inactivity_timeout_ms(&self) -> u64 {
        (self.inactivity_timeout_seconds.max(0.0) * 1000.0).round() as u64
    }

    /// Validate every band and scalar, and require the exercise's primary channel
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first broken rule
    pub fn validate(&self, exercise: ExerciseType) -> Result<(), ConfigError> {
        if !self.channels.contains_key(&exercise.primary_channel()) {
            return Err(ConfigError::MissingField("primary channel thresholds"));
        }
        for band in self.channels.values() {
            band.validate()?;
        }
        self.form.validate()?;
        if !(0.0..=1.0).contains(&self.feedback_sensitivity) {
            return Err(ConfigError::ValueOutOfRange(
                "feedback sensitivity must lie within 0.0-1.0",
            ));
        }
        if !self.inactivity_timeout_seconds.is_finite() || self.inactivity_timeout_seconds <= 0.0
        {
            return Err(ConfigError::ValueOutOfRange(
                "inactivity timeout must be positive",
            ));
        }
        Ok(())
    }
}

/// Thresholds selected for the active exercise and mode
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProfile {
    /// Exercise being performed
    pub exercise: ExerciseType,
    /// Active mode
    pub mode: ExerciseMode,
    /// Table in force
    pub thresholds: Arc<ModeThresholds>,
}

impl ExerciseProfile {
    /// Build a profile after validating the table for the exercise
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the table is invalid for `exercise`
    pub fn new(
        exercise: ExerciseType,
        mode: ExerciseMode,
        thresholds: ModeThresholds,
    ) -> Result<Self, ConfigError> {
        thresholds.validate(exercise)?;
        Ok(Self {
            exercise,
            mode,
            thresholds: Arc::new(thresholds),
        })
    }

    /// Band for the exercise's primary channel
    #[must_use]
    pub fn primary(&self) -> Option<&ChannelThresholds> {
        self.thresholds.channel(self.exercise.primary_channel())
    }

    /// Whether two profiles describe the same exercise, mode and table
    #[must_use]
    pub fn same_table(&self, other: &Self) -> bool {
        self.exercise == other.exercise
            && self.mode == other.mode
            && (Arc::ptr_eq(&self.thresholds, &other.thresholds)
                || self.thresholds == other.thresholds)
    }
}

/// Beginner and pro tables for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTable {
    /// Beginner table
    pub beginner: ModeThresholds,
    /// Pro table
    pub pro: ModeThresholds,
}

impl ModeTable {
    /// Table for a mode
    #[must_use]
    pub const fn get(&self, mode: ExerciseMode) -> &ModeThresholds {
        match mode {
            ExerciseMode::Beginner => &self.beginner,
            ExerciseMode::Pro => &self.pro,
        }
    }

    fn validate(&self, exercise: ExerciseType) -> Result<(), ConfigError> {
        self.beginner.validate(exercise)?;
        self.pro.validate(exercise)?;
        let channel = exercise.primary_channel();
        let (Some(beginner), Some(pro)) = (self.beginner.channel(channel), self.pro.channel(channel))
        else {
            return Err(ConfigError::MissingField("primary channel thresholds"));
        };
        // Hold exercises tighten the other way: pro flags a sag sooner
        if exercise.counts_reps() && pro.bottom_boundary > beginner.bottom_boundary {
            return Err(ConfigError::InvalidRange(
                "pro bottom boundary must not be shallower than beginner",
            ));
        }
        if pro.warning_tolerance >= beginner.warning_tolerance {
            return Err(ConfigError::InvalidRange(
                "pro warning tolerance must be lower than beginner",
            ));
        }
        if self.pro.inactivity_timeout_seconds >= self.beginner.inactivity_timeout_seconds {
            return Err(ConfigError::InvalidRange(
                "pro inactivity timeout must be shorter than beginner",
            ));
        }
        if self.pro.feedback_sensitivity > self.beginner.feedback_sensitivity {
            return Err(ConfigError::InvalidRange(
                "pro feedback sensitivity must not exceed beginner",
            ));
        }
        Ok(())
    }
}

/// Threshold tables for every supported exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCatalog {
    /// Tables keyed by exercise
    pub exercises: BTreeMap<ExerciseType, ModeTable>,
}

impl Default for ThresholdCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn single_channel(
    channel: AngleChannel,
    band: ChannelThresholds,
    form: FormTolerances,
    feedback_sensitivity: f64,
    inactivity_timeout_seconds: f64,
) -> ModeThresholds {
    ModeThresholds {
        channels: BTreeMap::from([(channel, band)]),
        form,
        feedback_sensitivity,
        inactivity_timeout_seconds,
    }
}

fn mode_table(exercise: ExerciseType, beginner: ChannelThresholds, pro: ChannelThresholds) -> ModeTable {
    let channel = exercise.primary_channel();
    ModeTable {
        beginner: single_channel(channel, beginner, FormTolerances::beginner(), 0.6, 15.0),
        pro: single_channel(channel, pro, FormTolerances::pro(), 0.3, 10.0),
    }
}

impl ThresholdCatalog {
    /// Built-in tables
    #[must_use]
    pub fn builtin() -> Self {
        let exercises = BTreeMap::from([
            (
                ExerciseType::Squat,
                mode_table(
                    ExerciseType::Squat,
                    ChannelThresholds::new(160.0, 100.0, 150.0, 90.0, 10.0),
                    ChannelThresholds::new(165.0, 90.0, 155.0, 70.0, 5.0),
                ),
            ),
            (
                ExerciseType::Lunge,
                mode_table(
                    ExerciseType::Lunge,
                    ChannelThresholds::new(160.0, 110.0, 150.0, 100.0, 10.0),
                    ChannelThresholds::new(165.0, 100.0, 155.0, 90.0, 5.0),
                ),
            ),
            (
                ExerciseType::Pushup,
                mode_table(
                    ExerciseType::Pushup,
                    ChannelThresholds::new(160.0, 100.0, 150.0, 90.0, 10.0),
                    ChannelThresholds::new(165.0, 90.0, 155.0, 75.0, 5.0),
                ),
            ),
            (
                ExerciseType::BicepCurl,
                mode_table(
                    ExerciseType::BicepCurl,
                    ChannelThresholds::new(150.0, 70.0, 130.0, 50.0, 10.0),
                    ChannelThresholds::new(160.0, 60.0, 140.0, 40.0, 5.0),
                ),
            ),
            (
                ExerciseType::Plank,
                mode_table(
                    ExerciseType::Plank,
                    ChannelThresholds::new(165.0, 150.0, 160.0, 140.0, 10.0),
                    ChannelThresholds::new(170.0, 155.0, 165.0, 145.0, 5.0),
                ),
            ),
        ]);
        Self { exercises }
    }

    /// Parse a YAML document and overlay its exercises onto the built-in tables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed YAML and a validation error
    /// if any resulting table is invalid
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let overrides: Self = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::builtin();
        catalog.exercises.extend(overrides.exercises);
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read and parse a YAML threshold file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as `from_yaml_str`
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            exercises = catalog.exercises.len(),
            "Loaded threshold catalog"
        );
        Ok(catalog)
    }

    /// Serialize the catalog as YAML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if serialization fails
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate every table, including pro-stricter-than-beginner ordering
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for the first invalid table
    pub fn validate(&self) -> Result<(), ConfigError> {
        for exercise in ExerciseType::ALL {
            let table = self
                .exercises
                .get(&exercise)
                .ok_or(ConfigError::MissingField("exercise threshold table"))?;
            table.validate(exercise)?;
        }
        Ok(())
    }

    /// Table for an exercise and mode
    #[must_use]
    pub fn thresholds(&self, exercise: ExerciseType, mode: ExerciseMode) -> Option<&ModeThresholds> {
        self.exercises.get(&exercise).map(|table| table.get(mode))
    }

    /// Validated profile for an exercise and mode
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the exercise has no table or the table is invalid
    pub fn profile(
        &self,
        exercise: ExerciseType,
        mode: ExerciseMode,
    ) -> Result<ExerciseProfile, ConfigError> {
        let thresholds = self
            .thresholds(exercise, mode)
            .ok_or(ConfigError::MissingField("exercise threshold table"))?;
        ExerciseProfile::new(exercise, mode, thresholds.clone())
    }
}
