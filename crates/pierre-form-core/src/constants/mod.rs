// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Landmark topology, analysis floors, scoring, feedback timing and retention limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants grouped by pipeline domain.

/// Pose landmark topology
pub mod landmarks {
    /// Number of slots in a `BlazePose` landmark frame
    pub const LANDMARK_COUNT: usize = 33;

    /// Default minimum visibility for a joint to take part in angle extraction
    pub const DEFAULT_MIN_VISIBILITY: f64 = 0.5;

    /// Angle reported for a joint whose segments are degenerate or unmeasured
    pub const STRAIGHT_JOINT_DEGREES: f64 = 180.0;

    /// Segment length below which a vector is treated as degenerate
    pub const MIN_SEGMENT_LENGTH: f64 = 1e-4;
}

/// Camera view classification
pub mod view {
    /// Yaw at or below which the body faces the camera
    pub const FRONT_VIEW_MAX_YAW_DEG: f64 = 20.0;

    /// Yaw at or above which the body is side-on to the camera
    pub const SIDE_VIEW_MIN_YAW_DEG: f64 = 70.0;

    /// Confidence below which a frame's verdicts are treated as unreliable
    pub const RELIABLE_CONFIDENCE: f64 = 0.5;

    /// Confidence multiplier when the view is optimal but not the exercise's preferred one
    pub const NON_PREFERRED_VIEW_FACTOR: f64 = 0.8;

    /// Confidence multiplier floor for suboptimal views
    pub const SUBOPTIMAL_VIEW_FACTOR: f64 = 0.6;

    /// Normalized coordinate margin outside which a joint counts as out of frame
    pub const FRAME_MARGIN: f64 = 0.02;

    /// Mean body visibility below which lighting is suspected
    pub const LOW_LIGHT_VISIBILITY: f64 = 0.6;

    /// Yaw assumed when only one side of the torso is visible
    pub const OCCLUDED_SIDE_YAW_DEG: f64 = 90.0;
}

/// Phase detection
pub mod phase {
    /// Default consecutive frames a candidate phase must hold before committing
    pub const DEFAULT_MIN_STABLE_FRAMES: u32 = 1;
}

/// Rep quality scoring
pub mod scoring {
    /// Score for a rep with no violations
    pub const PERFECT_SCORE: f64 = 100.0;
    /// Penalty per distinct low-severity violation
    pub const LOW_PENALTY: f64 = 8.0;
    /// Penalty per distinct medium-severity violation
    pub const MEDIUM_PENALTY: f64 = 25.0;
    /// Penalty per distinct high-severity violation
    pub const HIGH_PENALTY: f64 = 45.0;
    /// Minimum score for an excellent rep
    pub const EXCELLENT_MIN: f64 = 95.0;
    /// Minimum score for a good rep
    pub const GOOD_MIN: f64 = 80.0;
    /// Minimum score for a rep that needs improvement (below is poor)
    pub const NEEDS_IMPROVEMENT_MIN: f64 = 60.0;
}

/// Feedback generation and delivery
pub mod feedback {
    /// Minimum gap between spoken messages (milliseconds)
    pub const DEFAULT_MIN_AUDIO_INTERVAL_MS: u64 = 3_000;
    /// Queued spoken messages older than this are dropped (milliseconds)
    pub const DEFAULT_MAX_AUDIO_AGE_MS: u64 = 2_000;
    /// Bounded capacity of the delivery channel
    pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
    /// Audio messages emitted per response in beginner mode
    pub const BEGINNER_MAX_AUDIO: usize = 1;
    /// Audio messages emitted per response in pro mode
    pub const PRO_MAX_AUDIO: usize = 2;
    /// Rep counts that always trigger a milestone announcement
    pub const MILESTONE_REPS: [u32; 3] = [1, 5, 10];
    /// Beyond the fixed milestones, announce every N-th correct rep
    pub const MILESTONE_EVERY: u32 = 5;
}

/// Session history
pub mod sessions {
    /// Maximum retained sessions per user and exercise
    pub const MAX_RETAINED_SESSIONS: usize = 100;
    /// Improvement rate (percent) above which progress is improving
    pub const IMPROVING_THRESHOLD_PERCENT: f64 = 5.0;
    /// Improvement rate (percent) below which progress is declining
    pub const DECLINING_THRESHOLD_PERCENT: f64 = -5.0;
    /// Violation share of reps above which a rule is a weakness
    pub const WEAKNESS_RATE: f64 = 0.3;
    /// Violation share of reps below which a rule is a strength
    pub const STRENGTH_RATE: f64 = 0.1;
    /// Average quality from which overall form counts as a strength
    pub const STRONG_AVERAGE_QUALITY: f64 = 80.0;
    /// Average view confidence under which camera setup counts as a weakness
    pub const WEAK_CAMERA_QUALITY: f64 = 0.6;
    /// Number of violation kinds listed as common in a summary
    pub const COMMON_VIOLATION_LIMIT: usize = 3;
    /// Export payload format version
    pub const EXPORT_FORMAT_VERSION: u32 = 1;
}
