// ABOUTME: Replays recorded pose frames through the form coaching pipeline
// ABOUTME: Reads JSON-lines PoseFrames and prints phase, rep and feedback events as JSON lines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Pose frame replay harness for Pierre Form Coach.
//!
//! Usage:
//! ```bash
//! # Replay a beginner squat recording
//! cargo run --bin form-coach-replay -- --exercise squat --input squat.jsonl
//!
//! # Pro mode from stdin, printing every frame
//! cat pushups.jsonl | cargo run --bin form-coach-replay -- --exercise pushup --mode pro --all-frames
//!
//! # Persist to a JSON store and print the user's trend summary
//! cargo run --bin form-coach-replay -- --exercise lunge --input lunge.jsonl --store-dir ./sessions
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pierre_form_coach::config::FormCoachConfig;
use pierre_form_coach::delivery::{AudioMessage, FeedbackThrottle};
use pierre_form_coach::logging::{LogFormat, LoggingConfig};
use pierre_form_coach::pipeline::{FormPipeline, FrameOutcome, SessionState};
use pierre_form_coach::session_data::SessionDataManager;
use pierre_form_coach::storage::{
    InMemorySessionStore, JsonFileSessionStore, RetryingStore, SessionStore,
};
use pierre_form_core::models::{
    ExerciseMode, ExerciseSessionData, ExerciseType, FeedbackResponse, PoseFrame, RepCounts,
    SessionId, SessionSummary,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "form-coach-replay",
    about = "Pierre Form Coach frame replay",
    long_about = "Run recorded pose landmark frames through phase detection, rep counting and form analysis"
)]
struct ReplayArgs {
    /// Exercise performed in the recording
    #[arg(long, value_enum)]
    exercise: ExerciseArg,

    /// Analysis mode
    #[arg(long, value_enum, default_value = "beginner")]
    mode: ModeArg,

    /// User the session is recorded for
    #[arg(long, default_value = "replay")]
    user: String,

    /// JSON-lines file of pose frames; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// YAML threshold overrides
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Persist the session to a JSON store in this directory
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Print every frame, not only frames with transitions, reps, violations or skips
    #[arg(long)]
    all_frames: bool,

    /// Log output format (json, pretty, compact)
    #[arg(long, default_value = "compact")]
    log_format: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExerciseArg {
    Squat,
    Pushup,
    Plank,
    Lunge,
    BicepCurl,
}

impl From<ExerciseArg> for ExerciseType {
    fn from(arg: ExerciseArg) -> Self {
        match arg {
            ExerciseArg::Squat => Self::Squat,
            ExerciseArg::Pushup => Self::Pushup,
            ExerciseArg::Plank => Self::Plank,
            ExerciseArg::Lunge => Self::Lunge,
            ExerciseArg::BicepCurl => Self::BicepCurl,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Beginner,
    Pro,
}

impl From<ModeArg> for ExerciseMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Beginner => Self::Beginner,
            ModeArg::Pro => Self::Pro,
        }
    }
}

/// One line of replay output
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent<'a> {
    SessionStarted {
        session_id: SessionId,
        feedback: &'a FeedbackResponse,
    },
    Frame {
        outcome: &'a FrameOutcome,
    },
    Spoken {
        timestamp_ms: u64,
        message: &'a AudioMessage,
    },
    SessionFinished {
        counts: &'a RepCounts,
        abandoned_attempt: bool,
        feedback: &'a FeedbackResponse,
    },
    SessionSaved {
        session: &'a ExerciseSessionData,
    },
    Summary {
        summary: &'a SessionSummary,
    },
}

fn emit(event: &ReplayEvent<'_>) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn is_notable(outcome: &FrameOutcome) -> bool {
    outcome.transition.is_some()
        || outcome.rep.rep_completed
        || !outcome.violations.is_empty()
        || outcome.skipped.is_some()
}

async fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Replay state for one recording
struct Replay {
    pipeline: FormPipeline,
    throttle: FeedbackThrottle,
    user: String,
    exercise: ExerciseType,
    mode: ExerciseMode,
    all_frames: bool,
    session: Option<SessionState>,
}

impl Replay {
    fn handle_frame(&mut self, frame: &PoseFrame) -> Result<()> {
        if self.session.is_none() {
            // The session clock starts at the first frame of the recording
            let state = self.pipeline.start_session(
                &self.user,
                self.exercise,
                self.mode,
                frame.timestamp_ms,
            )?;
            emit(&ReplayEvent::SessionStarted {
                session_id: state.id(),
                feedback: &self.pipeline.session_start_feedback(&state),
            })?;
            self.session = Some(state);
        }
        let Some(state) = self.session.as_mut() else {
            return Ok(());
        };

        let outcome = self.pipeline.process_frame(state, frame);
        if self.all_frames || is_notable(&outcome) {
            emit(&ReplayEvent::Frame { outcome: &outcome })?;
        }

        let released =
            self.throttle
                .submit(&outcome.feedback, outcome.timestamp_ms, outcome.timestamp_ms);
        if let Some(message) = released.audio {
            emit(&ReplayEvent::Spoken {
                timestamp_ms: outcome.timestamp_ms,
                message: &message,
            })?;
        }
        Ok(())
    }
}

async fn persist<S: SessionStore + 'static>(
    manager: &SessionDataManager<S>,
    data: ExerciseSessionData,
) -> Result<()> {
    let user_id = data.user_id.clone();
    let exercise = data.exercise_type;
    let saved = manager.complete_session(data).await?;
    emit(&ReplayEvent::SessionSaved { session: &saved })?;
    let summary = manager.generate_summary(&user_id, exercise).await?;
    emit(&ReplayEvent::Summary { summary: &summary })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ReplayArgs::parse();

    let mut logging = LoggingConfig::from_env();
    logging.format = LogFormat::from_str_or_default(&args.log_format);
    logging.init()?;

    let mut config = FormCoachConfig::from_env()?;
    if let Some(path) = args.thresholds.clone() {
        config.thresholds_file = Some(path);
    }
    if let Some(dir) = args.store_dir.clone() {
        config.store_dir = Some(dir);
    }
    config.validate()?;
    config.log_summary();

    let mut replay = Replay {
        pipeline: FormPipeline::from_config(&config)?,
        throttle: FeedbackThrottle::new(config.delivery),
        user: args.user.clone(),
        exercise: args.exercise.into(),
        mode: args.mode.into(),
        all_frames: args.all_frames,
        session: None,
    };

    let mut lines = open_input(args.input.as_ref()).await?.lines();
    let mut line_number = 0_usize;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let frame: PoseFrame = serde_json::from_str(&line)
            .with_context(|| format!("Invalid pose frame on line {line_number}"))?;
        replay.handle_frame(&frame)?;
    }

    let Some(state) = replay.session.take() else {
        warn!("No frames in input, nothing to replay");
        return Ok(());
    };

    let finished = replay.pipeline.finish_session(state);
    emit(&ReplayEvent::SessionFinished {
        counts: &finished.counts,
        abandoned_attempt: finished.abandoned_attempt,
        feedback: &finished.feedback,
    })?;
    info!(
        frames = line_number,
        total_reps = finished.counts.total_reps,
        stats = ?replay.throttle.stats(),
        "Replay complete"
    );

    let store: Arc<dyn SessionStore> = match &config.store_dir {
        Some(dir) => Arc::new(RetryingStore::new(
            JsonFileSessionStore::open(dir).await?,
            config.store_retry,
        )),
        None => Arc::new(InMemorySessionStore::new()),
    };
    let manager = SessionDataManager::new(store).with_retention_limit(config.retention_limit);
    persist(&manager, finished.data).await
}
