//! Append-only activity log of a giveaway run.
//!
//! Every decision the pipeline takes is recorded here with a timestamp and
//! mirrored to tracing. The final [`RunSummary`] is what operators read after
//! a run; nothing in the core reads it back.
//!
//! With a path configured, the summary file is rewritten after every change,
//! so a killed run still shows which winners were paid. The file is replaced
//! through a temporary sibling and a rename.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::selection::{PaidWinner, Statistics};

/// Category of an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Init,
    Start,
    Fetch,
    Validation,
    Duplicate,
    Winners,
    Processing,
    Transfer,
    Retry,
    Reply,
    Error,
    Complete,
}

/// A single timestamped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Final report of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub video_id: String,
    pub keyword: String,
    pub statistics: Statistics,
    pub winners: Vec<PaidWinner>,
    pub errors: Vec<ActivityEvent>,
    pub events: Vec<ActivityEvent>,
}

#[derive(Debug, Default)]
struct LogState {
    events: Vec<ActivityEvent>,
    errors: Vec<ActivityEvent>,
    winners: Vec<PaidWinner>,
    statistics: Statistics,
}

/// Thread-safe activity log shared through the run context.
#[derive(Debug)]
pub struct ActivityLog {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    video_id: String,
    keyword: String,
    path: Option<PathBuf>,
    state: Mutex<LogState>,
}

impl ActivityLog {
    pub fn new(video_id: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            video_id: video_id.into(),
            keyword: keyword.into(),
            path: None,
            state: Mutex::new(LogState::default()),
        }
    }

    /// Rewrite the summary to `path` after every change.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append an event. `Error` events are also collected into the summary's error list.
    pub fn record(&self, kind: EventKind, message: impl Into<String>, data: Option<Value>) {
        let event = ActivityEvent {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            data,
        };

        if kind == EventKind::Error {
            tracing::warn!(run_id = %self.run_id, kind = ?kind, "{}", event.message);
        } else {
            tracing::info!(run_id = %self.run_id, kind = ?kind, "{}", event.message);
        }

        let mut state = self.lock();
        if kind == EventKind::Error {
            state.errors.push(event.clone());
        }
        state.events.push(event);
        self.persist(&state);
    }

    pub fn set_statistics(&self, statistics: Statistics) {
        let mut state = self.lock();
        state.statistics = statistics;
        self.persist(&state);
    }

    pub fn push_winner(&self, winner: PaidWinner) {
        let mut state = self.lock();
        state.winners.push(winner);
        self.persist(&state);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.lock().events.clone()
    }

    /// Number of events of the given kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary_of(&self.lock())
    }

    fn summary_of(&self, state: &LogState) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            video_id: self.video_id.clone(),
            keyword: self.keyword.clone(),
            statistics: state.statistics.clone(),
            winners: state.winners.clone(),
            errors: state.errors.clone(),
            events: state.events.clone(),
        }
    }

    /// Write failures are logged and otherwise ignored.
    fn persist(&self, state: &LogState) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_summary(path, &self.summary_of(state)) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write activity log");
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut writer = BufWriter::new(File::create(&tmp)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp, path)
}
