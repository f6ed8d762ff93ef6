//! Per-course reporting sinks.
//!
//! The pipeline narrates what it does through a [`CourseReporter`]. Reporters
//! are fire-and-forget: nothing they do feeds back into control flow.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CourseId;
use crate::reorganize::{Outcome, ReorgError, Stage};

/// Sink for progress messages, warnings and errors about one course.
pub trait CourseReporter: Send + Sync {
    fn message(&self, text: &str);
    fn warning(&self, text: &str);
    fn error(&self, err: &dyn std::error::Error);
}

/// Reporter that forwards everything to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingReporter {
    course: CourseId,
}

impl TracingReporter {
    pub fn new(course: CourseId) -> Self {
        Self { course }
    }
}

impl CourseReporter for TracingReporter {
    fn message(&self, text: &str) {
        tracing::info!(course = %self.course, "{}", text);
    }

    fn warning(&self, text: &str) {
        tracing::warn!(course = %self.course, "{}", text);
    }

    fn error(&self, err: &dyn std::error::Error) {
        tracing::error!(course = %self.course, "{}", err);
    }
}

/// Severity of a recorded log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Message,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Reporter that records entries for a run report and also logs them.
#[derive(Debug)]
pub struct CourseLog {
    inner: TracingReporter,
    entries: Mutex<Vec<LogEntry>>,
}

impl CourseLog {
    pub fn new(course: CourseId) -> Self {
        Self {
            inner: TracingReporter::new(course),
            entries: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, level: LogLevel, text: String) {
        // A poisoned lock only means another push panicked; the entries are still usable.
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(LogEntry {
            level,
            text,
            at: Utc::now(),
        });
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries().iter().filter(|e| e.level == level).count()
    }
}

impl CourseReporter for CourseLog {
    fn message(&self, text: &str) {
        self.inner.message(text);
        self.push(LogLevel::Message, text.to_string());
    }

    fn warning(&self, text: &str) {
        self.inner.warning(text);
        self.push(LogLevel::Warning, text.to_string());
    }

    fn error(&self, err: &dyn std::error::Error) {
        self.inner.error(err);
        self.push(LogLevel::Error, err.to_string());
    }
}

/// One course's entry in a JSON run report.
#[derive(Debug, Clone, Serialize)]
pub struct CourseReport {
    pub course: CourseId,
    pub finished_at: DateTime<Utc>,
    pub outcome: Option<Outcome>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
    pub log: Vec<LogEntry>,
}

impl CourseReport {
    pub fn from_run(
        course: CourseId,
        result: &Result<Outcome, ReorgError>,
        log: &CourseLog,
    ) -> Self {
        let (outcome, failed_stage, error) = match result {
            Ok(outcome) => (Some(outcome.clone()), None, None),
            Err(e) => (None, Some(e.stage()), Some(e.to_string())),
        };
        Self {
            course,
            finished_at: Utc::now(),
            outcome,
            failed_stage,
            error,
            log: log.entries(),
        }
    }
}
