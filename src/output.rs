//! Rendering of run events for the command line.

use crate::domain::model::{ProbeState, RunEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Formats one event as a single line, or `None` when the format skips it.
pub fn format_event(format: OutputFormat, event: &RunEvent) -> Option<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(event).ok(),
        OutputFormat::Human => format_human(event),
    }
}

fn format_human(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::Aborted { reason } => Some(format!("run aborted: {}", reason)),
        RunEvent::Cancelled { progress } => Some(format!("[{}] run cancelled", progress)),
        RunEvent::Transition {
            domain,
            state,
            progress,
        } => match state {
            ProbeState::Pending | ProbeState::Running => None,
            ProbeState::Succeeded { status, elapsed_ms } => Some(format!(
                "[{}] {:<40} {:>5} {:>6} ms",
                progress, domain, status, elapsed_ms
            )),
            ProbeState::Failed { error, elapsed_ms } => Some(format!(
                "[{}] {:<40} {:>5} {:>6} ms  {}",
                progress, domain, "ERR", elapsed_ms, error
            )),
        },
    }
}

/// Totals folded from a run's events.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: Option<String>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total: 0,
            succeeded: 0,
            failed: 0,
            aborted: None,
            cancelled: false,
        }
    }

    pub fn record(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Aborted { reason } => self.aborted = Some(reason.clone()),
            RunEvent::Cancelled { .. } => self.cancelled = true,
            RunEvent::Transition {
                state, progress, ..
            } => {
                self.total = progress.total;
                match state {
                    ProbeState::Succeeded { .. } => self.succeeded += 1,
                    ProbeState::Failed { .. } => self.failed += 1,
                    ProbeState::Pending | ProbeState::Running => {}
                }
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string(self).unwrap_or_default(),
            OutputFormat::Human => {
                let mut line = format!(
                    "{} probed, {} responded, {} failed",
                    self.succeeded + self.failed,
                    self.succeeded,
                    self.failed
                );
                if let Some(finished) = self.finished_at {
                    let elapsed = finished - self.started_at;
                    line.push_str(&format!(" in {} ms", elapsed.num_milliseconds()));
                }
                if self.cancelled {
                    let skipped = self.total.saturating_sub(self.succeeded + self.failed);
                    line.push_str(&format!(" (cancelled, {} not probed)", skipped));
                }
                line
            }
        }
    }
}
