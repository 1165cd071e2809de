//! A pane: one scheduled command plus its display state.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use regex::Regex;

use crate::history::OutputHistory;
use crate::layout::Rect;

/// Stable pane identifier. Monotonically assigned, never reused, so a
/// completion event for a removed pane resolves to "not found" instead of
/// hitting a recycled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(pub u64);

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pane-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    #[default]
    Off,
    Last,
    Mark,
}

/// What to do when a run finishes with an error, or with changed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTrigger {
    Exit,
    Pause,
}

/// Floor for interval adjustments; sub-second cadences are not useful for
/// shelling out.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Pane {
    pub id: PaneId,
    /// argv-style command line; replaced wholesale by an explicit edit.
    pub command: Vec<String>,
    pub interval: Duration,
    pub paused: bool,
    pub run_state: RunState,
    pub history: OutputHistory,
    /// Anchor for the automatic schedule: the instant the last automatic or
    /// schedule-resetting run fired. `None` means due immediately.
    pub schedule_anchor: Option<Instant>,
    /// Wall-clock time of the last completed run, for the header.
    pub last_run_at: Option<DateTime<Local>>,
    pub last_exit_status: Option<i32>,
    pub last_duration: Option<Duration>,
    /// One-line spawn error from the most recent attempt, cleared on the
    /// next successful completion.
    pub last_error: Option<String>,
    pub diff_mode: DiffMode,
    pub highlight: Option<Regex>,
    pub highlight_source: Option<String>,
    /// Written only by the layout engine.
    pub rect: Rect,
    /// History browsing offset: 0 follows live output, n shows the run n
    /// steps before the newest.
    pub browse_offset: usize,
    pub on_error: Option<CompletionTrigger>,
    pub on_change: Option<CompletionTrigger>,
}

impl Pane {
    #[must_use]
    pub fn new(id: PaneId, command: Vec<String>, interval: Duration) -> Self {
        Self {
            id,
            command,
            interval: interval.max(MIN_INTERVAL),
            paused: false,
            run_state: RunState::Idle,
            history: OutputHistory::new(),
            schedule_anchor: None,
            last_run_at: None,
            last_exit_status: None,
            last_duration: None,
            last_error: None,
            diff_mode: DiffMode::Off,
            highlight: None,
            highlight_source: None,
            rect: Rect::default(),
            browse_offset: 0,
            on_error: None,
            on_change: None,
        }
    }

    /// The command as the user typed it.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    #[must_use]
    pub fn is_browsing(&self) -> bool {
        self.browse_offset > 0
    }

    /// Adjust the interval by `delta` whole seconds, clamped at one second.
    pub fn adjust_interval(&mut self, delta: i64) {
        let secs = i64::try_from(self.interval.as_secs()).unwrap_or(i64::MAX);
        let next = secs.saturating_add(delta).max(1);
        self.interval = Duration::from_secs(next.unsigned_abs());
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(MIN_INTERVAL);
    }

    /// Install or clear the highlight pattern. An invalid pattern is
    /// reported back and leaves the current one untouched.
    pub fn set_highlight(&mut self, pattern: Option<&str>) -> Result<(), String> {
        match pattern {
            None => {
                self.highlight = None;
                self.highlight_source = None;
                Ok(())
            }
            Some(source) => {
                let compiled =
                    Regex::new(source).map_err(|err| format!("bad pattern {source:?}: {err}"))?;
                self.highlight = Some(compiled);
                self.highlight_source = Some(source.to_owned());
                Ok(())
            }
        }
    }
}
