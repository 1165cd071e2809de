//! Per-pane output history: retained runs, the diff references, and the
//! marked snapshot.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::pane::DiffMode;

/// How many completed runs a pane keeps for browsing and diffing.
pub const HISTORY_CAP: usize = 60;

/// One completed run of a pane's command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub lines: Vec<String>,
    /// `None` when the process was killed by a signal.
    pub exit_status: Option<i32>,
    pub duration: Duration,
    pub finished_at: DateTime<Local>,
}

impl RunRecord {
    #[must_use]
    pub fn new(lines: Vec<String>, exit_status: Option<i32>, duration: Duration) -> Self {
        Self {
            lines,
            exit_status,
            duration,
            finished_at: Local::now(),
        }
    }
}

/// Ring of retained runs plus the user-marked snapshot.
#[derive(Debug, Clone, Default)]
pub struct OutputHistory {
    runs: VecDeque<RunRecord>,
    mark: Option<Vec<String>>,
}

impl OutputHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: RunRecord) {
        if self.runs.len() == HISTORY_CAP {
            self.runs.pop_front();
        }
        self.runs.push_back(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The most recently completed run.
    #[must_use]
    pub fn last(&self) -> Option<&RunRecord> {
        self.runs.back()
    }

    /// The run `offset` steps before the newest; `offset == 0` is the newest.
    #[must_use]
    pub fn nth_back(&self, offset: usize) -> Option<&RunRecord> {
        let len = self.runs.len();
        if offset >= len {
            return None;
        }
        self.runs.get(len - 1 - offset)
    }

    /// Snapshot the newest completed output as the mark. While a run is in
    /// flight this captures the current output, never the pending result.
    pub fn set_mark(&mut self) {
        self.mark = self.last().map(|record| record.lines.clone());
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    #[must_use]
    pub fn mark(&self) -> Option<&[String]> {
        self.mark.as_deref()
    }

    /// The reference text for the given diff mode.
    ///
    /// Diff-last always compares against the run immediately preceding the
    /// newest; diff-mark compares against the marked snapshot regardless of
    /// how many runs have happened since.
    #[must_use]
    pub fn diff_reference(&self, mode: DiffMode) -> Option<&[String]> {
        match mode {
            DiffMode::Off => None,
            DiffMode::Last => self.nth_back(1).map(|record| record.lines.as_slice()),
            DiffMode::Mark => self.mark(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputHistory, RunRecord, HISTORY_CAP};
    use crate::pane::DiffMode;
    use std::time::Duration;

    fn record(text: &str) -> RunRecord {
        RunRecord::new(
            text.lines().map(str::to_owned).collect(),
            Some(0),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn diff_last_compares_newest_against_immediately_preceding_run() {
        let mut history = OutputHistory::new();
        history.push(record("one"));
        history.push(record("two"));
        history.push(record("three"));
        assert_eq!(
            history.diff_reference(DiffMode::Last),
            Some(["two".to_owned()].as_slice())
        );
    }

    #[test]
    fn diff_last_needs_two_runs() {
        let mut history = OutputHistory::new();
        assert_eq!(history.diff_reference(DiffMode::Last), None);
        history.push(record("one"));
        assert_eq!(history.diff_reference(DiffMode::Last), None);
    }

    #[test]
    fn mark_survives_later_runs_until_cleared() {
        let mut history = OutputHistory::new();
        history.push(record("baseline"));
        history.set_mark();
        for i in 0..5 {
            history.push(record(&format!("run-{i}")));
        }
        assert_eq!(
            history.diff_reference(DiffMode::Mark),
            Some(["baseline".to_owned()].as_slice())
        );
        history.clear_mark();
        assert_eq!(history.diff_reference(DiffMode::Mark), None);
    }

    #[test]
    fn remark_resets_the_baseline() {
        let mut history = OutputHistory::new();
        history.push(record("AA"));
        history.set_mark();
        history.push(record("BB"));
        history.set_mark();
        assert_eq!(
            history.diff_reference(DiffMode::Mark),
            Some(["BB".to_owned()].as_slice())
        );
    }

    #[test]
    fn history_is_capped() {
        let mut history = OutputHistory::new();
        for i in 0..(HISTORY_CAP + 10) {
            history.push(record(&format!("run-{i}")));
        }
        assert_eq!(history.len(), HISTORY_CAP);
        // Oldest retained run is the one pushed 59 steps before the newest.
        assert_eq!(
            history.nth_back(HISTORY_CAP - 1).map(|r| r.lines.clone()),
            Some(vec![format!("run-{}", 10)])
        );
        assert_eq!(history.nth_back(HISTORY_CAP), None);
    }

    #[test]
    fn nth_back_zero_is_newest() {
        let mut history = OutputHistory::new();
        history.push(record("old"));
        history.push(record("new"));
        assert_eq!(
            history.nth_back(0).map(|r| r.lines.clone()),
            Some(vec!["new".to_owned()])
        );
        assert_eq!(
            history.nth_back(1).map(|r| r.lines.clone()),
            Some(vec!["old".to_owned()])
        );
    }
}
