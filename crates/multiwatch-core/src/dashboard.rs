//! The dashboard aggregate: ordered panes, focus, and every structural or
//! pane-targeted operation.
//!
//! All state is mutated through this type from a single coordinating thread;
//! completions and key commands referencing a pane that has since been
//! removed resolve to a no-op rather than an error.

use std::time::{Duration, Instant};

use chrono::Local;

use crate::history::RunRecord;
use crate::layout::{compute_layout, Size};
use crate::pane::{CompletionTrigger, DiffMode, Pane, PaneId, RunState};
use crate::schedule;

/// Why a run is being started; decides whether the schedule anchor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Fired by the scheduler; the anchor advances to now.
    Auto,
    /// User-requested run that leaves the next scheduled run where it was.
    Manual,
    /// User-requested run that restarts the interval from now.
    ManualReset,
}

/// What a completion did to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// Pane no longer exists (or was not running); nothing to do.
    Ignored,
    /// Pane updated; a redraw is needed.
    Updated,
    /// A completion trigger asked the whole program to exit.
    ExitRequested,
}

#[derive(Debug)]
pub struct Dashboard {
    panes: Vec<Pane>,
    focused: Option<PaneId>,
    term: Size,
    min_pane_width: u16,
    next_id: u64,
}

impl Dashboard {
    #[must_use]
    pub fn new(term: Size, min_pane_width: u16) -> Self {
        Self {
            panes: Vec::new(),
            focused: None,
            term,
            min_pane_width: min_pane_width.max(1),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    #[must_use]
    pub fn term_size(&self) -> Size {
        self.term
    }

    #[must_use]
    pub fn focused_id(&self) -> Option<PaneId> {
        self.focused
    }

    #[must_use]
    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.iter().find(|pane| pane.id == id)
    }

    fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.panes.iter_mut().find(|pane| pane.id == id)
    }

    #[must_use]
    pub fn focused_pane(&self) -> Option<&Pane> {
        self.focused.and_then(|id| self.pane(id))
    }

    fn index_of(&self, id: PaneId) -> Option<usize> {
        self.panes.iter().position(|pane| pane.id == id)
    }

    // ---- structure ----

    /// Create a pane, focus it, and retile. The pane is due immediately.
    pub fn add_pane(&mut self, command: Vec<String>, interval: Duration) -> PaneId {
        let id = PaneId(self.next_id);
        self.next_id += 1;
        self.panes.push(Pane::new(id, command, interval));
        self.focused = Some(id);
        self.relayout();
        id
    }

    /// Remove a pane; focus moves to the pane that sat after it, else the
    /// one before, else nowhere. Unknown ids are a no-op.
    pub fn remove_pane(&mut self, id: PaneId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.panes.remove(index);
        if self.focused == Some(id) {
            self.focused = self
                .panes
                .get(index)
                .or_else(|| self.panes.get(index.wrapping_sub(1)))
                .map(|pane| pane.id);
        }
        self.relayout();
    }

    /// Rotate pane order by `steps` (positive moves the first pane to the
    /// end). Focus follows the pane, not the slot.
    pub fn rotate(&mut self, steps: isize) {
        let len = self.panes.len();
        if len < 2 {
            return;
        }
        let by = steps.rem_euclid(len as isize) as usize;
        self.panes.rotate_left(by);
        self.relayout();
    }

    pub fn set_focus(&mut self, id: PaneId) {
        if self.index_of(id).is_some() {
            self.focused = Some(id);
        }
    }

    /// Focus the pane at display position `index` (0-based).
    pub fn focus_index(&mut self, index: usize) {
        if let Some(pane) = self.panes.get(index) {
            self.focused = Some(pane.id);
        }
    }

    pub fn focus_next(&mut self) {
        self.focus_step(1);
    }

    pub fn focus_prev(&mut self) {
        self.focus_step(-1);
    }

    fn focus_step(&mut self, step: isize) {
        let len = self.panes.len();
        if len == 0 {
            self.focused = None;
            return;
        }
        let current = self
            .focused
            .and_then(|id| self.index_of(id))
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len as isize) as usize;
        self.focused = Some(self.panes[next].id);
    }

    // ---- layout ----

    pub fn resize(&mut self, term: Size) {
        self.term = term;
        self.relayout();
    }

    fn relayout(&mut self) {
        let rects = compute_layout(self.term, self.panes.len(), self.min_pane_width);
        for (pane, rect) in self.panes.iter_mut().zip(rects) {
            pane.rect = rect;
        }
    }

    // ---- scheduling ----

    /// Panes whose automatic run is due at `now`.
    #[must_use]
    pub fn due_pane_ids(&self, now: Instant) -> Vec<PaneId> {
        self.panes
            .iter()
            .filter(|pane| {
                schedule::auto_due(
                    pane.run_state,
                    pane.paused,
                    pane.schedule_anchor,
                    pane.interval,
                    now,
                )
            })
            .map(|pane| pane.id)
            .collect()
    }

    /// Transition a pane to `Running` and hand back the argv to execute.
    ///
    /// Returns `None` when the pane is unknown or already running, which is
    /// how a manual trigger during an active run gets dropped.
    pub fn start_run(&mut self, id: PaneId, kind: RunKind, now: Instant) -> Option<Vec<String>> {
        let pane = self.pane_mut(id)?;
        if !schedule::manual_allowed(pane.run_state) {
            return None;
        }
        if matches!(kind, RunKind::Auto | RunKind::ManualReset) {
            pane.schedule_anchor = Some(now);
        }
        pane.run_state = RunState::Running;
        Some(pane.command.clone())
    }

    /// Earliest instant any pane becomes due, for the event-loop wake time.
    #[must_use]
    pub fn next_wake(&self, now: Instant) -> Option<Instant> {
        self.panes
            .iter()
            .filter_map(|pane| {
                schedule::next_due(
                    pane.run_state,
                    pane.paused,
                    pane.schedule_anchor,
                    pane.interval,
                    now,
                )
            })
            .min()
    }

    /// Fold a finished run back into its pane.
    ///
    /// `outcome` is the captured run or a one-line spawn-failure message.
    /// Completions for removed panes are discarded; completion triggers may
    /// pause the pane or request program exit.
    pub fn apply_completion(
        &mut self,
        id: PaneId,
        outcome: Result<RunRecord, String>,
    ) -> CompletionEffect {
        let Some(pane) = self.pane_mut(id) else {
            return CompletionEffect::Ignored;
        };
        if pane.run_state != RunState::Running {
            return CompletionEffect::Ignored;
        }
        pane.run_state = RunState::Idle;

        let mut errored = false;
        let mut changed = false;
        match outcome {
            Ok(record) => {
                errored = record.exit_status != Some(0);
                changed = pane
                    .history
                    .last()
                    .is_some_and(|previous| previous.lines != record.lines);
                pane.last_run_at = Some(record.finished_at);
                pane.last_exit_status = record.exit_status;
                pane.last_duration = Some(record.duration);
                pane.last_error = None;
                pane.history.push(record);
            }
            Err(message) => {
                errored = true;
                pane.last_error = Some(message);
                pane.last_run_at = Some(Local::now());
                pane.last_exit_status = None;
            }
        }

        let mut exit = false;
        if errored {
            match pane.on_error {
                Some(CompletionTrigger::Exit) => exit = true,
                Some(CompletionTrigger::Pause) => pane.paused = true,
                None => {}
            }
        }
        if changed {
            match pane.on_change {
                Some(CompletionTrigger::Exit) => exit = true,
                Some(CompletionTrigger::Pause) => pane.paused = true,
                None => {}
            }
        }

        if exit {
            CompletionEffect::ExitRequested
        } else {
            CompletionEffect::Updated
        }
    }

    // ---- pane-targeted commands (unknown ids are no-ops) ----

    pub fn toggle_pause(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.paused = !pane.paused;
        }
    }

    /// Pause every pane, or resume every pane if all are already paused.
    pub fn toggle_pause_all(&mut self) {
        let all_paused = !self.panes.is_empty() && self.panes.iter().all(|pane| pane.paused);
        for pane in &mut self.panes {
            pane.paused = !all_paused;
        }
    }

    pub fn set_interval(&mut self, id: PaneId, interval: Duration) {
        if let Some(pane) = self.pane_mut(id) {
            pane.set_interval(interval);
        }
    }

    pub fn adjust_interval(&mut self, id: PaneId, delta: i64) {
        if let Some(pane) = self.pane_mut(id) {
            pane.adjust_interval(delta);
        }
    }

    /// Snapshot the pane's newest output as its mark and switch the pane to
    /// diff-mark mode.
    pub fn mark_snapshot(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.history.set_mark();
            pane.diff_mode = DiffMode::Mark;
        }
    }

    pub fn clear_mark(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.history.clear_mark();
            if pane.diff_mode == DiffMode::Mark {
                pane.diff_mode = DiffMode::Off;
            }
        }
    }

    pub fn set_diff_mode(&mut self, id: PaneId, mode: DiffMode) {
        if let Some(pane) = self.pane_mut(id) {
            pane.diff_mode = mode;
        }
    }

    pub fn toggle_diff_last(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.diff_mode = if pane.diff_mode == DiffMode::Last {
                DiffMode::Off
            } else {
                DiffMode::Last
            };
        }
    }

    pub fn toggle_diff_mark(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.diff_mode = if pane.diff_mode == DiffMode::Mark {
                DiffMode::Off
            } else {
                DiffMode::Mark
            };
        }
    }

    pub fn set_highlight_pattern(
        &mut self,
        id: PaneId,
        pattern: Option<&str>,
    ) -> Result<(), String> {
        match self.pane_mut(id) {
            Some(pane) => pane.set_highlight(pattern),
            None => Ok(()),
        }
    }

    /// Replace the pane's command. The caller decides whether to rerun.
    pub fn edit_command(&mut self, id: PaneId, command: Vec<String>) {
        if let Some(pane) = self.pane_mut(id) {
            if !command.is_empty() {
                pane.command = command;
            }
        }
    }

    pub fn toggle_on_error(&mut self, id: PaneId, trigger: CompletionTrigger) {
        if let Some(pane) = self.pane_mut(id) {
            pane.on_error = if pane.on_error == Some(trigger) {
                None
            } else {
                Some(trigger)
            };
        }
    }

    pub fn toggle_on_change(&mut self, id: PaneId, trigger: CompletionTrigger) {
        if let Some(pane) = self.pane_mut(id) {
            pane.on_change = if pane.on_change == Some(trigger) {
                None
            } else {
                Some(trigger)
            };
        }
    }

    // ---- history browsing ----

    pub fn browse_older(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            let max = pane.history.len().saturating_sub(1);
            if pane.browse_offset < max {
                pane.browse_offset += 1;
            }
        }
    }

    pub fn browse_newer(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.browse_offset = pane.browse_offset.saturating_sub(1);
        }
    }

    pub fn browse_live(&mut self, id: PaneId) {
        if let Some(pane) = self.pane_mut(id) {
            pane.browse_offset = 0;
        }
    }
}
