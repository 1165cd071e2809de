//! The interactive application state machine.
//!
//! `App` owns the dashboard model plus the input overlays (help, prompts,
//! the mark picker). It consumes abstract events and returns the side
//! effects the runtime must perform; nothing in here touches the terminal
//! or spawns processes, so the whole key-handling surface is testable with
//! synthetic events.

use std::time::{Duration, Instant};

use multiwatch_core::{
    CompletionEffect, CompletionTrigger, Dashboard, PaneId, RunKind, RunRecord, Size,
};

use crate::args::split_command_line;
use crate::keymap::{self, KeyChord, KeyCommand, KeyToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    AddCommand,
    EditCommand,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptState {
    pub kind: PromptKind,
    pub buffer: String,
}

impl PromptState {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::AddCommand => "run",
            PromptKind::EditCommand => "command",
            PromptKind::Pattern => "pattern (empty clears)",
        }
    }
}

/// Input overlays, innermost last. With the stack empty, keys go through
/// the normal-mode keymap.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Help,
    MarkPicker,
    Prompt(PromptState),
}

/// One event from the outside world.
#[derive(Debug)]
pub enum Event {
    Key(KeyChord),
    Resize(Size),
    Completion {
        pane_id: PaneId,
        outcome: Result<RunRecord, String>,
    },
    /// The wake timeout elapsed; fire whatever is due.
    Tick,
}

/// Something the runtime must do on the app's behalf.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    StartRun { pane_id: PaneId, argv: Vec<String> },
    ShowHelp,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub dashboard: Dashboard,
    overlays: Vec<Overlay>,
    status: Option<String>,
    default_interval: Duration,
    quitting: bool,
}

impl App {
    #[must_use]
    pub fn new(term: Size, min_pane_width: u16, default_interval: Duration) -> Self {
        Self {
            dashboard: Dashboard::new(term, min_pane_width),
            overlays: Vec::new(),
            status: None,
            default_interval,
            quitting: false,
        }
    }

    /// Seed the initial panes and focus the first one.
    pub fn seed(&mut self, commands: Vec<Vec<String>>) {
        for command in commands {
            self.dashboard.add_pane(command, self.default_interval);
        }
        self.dashboard.focus_index(0);
    }

    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Quit regardless of mode; used for Ctrl-C.
    pub fn request_quit(&mut self) {
        self.quitting = true;
    }

    #[must_use]
    pub fn status_line(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The active prompt, if any, for the renderer's bottom line.
    #[must_use]
    pub fn prompt(&self) -> Option<&PromptState> {
        self.overlays.iter().rev().find_map(|overlay| match overlay {
            Overlay::Prompt(state) => Some(state),
            _ => None,
        })
    }

    #[must_use]
    pub fn help_overlay_active(&self) -> bool {
        matches!(self.overlays.last(), Some(Overlay::Help))
    }

    #[must_use]
    pub fn mark_picker_active(&self) -> bool {
        matches!(self.overlays.last(), Some(Overlay::MarkPicker))
    }

    /// Fallback help display for when no pager can run.
    pub fn open_help_overlay(&mut self) {
        if !self.help_overlay_active() {
            self.overlays.push(Overlay::Help);
        }
    }

    pub fn update(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        match event {
            Event::Resize(term) => {
                self.dashboard.resize(term);
                Vec::new()
            }
            Event::Tick => self.fire_due(now),
            Event::Completion { pane_id, outcome } => {
                match self.dashboard.apply_completion(pane_id, outcome) {
                    CompletionEffect::ExitRequested => {
                        self.quitting = true;
                        vec![Effect::Quit]
                    }
                    CompletionEffect::Updated | CompletionEffect::Ignored => Vec::new(),
                }
            }
            Event::Key(chord) => match self.overlays.last().cloned() {
                Some(Overlay::Help) => {
                    self.overlays.pop();
                    Vec::new()
                }
                Some(Overlay::MarkPicker) => {
                    self.overlays.pop();
                    self.pick_mark(chord);
                    Vec::new()
                }
                Some(Overlay::Prompt(state)) => self.prompt_key(state, chord, now),
                None => self.normal_key(chord, now),
            },
        }
    }

    fn fire_due(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        for pane_id in self.dashboard.due_pane_ids(now) {
            if let Some(argv) = self.dashboard.start_run(pane_id, RunKind::Auto, now) {
                effects.push(Effect::StartRun { pane_id, argv });
            }
        }
        effects
    }

    fn normal_key(&mut self, chord: KeyChord, now: Instant) -> Vec<Effect> {
        let Some(command) = keymap::resolve(chord) else {
            return Vec::new();
        };
        self.status = None;
        match command {
            KeyCommand::Quit => {
                self.quitting = true;
                return vec![Effect::Quit];
            }
            KeyCommand::Help => return vec![Effect::ShowHelp],
            KeyCommand::FocusIndex(index) => self.dashboard.focus_index(index),
            KeyCommand::FocusNext => self.dashboard.focus_next(),
            KeyCommand::FocusPrev => self.dashboard.focus_prev(),
            KeyCommand::AddPane => self.open_prompt(PromptKind::AddCommand, String::new()),
            KeyCommand::RemovePane => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.remove_pane(id);
                }
            }
            KeyCommand::EditCommand => {
                if let Some(pane) = self.dashboard.focused_pane() {
                    let current = pane.command_line();
                    self.open_prompt(PromptKind::EditCommand, current);
                }
            }
            KeyCommand::EditPattern => {
                if let Some(pane) = self.dashboard.focused_pane() {
                    let current = pane.highlight_source.clone().unwrap_or_default();
                    self.open_prompt(PromptKind::Pattern, current);
                }
            }
            KeyCommand::PauseAll => self.dashboard.toggle_pause_all(),
            KeyCommand::PauseFocused => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.toggle_pause(id);
                }
            }
            KeyCommand::IntervalUp => self.adjust_interval(1),
            KeyCommand::IntervalDown => self.adjust_interval(-1),
            KeyCommand::ToggleDiffLast => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.toggle_diff_last(id);
                }
            }
            KeyCommand::ToggleDiffMark => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.toggle_diff_mark(id);
                }
            }
            KeyCommand::MarkFocused => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.mark_snapshot(id);
                    self.status = Some("marked current output as diff baseline".to_owned());
                }
            }
            KeyCommand::PickMarkPane => {
                if !self.dashboard.panes().is_empty() {
                    self.status = Some("mark which pane? press 1-9, Esc cancels".to_owned());
                    self.overlays.push(Overlay::MarkPicker);
                }
            }
            KeyCommand::ClearMark => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.clear_mark(id);
                }
            }
            KeyCommand::RerunNow => return self.manual_run(RunKind::Manual, now),
            KeyCommand::RerunNowReset => return self.manual_run(RunKind::ManualReset, now),
            KeyCommand::RotateLeft => self.dashboard.rotate(-1),
            KeyCommand::RotateRight => self.dashboard.rotate(1),
            KeyCommand::BrowseOlder => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.browse_older(id);
                }
            }
            KeyCommand::BrowseNewer => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.browse_newer(id);
                }
            }
            KeyCommand::BrowseLive => {
                if let Some(id) = self.dashboard.focused_id() {
                    self.dashboard.browse_live(id);
                }
            }
            KeyCommand::ExitOnError => self.toggle_trigger(true, CompletionTrigger::Exit),
            KeyCommand::PauseOnError => self.toggle_trigger(true, CompletionTrigger::Pause),
            KeyCommand::ExitOnChange => self.toggle_trigger(false, CompletionTrigger::Exit),
            KeyCommand::PauseOnChange => self.toggle_trigger(false, CompletionTrigger::Pause),
        }
        Vec::new()
    }

    fn adjust_interval(&mut self, delta: i64) {
        let Some(id) = self.dashboard.focused_id() else {
            return;
        };
        self.dashboard.adjust_interval(id, delta);
        if let Some(pane) = self.dashboard.pane(id) {
            self.status = Some(format!("interval: {}s", pane.interval.as_secs()));
        }
    }

    fn toggle_trigger(&mut self, on_error: bool, trigger: CompletionTrigger) {
        let Some(id) = self.dashboard.focused_id() else {
            return;
        };
        if on_error {
            self.dashboard.toggle_on_error(id, trigger);
        } else {
            self.dashboard.toggle_on_change(id, trigger);
        }
        if let Some(pane) = self.dashboard.pane(id) {
            let describe = |setting: Option<CompletionTrigger>| match setting {
                Some(CompletionTrigger::Exit) => "exit",
                Some(CompletionTrigger::Pause) => "pause",
                None => "off",
            };
            self.status = Some(format!(
                "on-error: {}, on-change: {}",
                describe(pane.on_error),
                describe(pane.on_change)
            ));
        }
    }

    fn manual_run(&mut self, kind: RunKind, now: Instant) -> Vec<Effect> {
        let Some(pane_id) = self.dashboard.focused_id() else {
            return Vec::new();
        };
        match self.dashboard.start_run(pane_id, kind, now) {
            Some(argv) => vec![Effect::StartRun { pane_id, argv }],
            // Already running; the trigger is dropped.
            None => Vec::new(),
        }
    }

    fn pick_mark(&mut self, chord: KeyChord) {
        if let KeyToken::Char(ch @ '1'..='9') = chord.token {
            let index = (ch as usize) - ('1' as usize);
            if let Some(pane) = self.dashboard.panes().get(index) {
                let id = pane.id;
                self.dashboard.mark_snapshot(id);
                self.status = Some(format!("marked pane {}", index + 1));
                return;
            }
        }
        self.status = None;
    }

    fn open_prompt(&mut self, kind: PromptKind, buffer: String) {
        self.overlays.push(Overlay::Prompt(PromptState { kind, buffer }));
    }

    fn prompt_key(&mut self, mut state: PromptState, chord: KeyChord, now: Instant) -> Vec<Effect> {
        match chord.token {
            KeyToken::Escape => {
                self.overlays.pop();
            }
            KeyToken::Enter => {
                self.overlays.pop();
                return self.commit_prompt(state, now);
            }
            KeyToken::Backspace => {
                state.buffer.pop();
                self.replace_prompt(state);
            }
            KeyToken::Char(ch) if !chord.ctrl && !chord.alt => {
                state.buffer.push(ch);
                self.replace_prompt(state);
            }
            _ => {}
        }
        Vec::new()
    }

    fn replace_prompt(&mut self, state: PromptState) {
        if let Some(slot) = self.overlays.last_mut() {
            *slot = Overlay::Prompt(state);
        }
    }

    fn commit_prompt(&mut self, state: PromptState, now: Instant) -> Vec<Effect> {
        match state.kind {
            PromptKind::AddCommand => {
                match split_command_line(&state.buffer) {
                    Ok(words) if words.is_empty() => {
                        self.status = Some("empty command, nothing added".to_owned());
                    }
                    Ok(words) => {
                        self.dashboard.add_pane(words, self.default_interval);
                    }
                    Err(err) => self.status = Some(err),
                }
                Vec::new()
            }
            PromptKind::EditCommand => {
                let Some(pane_id) = self.dashboard.focused_id() else {
                    return Vec::new();
                };
                match split_command_line(&state.buffer) {
                    Ok(words) if words.is_empty() => {
                        self.status = Some("empty command, keeping the old one".to_owned());
                        Vec::new()
                    }
                    Ok(words) => {
                        self.dashboard.edit_command(pane_id, words);
                        // An edited command runs right away on a fresh interval.
                        match self.dashboard.start_run(pane_id, RunKind::ManualReset, now) {
                            Some(argv) => vec![Effect::StartRun { pane_id, argv }],
                            None => Vec::new(),
                        }
                    }
                    Err(err) => {
                        self.status = Some(err);
                        Vec::new()
                    }
                }
            }
            PromptKind::Pattern => {
                let Some(pane_id) = self.dashboard.focused_id() else {
                    return Vec::new();
                };
                let trimmed = state.buffer.trim();
                let pattern = (!trimmed.is_empty()).then_some(trimmed);
                if let Err(err) = self.dashboard.set_highlight_pattern(pane_id, pattern) {
                    self.status = Some(err);
                }
                Vec::new()
            }
        }
    }
}
