//! The interactive event loop and terminal lifecycle.
//!
//! A single coordinating thread owns the `App`; worker threads only report
//! back over the completion channel. The loop multiplexes three sources
//! with one `event::poll` timeout: terminal input, run completions, and
//! the next scheduled run.

use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

use multiwatch_core::{RunRecord, RunState, Size};
use multiwatch_runner::{spawn_run, RunCompletion};

use crate::app::{App, Effect, Event};
use crate::args::CliOptions;
use crate::help;
use crate::keymap::{KeyChord, KeyToken};
use crate::render;

/// Longest the loop sleeps between redraws while idle.
const IDLE_POLL_CAP: Duration = Duration::from_millis(500);

/// Poll cap while a run is in flight, to pick completions up promptly.
const BUSY_POLL_CAP: Duration = Duration::from_millis(100);

/// RAII guard for raw mode and the alternate screen. `suspend` hands the
/// terminal back temporarily (for the help pager); drop restores it
/// unconditionally so a panic cannot strand the user's shell.
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub fn new() -> Result<Self, String> {
        let mut session = Self { active: false };
        session.resume()?;
        Ok(session)
    }

    pub fn suspend(&mut self) -> Result<(), String> {
        if self.active {
            execute!(io::stdout(), Show, LeaveAlternateScreen)
                .map_err(|err| format!("leave alternate screen: {err}"))?;
            disable_raw_mode().map_err(|err| format!("disable raw mode: {err}"))?;
            self.active = false;
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), String> {
        if !self.active {
            enable_raw_mode().map_err(|err| format!("enable raw mode: {err}"))?;
            execute!(io::stdout(), EnterAlternateScreen, Hide)
                .map_err(|err| format!("enter alternate screen: {err}"))?;
            self.active = true;
        }
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.active {
            let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// Translate a crossterm key event into the app's chord type.
#[must_use]
pub fn translate_key(key: &event::KeyEvent) -> Option<KeyChord> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let token = match key.code {
        KeyCode::Char(ch) => KeyToken::Char(ch),
        KeyCode::Enter => KeyToken::Enter,
        KeyCode::Esc => KeyToken::Escape,
        KeyCode::Tab => KeyToken::Tab,
        KeyCode::BackTab => KeyToken::Tab,
        KeyCode::Backspace => KeyToken::Backspace,
        KeyCode::Up => KeyToken::Up,
        KeyCode::Down => KeyToken::Down,
        KeyCode::Left => KeyToken::Left,
        KeyCode::Right => KeyToken::Right,
        _ => return None,
    };
    Some(KeyChord {
        token,
        shift: key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    })
}

fn pane_area(cols: u16, rows: u16) -> Size {
    // The bottom terminal row is reserved for the status/prompt line.
    Size {
        cols,
        rows: rows.saturating_sub(1),
    }
}

struct Workers {
    sender: Sender<RunCompletion>,
    cancel: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    fn new(sender: Sender<RunCompletion>) -> Self {
        Self {
            sender,
            cancel: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    fn start(&mut self, pane_id: multiwatch_core::PaneId, argv: Vec<String>) {
        self.reap_finished();
        self.handles.push(spawn_run(
            pane_id,
            argv,
            self.sender.clone(),
            Arc::clone(&self.cancel),
        ));
    }

    /// Join workers that have already finished so a long session does not
    /// accumulate one handle per completed run.
    fn reap_finished(&mut self) {
        let mut live = Vec::with_capacity(self.handles.len() + 1);
        for handle in self.handles.drain(..) {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                live.push(handle);
            }
        }
        self.handles = live;
    }

    /// Kill outstanding children and wait for every worker to finish.
    fn shut_down(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Run the dashboard until the user quits or a completion trigger exits.
pub fn run(options: &CliOptions) -> Result<(), String> {
    let mut session = TerminalSession::new()?;
    let (cols, rows) =
        crossterm::terminal::size().map_err(|err| format!("query terminal size: {err}"))?;

    let mut app = App::new(pane_area(cols, rows), options.min_pane_width, options.interval);
    app.seed(options.commands.clone());

    let (sender, receiver) = mpsc::channel::<RunCompletion>();
    let mut workers = Workers::new(sender);
    let mut out = BufWriter::new(io::stdout());

    let result = event_loop(&mut app, &mut session, &mut workers, &receiver, &mut out);
    workers.shut_down();
    result
}

fn event_loop(
    app: &mut App,
    session: &mut TerminalSession,
    workers: &mut Workers,
    receiver: &Receiver<RunCompletion>,
    out: &mut impl Write,
) -> Result<(), String> {
    loop {
        let now = Instant::now();
        let mut effects = Vec::new();
        while let Ok(completion) = receiver.try_recv() {
            let outcome = match completion.outcome {
                Ok(run) => Ok(RunRecord::new(run.lines, run.exit_status, run.duration)),
                Err(err) => Err(err.to_string()),
            };
            effects.extend(app.update(
                Event::Completion {
                    pane_id: completion.pane_id,
                    outcome,
                },
                now,
            ));
        }
        effects.extend(app.update(Event::Tick, now));
        perform(app, session, workers, effects)?;
        if app.is_quitting() {
            return Ok(());
        }

        render::draw(out, app).map_err(|err| format!("draw dashboard: {err}"))?;

        let timeout = poll_timeout(app, Instant::now());
        let pending = event::poll(timeout).map_err(|err| format!("poll input: {err}"))?;
        if pending {
            loop {
                let term_event = event::read().map_err(|err| format!("read input: {err}"))?;
                let effects = handle_term_event(app, &term_event);
                perform(app, session, workers, effects)?;
                if app.is_quitting() {
                    return Ok(());
                }
                let more = event::poll(Duration::ZERO)
                    .map_err(|err| format!("poll input: {err}"))?;
                if !more {
                    break;
                }
            }
        }
    }
}

fn handle_term_event(app: &mut App, term_event: &TermEvent) -> Vec<Effect> {
    match term_event {
        TermEvent::Key(key) => match translate_key(key) {
            Some(chord) => {
                if chord.ctrl && chord.token == KeyToken::Char('c') {
                    return vec![Effect::Quit];
                }
                app.update(Event::Key(chord), Instant::now())
            }
            None => Vec::new(),
        },
        TermEvent::Resize(cols, rows) => {
            app.update(Event::Resize(pane_area(*cols, *rows)), Instant::now())
        }
        _ => Vec::new(),
    }
}

fn perform(
    app: &mut App,
    session: &mut TerminalSession,
    workers: &mut Workers,
    effects: Vec<Effect>,
) -> Result<(), String> {
    for effect in effects {
        match effect {
            Effect::StartRun { pane_id, argv } => workers.start(pane_id, argv),
            Effect::ShowHelp => show_help(app, session)?,
            Effect::Quit => app.request_quit(),
        }
    }
    Ok(())
}

/// Suspend the dashboard and page the key reference; fall back to the
/// in-screen overlay when the pager cannot run.
fn show_help(app: &mut App, session: &mut TerminalSession) -> Result<(), String> {
    session.suspend()?;
    let paged = help::show_in_pager(&help::help_text());
    session.resume()?;
    if paged.is_err() {
        app.open_help_overlay();
    }
    Ok(())
}

/// How long the loop may sleep: until the next scheduled run, capped so
/// completions and clock updates stay responsive.
fn poll_timeout(app: &App, now: Instant) -> Duration {
    let running = app
        .dashboard
        .panes()
        .iter()
        .any(|pane| pane.run_state == RunState::Running);
    let cap = if running { BUSY_POLL_CAP } else { IDLE_POLL_CAP };
    match app.dashboard.next_wake(now) {
        Some(wake) => wake.saturating_duration_since(now).min(cap),
        None => cap,
    }
}
