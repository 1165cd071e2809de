//! Child process execution for multiwatch panes.
//!
//! Each run gets its own worker thread: it spawns the command with stdin
//! detached, drains stdout and stderr off-thread so the child can never
//! block on a full pipe, and polls the exit status against a cancellation
//! flag so outstanding children die with the program. Exactly one
//! `RunCompletion` is delivered per run, success or not.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use multiwatch_core::PaneId;
use thiserror::Error;
use wait_timeout::ChildExt;

/// How often a worker re-checks the cancel flag while the child runs.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captured output is capped to this many trailing lines per stream; a
/// chatty command cannot grow pane history without bound.
pub const MAX_CAPTURED_LINES: usize = 10_000;

/// The command could not even be started. A run that starts and fails is
/// not a spawn error; its output and exit status are captured normally.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("empty command")]
    EmptyCommand,
    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A finished run: combined output lines, exit status, and how long it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// stdout lines followed by stderr lines.
    pub lines: Vec<String>,
    /// `None` when the child was killed by a signal (or cancelled).
    pub exit_status: Option<i32>,
    pub duration: Duration,
}

/// One completion event, sent to the coordinator exactly once per run.
#[derive(Debug)]
pub struct RunCompletion {
    pub pane_id: PaneId,
    pub outcome: Result<RunOutcome, SpawnError>,
}

/// Launch `argv` for `pane_id` on a worker thread.
///
/// The completion arrives on `events`; a send failure means the coordinator
/// is gone and is ignored. Setting `cancel` kills the child and reports the
/// partial capture with `exit_status: None`.
pub fn spawn_run(
    pane_id: PaneId,
    argv: Vec<String>,
    events: Sender<RunCompletion>,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let outcome = execute(&argv, &cancel);
        let _ = events.send(RunCompletion { pane_id, outcome });
    })
}

/// Run `argv` to completion on the calling thread. Used by the one-shot
/// (non-interactive) mode.
pub fn run_blocking(argv: &[String]) -> Result<RunOutcome, SpawnError> {
    execute(argv, &AtomicBool::new(false))
}

fn execute(argv: &[String], cancel: &AtomicBool) -> Result<RunOutcome, SpawnError> {
    let (program, args) = argv.split_first().ok_or(SpawnError::EmptyCommand)?;
    let started = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SpawnError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout = child.stdout.take().map(drain_stream);
    let stderr = child.stderr.take().map(drain_stream);

    let exit_status = loop {
        if cancel.load(Ordering::Relaxed) {
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        match child.wait_timeout(CANCEL_POLL_INTERVAL) {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {}
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
        }
    };

    let mut lines = join_capture(stdout);
    lines.extend(join_capture(stderr));

    Ok(RunOutcome {
        lines,
        exit_status,
        duration: started.elapsed(),
    })
}

fn drain_stream<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = stream.read_to_end(&mut buffer);
        buffer
    })
}

fn join_capture(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<String> {
    let Some(handle) = handle else {
        return Vec::new();
    };
    let buffer = handle.join().unwrap_or_default();
    split_lines(&buffer, MAX_CAPTURED_LINES)
}

/// Decode a captured stream into lines, keeping at most the trailing `limit`.
fn split_lines(buffer: &[u8], limit: usize) -> Vec<String> {
    let text = String::from_utf8_lossy(buffer);
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_owned())
        .collect();
    if lines.len() > limit {
        let drop = lines.len() - limit;
        lines.drain(0..drop);
    }
    lines
}
