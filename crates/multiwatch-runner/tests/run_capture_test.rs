#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use multiwatch_core::PaneId;
use multiwatch_runner::{run_blocking, spawn_run, RunCompletion, SpawnError};

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_owned()).collect()
}

#[test]
fn captures_stdout_and_exit_status() {
    let outcome = run_blocking(&argv(&["sh", "-c", "echo one; echo two"])).expect("run");
    assert_eq!(outcome.lines, vec!["one".to_owned(), "two".to_owned()]);
    assert_eq!(outcome.exit_status, Some(0));
}

#[test]
fn captures_stderr_after_stdout() {
    let outcome =
        run_blocking(&argv(&["sh", "-c", "echo out; echo err 1>&2"])).expect("run");
    assert_eq!(outcome.lines, vec!["out".to_owned(), "err".to_owned()]);
}

#[test]
fn nonzero_exit_is_not_an_error() {
    let outcome = run_blocking(&argv(&["sh", "-c", "echo partial; exit 3"])).expect("run");
    assert_eq!(outcome.exit_status, Some(3));
    assert_eq!(outcome.lines, vec!["partial".to_owned()]);
}

#[test]
fn missing_binary_is_a_spawn_error_every_time() {
    let command = argv(&["multiwatch-no-such-binary-zz"]);
    for _ in 0..2 {
        match run_blocking(&command) {
            Err(SpawnError::Spawn { program, .. }) => {
                assert_eq!(program, "multiwatch-no-such-binary-zz");
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
    }
}

#[test]
fn empty_command_is_rejected() {
    assert!(matches!(run_blocking(&[]), Err(SpawnError::EmptyCommand)));
}

#[test]
fn completion_arrives_on_the_channel() {
    let (tx, rx) = mpsc::channel::<RunCompletion>();
    let cancel = Arc::new(AtomicBool::new(false));
    let handle = spawn_run(PaneId(7), argv(&["sh", "-c", "echo hi"]), tx, cancel);

    let completion = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("completion within 5s");
    assert_eq!(completion.pane_id, PaneId(7));
    let outcome = completion.outcome.expect("successful outcome");
    assert_eq!(outcome.lines, vec!["hi".to_owned()]);
    handle.join().expect("worker joins");
}

#[test]
fn cancellation_kills_a_long_running_child() {
    let (tx, rx) = mpsc::channel::<RunCompletion>();
    let cancel = Arc::new(AtomicBool::new(false));
    let started = Instant::now();
    let handle = spawn_run(PaneId(1), argv(&["sleep", "30"]), tx, Arc::clone(&cancel));

    cancel.store(true, Ordering::Relaxed);
    let completion = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("cancelled completion");
    let outcome = completion.outcome.expect("outcome despite cancel");
    assert_eq!(outcome.exit_status, None, "killed child has no exit code");
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "cancellation must not wait for the child's natural exit"
    );
    handle.join().expect("worker joins");
}

#[test]
fn runs_a_script_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("probe.sh");
    {
        let mut file = std::fs::File::create(&path).expect("create script");
        writeln!(file, "#!/bin/sh\necho from-script").expect("write script");
    }
    let outcome = run_blocking(&argv(&["sh", path.to_str().expect("utf8 path")])).expect("run");
    assert_eq!(outcome.lines, vec!["from-script".to_owned()]);
}
