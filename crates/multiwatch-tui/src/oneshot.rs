//! Non-interactive mode: run every command once and report.
//!
//! Used when stdout is not a terminal (pipes, cron) and for `--once`. The
//! JSON form is stable output for scripting; the text form mirrors what a
//! shell user would see running the commands by hand.

use serde::Serialize;

use multiwatch_runner::run_blocking;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub command: String,
    /// `None` when the command could not be started or died on a signal;
    /// `error` tells the two apart.
    pub exit_status: Option<i32>,
    pub duration_ms: u128,
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run each command once, in order. The second value is the process exit
/// code: zero only when every command ran and exited zero.
#[must_use]
pub fn run_once_each(commands: &[Vec<String>]) -> (Vec<RunReport>, i32) {
    let mut reports = Vec::with_capacity(commands.len());
    let mut code = 0;
    for command in commands {
        let report = match run_blocking(command) {
            Ok(outcome) => {
                if outcome.exit_status != Some(0) {
                    code = 1;
                }
                RunReport {
                    command: command.join(" "),
                    exit_status: outcome.exit_status,
                    duration_ms: outcome.duration.as_millis(),
                    lines: outcome.lines,
                    error: None,
                }
            }
            Err(err) => {
                code = 1;
                RunReport {
                    command: command.join(" "),
                    exit_status: None,
                    duration_ms: 0,
                    lines: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        };
        reports.push(report);
    }
    (reports, code)
}

#[must_use]
pub fn render_text(reports: &[RunReport]) -> String {
    let mut out = String::new();
    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str("$ ");
        out.push_str(&report.command);
        out.push('\n');
        for line in &report.lines {
            out.push_str(line);
            out.push('\n');
        }
        if let Some(error) = &report.error {
            out.push_str("error: ");
            out.push_str(error);
            out.push('\n');
        } else if report.exit_status != Some(0) {
            match report.exit_status {
                Some(code) => out.push_str(&format!("(exit {code})\n")),
                None => out.push_str("(killed)\n"),
            }
        }
    }
    out
}

pub fn render_json(reports: &[RunReport]) -> Result<String, String> {
    serde_json::to_string_pretty(reports).map_err(|err| format!("encode report: {err}"))
}
