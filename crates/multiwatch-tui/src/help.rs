//! The key reference, generated from the binding table.
//!
//! Help is shown through the user's `$PAGER` with the dashboard suspended;
//! when no pager can run, the caller falls back to an in-screen overlay
//! that renders the same text.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::keymap::bindings;

/// Pager to use when `$PAGER` is unset.
const DEFAULT_PAGER: &str = "less";

#[must_use]
pub fn help_text() -> String {
    let entries: Vec<(String, String)> = bindings()
        .into_iter()
        .map(|entry| (entry.chord.display(), entry.description))
        .collect();
    let key_width = entries
        .iter()
        .map(|(chord, _)| chord.chars().count())
        .max()
        .unwrap_or(0);

    let mut text = String::from("multiwatch keys\n\n");
    for (chord, description) in entries {
        let pad = " ".repeat(key_width - chord.chars().count());
        text.push_str("  ");
        text.push_str(&chord);
        text.push_str(&pad);
        text.push_str("  ");
        text.push_str(&description);
        text.push('\n');
    }
    text.push_str(
        "\nprompts accept text; Enter confirms, Esc cancels.\n\
         the pane picker waits for a digit; Esc cancels.\n",
    );
    text
}

/// Page `text` through `$PAGER`. The terminal must already be back in its
/// normal state; the caller re-enters the dashboard afterwards.
pub fn show_in_pager(text: &str) -> Result<(), String> {
    let pager = std::env::var("PAGER").unwrap_or_else(|_| DEFAULT_PAGER.to_owned());
    // $PAGER may carry flags ("less -R"), so it goes through the shell.
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&pager)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|err| format!("start pager {pager:?}: {err}"))?;

    if let Some(stdin) = child.stdin.take() {
        let mut stdin = stdin;
        // The pager may quit before reading everything; that is not an error.
        let _ = stdin.write_all(text.as_bytes());
    }
    let status = child
        .wait()
        .map_err(|err| format!("wait for pager {pager:?}: {err}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("pager {pager:?} exited with {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::help_text;
    use crate::keymap::bindings;

    #[test]
    fn help_mentions_every_binding() {
        let text = help_text();
        for entry in bindings() {
            assert!(
                text.contains(&entry.description),
                "help is missing {:?}",
                entry.description
            );
        }
    }

    #[test]
    fn help_lists_each_focus_digit() {
        let text = help_text();
        assert!(text.contains("focus pane 1"));
        assert!(text.contains("focus pane 9"));
    }
}
