//! Command-line and environment configuration.
//!
//! Parsing is hand-rolled: the surface is small and the grammar is
//! positional. Flags are recognized until the first command word; after
//! that everything belongs to a command, with `--` starting the next one.

use std::time::Duration;

use multiwatch_core::DEFAULT_MIN_PANE_WIDTH;

/// Default cadence when neither `-n` nor the environment names one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Seconds between runs when the flag is absent.
pub const INTERVAL_ENV: &str = "MULTIWATCH_INTERVAL";

/// Narrowest column a pane may occupy before the layout wraps to a new row.
pub const MIN_PANE_WIDTH_ENV: &str = "MULTIWATCH_MIN_PANE_WIDTH";

pub const USAGE: &str = "\
usage: multiwatch [options] COMMAND [ARG...] [-- COMMAND [ARG...]]...

Runs each COMMAND on its own schedule in a tiled pane. With no terminal
attached (or with --once) every command runs a single time and the captured
output is printed instead.

options:
  -n, --interval SECS   seconds between runs (default 2, minimum 1)
      --once            run each command once and exit
      --json            with --once, print a JSON report
  -h, --help            show this help

environment:
  MULTIWATCH_INTERVAL        default interval in seconds
  MULTIWATCH_MIN_PANE_WIDTH  minimum pane width in columns (default 40)

Press ? inside the dashboard for the key reference.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub commands: Vec<Vec<String>>,
    pub interval: Duration,
    pub min_pane_width: u16,
    pub once: bool,
    pub json: bool,
    pub help: bool,
}

/// Parse `args` (without the program name) against the ambient environment.
pub fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    parse_with_env(args, &env_lookup)
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_with_env(
    args: &[String],
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        commands: Vec::new(),
        interval: env_interval(env)?,
        min_pane_width: env_min_pane_width(env)?,
        once: false,
        json: false,
        help: false,
    };

    let mut iter = args.iter();
    let mut current: Vec<String> = Vec::new();
    let mut in_commands = false;
    while let Some(arg) = iter.next() {
        if arg == "--" {
            in_commands = true;
            if !current.is_empty() {
                options.commands.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !in_commands && current.is_empty() && options.commands.is_empty() {
            match arg.as_str() {
                "-h" | "--help" => {
                    options.help = true;
                    continue;
                }
                "--once" => {
                    options.once = true;
                    continue;
                }
                "--json" => {
                    options.json = true;
                    continue;
                }
                "-n" | "--interval" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| format!("{arg} requires a value in seconds"))?;
                    options.interval = parse_seconds(value)?;
                    continue;
                }
                other if other.starts_with('-') && other.len() > 1 => {
                    return Err(format!("unknown option: {other}"));
                }
                _ => {}
            }
        }
        current.push(arg.clone());
    }
    if !current.is_empty() {
        options.commands.push(current);
    }

    if options.json && !options.once {
        return Err("--json only applies to --once mode".to_owned());
    }
    if options.commands.is_empty() && !options.help {
        return Err(format!("no command given\n\n{USAGE}"));
    }
    Ok(options)
}

fn env_interval(env: &dyn Fn(&str) -> Option<String>) -> Result<Duration, String> {
    match env(INTERVAL_ENV) {
        Some(raw) => parse_seconds(&raw)
            .map_err(|err| format!("{INTERVAL_ENV}: {err}")),
        None => Ok(DEFAULT_INTERVAL),
    }
}

fn env_min_pane_width(env: &dyn Fn(&str) -> Option<String>) -> Result<u16, String> {
    match env(MIN_PANE_WIDTH_ENV) {
        Some(raw) => {
            let width: u16 = raw
                .trim()
                .parse()
                .map_err(|_| format!("{MIN_PANE_WIDTH_ENV}: not a number: {raw:?}"))?;
            if width == 0 {
                return Err(format!("{MIN_PANE_WIDTH_ENV}: must be at least 1"));
            }
            Ok(width)
        }
        None => Ok(DEFAULT_MIN_PANE_WIDTH),
    }
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("not a number of seconds: {raw:?}"))?;
    if secs == 0 {
        return Err("interval must be at least 1 second".to_owned());
    }
    Ok(Duration::from_secs(secs))
}

/// Split a typed command line into argv words, honoring single and double
/// quotes and backslash escapes outside single quotes. No expansion is
/// performed; the words go straight to `exec`.
pub fn split_command_line(text: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => word.push(inner),
                        None => return Err("unterminated single quote".to_owned()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => word.push(escaped),
                            Some(other) => {
                                word.push('\\');
                                word.push(other);
                            }
                            None => return Err("unterminated double quote".to_owned()),
                        },
                        Some(inner) => word.push(inner),
                        None => return Err("unterminated double quote".to_owned()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => word.push(escaped),
                    None => return Err("trailing backslash".to_owned()),
                }
            }
            ch if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            ch => {
                in_word = true;
                word.push(ch);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::{parse_with_env, split_command_line, CliOptions, DEFAULT_INTERVAL};
    use multiwatch_core::DEFAULT_MIN_PANE_WIDTH;
    use std::time::Duration;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| (*part).to_owned()).collect()
    }

    fn parse(parts: &[&str]) -> Result<CliOptions, String> {
        parse_with_env(&args(parts), &no_env)
    }

    #[test]
    fn single_command_with_default_interval() {
        let options = parse(&["date"]).unwrap();
        assert_eq!(options.commands, vec![vec!["date".to_owned()]]);
        assert_eq!(options.interval, DEFAULT_INTERVAL);
        assert_eq!(options.min_pane_width, DEFAULT_MIN_PANE_WIDTH);
    }

    #[test]
    fn double_dash_separates_commands() {
        let options = parse(&["ls", "-la", "--", "df", "-h", "--", "date"]).unwrap();
        assert_eq!(
            options.commands,
            vec![
                args(&["ls", "-la"]),
                args(&["df", "-h"]),
                args(&["date"]),
            ]
        );
    }

    #[test]
    fn interval_flag_applies_before_commands() {
        let options = parse(&["-n", "5", "date"]).unwrap();
        assert_eq!(options.interval, Duration::from_secs(5));
    }

    #[test]
    fn dash_n_after_a_command_word_belongs_to_the_command() {
        let options = parse(&["head", "-n", "5", "file"]).unwrap();
        assert_eq!(options.commands, vec![args(&["head", "-n", "5", "file"])]);
        assert_eq!(options.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(parse(&["-n", "0", "date"]).is_err());
    }

    #[test]
    fn json_requires_once() {
        assert!(parse(&["--json", "date"]).is_err());
        let options = parse(&["--once", "--json", "date"]).unwrap();
        assert!(options.once && options.json);
    }

    #[test]
    fn missing_command_is_an_error_unless_help() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-h"]).unwrap().help);
    }

    #[test]
    fn unknown_flag_is_reported() {
        let err = parse(&["--frobnicate", "date"]).unwrap_err();
        assert!(err.contains("--frobnicate"));
    }

    #[test]
    fn environment_supplies_defaults() {
        let env = |name: &str| match name {
            "MULTIWATCH_INTERVAL" => Some("7".to_owned()),
            "MULTIWATCH_MIN_PANE_WIDTH" => Some("25".to_owned()),
            _ => None,
        };
        let options = parse_with_env(&args(&["date"]), &env).unwrap();
        assert_eq!(options.interval, Duration::from_secs(7));
        assert_eq!(options.min_pane_width, 25);
    }

    #[test]
    fn flag_overrides_environment_interval() {
        let env = |name: &str| (name == "MULTIWATCH_INTERVAL").then(|| "7".to_owned());
        let options = parse_with_env(&args(&["-n", "3", "date"]), &env).unwrap();
        assert_eq!(options.interval, Duration::from_secs(3));
    }

    #[test]
    fn bad_environment_interval_is_an_error() {
        let env = |name: &str| (name == "MULTIWATCH_INTERVAL").then(|| "soon".to_owned());
        assert!(parse_with_env(&args(&["date"]), &env).is_err());
    }

    #[test]
    fn split_handles_quotes_and_escapes() {
        assert_eq!(
            split_command_line(r#"sh -c 'echo "a b"'"#).unwrap(),
            args(&["sh", "-c", r#"echo "a b""#])
        );
        assert_eq!(
            split_command_line(r#"grep "two words" file"#).unwrap(),
            args(&["grep", "two words", "file"])
        );
        assert_eq!(
            split_command_line(r"echo a\ b").unwrap(),
            args(&["echo", "a b"])
        );
        assert_eq!(split_command_line("  ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn split_rejects_unterminated_quotes() {
        assert!(split_command_line("echo 'oops").is_err());
        assert!(split_command_line("echo \"oops").is_err());
    }
}
