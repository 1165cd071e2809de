//! Crossterm painting for the dashboard.
//!
//! Every frame is drawn from scratch; at terminal sizes and refresh rates
//! this is well under any flicker threshold with a buffered writer. The
//! row-building and span-merging logic is separated from the actual
//! queueing so the interesting parts are plain functions over plain data.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;

use multiwatch_core::{diff_lines, match_spans, DiffMode, DiffRow, LineTag, Pane, Span};

use crate::app::App;

/// Emphasis layered onto a line, strongest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    /// The differing region of a changed line.
    Changed,
    /// A highlight-pattern match; wins over `Changed` where they overlap.
    Highlight,
}

/// The rows a pane currently displays: the browsed (or live) run diffed
/// against the reference its diff mode selects.
///
/// While browsing with diff-last, the reference slides along with the
/// browsed run so each historical screen shows what changed at that point.
#[must_use]
pub fn pane_rows(pane: &Pane) -> Vec<DiffRow> {
    let Some(shown) = pane.history.nth_back(pane.browse_offset) else {
        return Vec::new();
    };
    let empty: Vec<String> = Vec::new();
    let reference: &[String] = match pane.diff_mode {
        DiffMode::Off => &empty,
        DiffMode::Last => pane
            .history
            .nth_back(pane.browse_offset + 1)
            .map_or(empty.as_slice(), |record| record.lines.as_slice()),
        DiffMode::Mark => pane.history.mark().unwrap_or(&empty),
    };
    diff_lines(reference, &shown.lines)
}

/// Split `[0, len)` into runs of uniform emphasis.
#[must_use]
pub fn emphasis_runs(len: usize, changed: Option<Span>, highlights: &[Span]) -> Vec<(Span, Emphasis)> {
    if len == 0 {
        return Vec::new();
    }
    let mut boundaries = vec![0, len];
    let mut note = |span: Span| {
        let start = span.start.min(len);
        let end = span.end.min(len);
        if start < end {
            boundaries.push(start);
            boundaries.push(end);
        }
    };
    if let Some(span) = changed {
        note(span);
    }
    for span in highlights {
        note(*span);
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let covers = |span: Option<Span>, at: usize| {
        span.is_some_and(|span| span.start <= at && at < span.end)
    };
    let mut runs: Vec<(Span, Emphasis)> = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let emphasis = if highlights.iter().any(|span| covers(Some(*span), start)) {
            Emphasis::Highlight
        } else if covers(changed, start) {
            Emphasis::Changed
        } else {
            Emphasis::None
        };
        match runs.last_mut() {
            Some((span, last)) if *last == emphasis && span.end == start => span.end = end,
            _ => runs.push((Span { start, end }, emphasis)),
        }
    }
    runs
}

/// Truncate to at most `width` characters, staying on a char boundary.
#[must_use]
pub fn truncate_to_width(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Compact state flags for the pane header.
#[must_use]
pub fn pane_flags(pane: &Pane) -> String {
    let mut flags = String::new();
    if pane.paused {
        flags.push('P');
    }
    if pane.run_state == multiwatch_core::RunState::Running {
        flags.push('*');
    }
    match pane.diff_mode {
        DiffMode::Off => {}
        DiffMode::Last => flags.push('d'),
        DiffMode::Mark => flags.push('D'),
    }
    if pane.highlight.is_some() {
        flags.push('/');
    }
    if pane.on_error.is_some() {
        flags.push('e');
    }
    if pane.on_change.is_some() {
        flags.push('c');
    }
    flags
}

/// Left half of the header: position, interval, and the command line.
#[must_use]
pub fn header_left(pane: &Pane, position: usize) -> String {
    let flags = pane_flags(pane);
    if flags.is_empty() {
        format!("{} [{}s] {}", position, pane.interval.as_secs(), pane.command_line())
    } else {
        format!(
            "{} [{}s {}] {}",
            position,
            pane.interval.as_secs(),
            flags,
            pane.command_line()
        )
    }
}

/// Right half of the header: last error, browse position, or last-run info.
#[must_use]
pub fn header_right(pane: &Pane) -> String {
    if let Some(error) = &pane.last_error {
        return error.clone();
    }
    if pane.is_browsing() {
        let shown = pane.history.nth_back(pane.browse_offset);
        let stamp = shown.map_or_else(String::new, |record| {
            record.finished_at.format("%H:%M:%S").to_string()
        });
        return format!("history -{} {}", pane.browse_offset, stamp);
    }
    match pane.last_run_at {
        Some(at) => {
            let status = match pane.last_exit_status {
                Some(0) => String::new(),
                Some(code) => format!(" exit {code}"),
                None => " killed".to_owned(),
            };
            format!("{}{}", at.format("%H:%M:%S"), status)
        }
        None => "waiting".to_owned(),
    }
}

/// Fit left and right header halves into `width` columns, right-aligned
/// tail, left half truncated first.
#[must_use]
pub fn compose_header(left: &str, right: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let right = truncate_to_width(right, width.saturating_sub(2));
    let right_len = right.chars().count();
    let left_budget = width.saturating_sub(if right_len == 0 { 0 } else { right_len + 1 });
    let left = truncate_to_width(left, left_budget);
    let left_len = left.chars().count();
    let pad = width - left_len - right_len;
    format!("{left}{}{right}", " ".repeat(pad))
}

pub fn draw(out: &mut impl Write, app: &App) -> io::Result<()> {
    queue!(out, Clear(ClearType::All))?;

    let term = app.dashboard.term_size();
    if app.help_overlay_active() {
        return draw_help_overlay(out, term);
    }
    if app.dashboard.panes().is_empty() {
        queue!(
            out,
            MoveTo(2, 1),
            Print("no panes; press 'a' to add a command, '?' for help")
        )?;
    }
    for (position, pane) in app.dashboard.panes().iter().enumerate() {
        let focused = app.dashboard.focused_id() == Some(pane.id);
        draw_pane(out, pane, position + 1, focused)?;
    }
    draw_bottom_line(out, app, term.rows, term.cols)?;
    out.flush()
}

/// Full-screen key reference, used when no pager was available.
fn draw_help_overlay(out: &mut impl Write, term: multiwatch_core::Size) -> io::Result<()> {
    let text = crate::help::help_text();
    let width = usize::from(term.cols);
    for (row, line) in text.lines().enumerate() {
        if row as u16 > term.rows {
            break;
        }
        queue!(
            out,
            MoveTo(0, row as u16),
            Print(truncate_to_width(line, width).to_owned())
        )?;
    }
    queue!(
        out,
        MoveTo(0, term.rows),
        SetAttribute(Attribute::Dim),
        Print("press any key to return"),
        SetAttribute(Attribute::Reset)
    )?;
    out.flush()
}

fn draw_pane(out: &mut impl Write, pane: &Pane, position: usize, focused: bool) -> io::Result<()> {
    let rect = pane.rect;
    if rect.width == 0 || rect.height == 0 {
        return Ok(());
    }
    let width = usize::from(rect.width);

    let header = compose_header(&header_left(pane, position), &header_right(pane), width);
    queue!(out, MoveTo(rect.x, rect.y))?;
    if focused {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    } else {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if pane.last_error.is_some() {
        queue!(out, SetForegroundColor(Color::Red))?;
    }
    queue!(out, Print(header), SetAttribute(Attribute::Reset), ResetColor)?;

    let body_height = usize::from(rect.height) - 1;
    let rows = pane_rows(pane);
    let skip = rows.len().saturating_sub(body_height);
    for (offset, row) in rows.iter().skip(skip).enumerate() {
        let y = rect.y + 1 + offset as u16;
        queue!(out, MoveTo(rect.x, y))?;
        draw_row(out, pane, row, width)?;
    }
    Ok(())
}

fn draw_row(out: &mut impl Write, pane: &Pane, row: &DiffRow, width: usize) -> io::Result<()> {
    match row {
        DiffRow::Removed { text } => {
            let text = truncate_to_width(text, width);
            queue!(
                out,
                SetAttribute(Attribute::Dim),
                SetForegroundColor(Color::Red),
                Print(text),
                SetAttribute(Attribute::Reset),
                ResetColor
            )
        }
        DiffRow::Line { text, tag, changed } => {
            let text = truncate_to_width(text, width);
            let changed = clip_span(*changed, text.len());
            let highlights: Vec<Span> = pane
                .highlight
                .as_ref()
                .map(|pattern| match_spans(pattern, text))
                .unwrap_or_default();

            let base = match tag {
                LineTag::Unchanged => None,
                LineTag::Added => Some(Color::Green),
                LineTag::Changed => Some(Color::Yellow),
            };
            for (span, emphasis) in emphasis_runs(text.len(), changed, &highlights) {
                let segment = &text[span.start..span.end];
                match emphasis {
                    Emphasis::None => match base {
                        Some(color) => queue!(
                            out,
                            SetForegroundColor(color),
                            Print(segment),
                            ResetColor
                        )?,
                        None => queue!(out, Print(segment))?,
                    },
                    Emphasis::Changed => queue!(
                        out,
                        SetAttribute(Attribute::Bold),
                        SetForegroundColor(Color::Red),
                        Print(segment),
                        SetAttribute(Attribute::Reset),
                        ResetColor
                    )?,
                    Emphasis::Highlight => queue!(
                        out,
                        SetAttribute(Attribute::Bold),
                        SetForegroundColor(Color::Magenta),
                        Print(segment),
                        SetAttribute(Attribute::Reset),
                        ResetColor
                    )?,
                }
            }
            Ok(())
        }
    }
}

fn clip_span(span: Option<Span>, len: usize) -> Option<Span> {
    let span = span?;
    let start = span.start.min(len);
    let end = span.end.min(len);
    (start < end).then_some(Span { start, end })
}

fn draw_bottom_line(out: &mut impl Write, app: &App, row: u16, width: u16) -> io::Result<()> {
    queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
    let width = usize::from(width);
    if let Some(prompt) = app.prompt() {
        let line = format!("{}> {}", prompt.label(), prompt.buffer);
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            Print(truncate_to_width(&line, width).to_owned()),
            SetAttribute(Attribute::Reset)
        )?;
        return Ok(());
    }
    let line = app
        .status_line()
        .map(str::to_owned)
        .unwrap_or_else(|| "q:quit  ?:help  a:add  f:run now  d:diff  Space:pause".to_owned());
    queue!(
        out,
        SetAttribute(Attribute::Dim),
        Print(truncate_to_width(&line, width).to_owned()),
        SetAttribute(Attribute::Reset)
    )
}
