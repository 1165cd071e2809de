//! Line-level diff between two captured outputs, plus pattern highlighting.
//!
//! The diff aligns the reference text and the new text with a line LCS and
//! tags every line of the new text. Lines present only in the reference are
//! carried through as removal markers so the renderer can show where content
//! disappeared. Pattern highlighting is independent of diffing: it produces
//! byte spans over a line for the renderer to emphasize.

use regex::Regex;

/// Tag attached to each line of the newest output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Unchanged,
    Added,
    Changed,
}

/// Half-open byte range within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One row of diffed output, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffRow {
    /// A line of the new text. `changed` is the differing region for
    /// `Changed` lines, when one could be isolated.
    Line {
        text: String,
        tag: LineTag,
        changed: Option<Span>,
    },
    /// A line present only in the reference, at its prior position.
    Removed { text: String },
}

impl DiffRow {
    #[must_use]
    pub fn unchanged(text: &str) -> Self {
        Self::Line {
            text: text.to_owned(),
            tag: LineTag::Unchanged,
            changed: None,
        }
    }

    #[must_use]
    pub fn added(text: &str) -> Self {
        Self::Line {
            text: text.to_owned(),
            tag: LineTag::Added,
            changed: None,
        }
    }
}

// Beyond this many DP cells the quadratic alignment is not worth it and a
// positional comparison is close enough.
const MAX_LCS_CELLS: usize = 4_000_000;

/// Diff `new` against `reference`, producing rows in display order.
///
/// Lines are compared verbatim. With an empty reference every line comes
/// back `Unchanged` so a first run never renders as a wall of additions.
#[must_use]
pub fn diff_lines(reference: &[String], new: &[String]) -> Vec<DiffRow> {
    if reference.is_empty() {
        return new.iter().map(|line| DiffRow::unchanged(line)).collect();
    }

    if reference
        .len()
        .checked_mul(new.len())
        .is_none_or(|cells| cells > MAX_LCS_CELLS)
    {
        return positional_diff(reference, new);
    }

    let matches = lcs_matches(reference, new);
    let mut rows = Vec::with_capacity(new.len());
    let mut ri = 0usize;
    let mut ni = 0usize;

    for (mr, mn) in matches.iter().copied().chain(std::iter::once((
        reference.len(),
        new.len(),
    ))) {
        push_gap(&mut rows, &reference[ri..mr], &new[ni..mn]);
        if mn < new.len() {
            rows.push(DiffRow::unchanged(&new[mn]));
        }
        ri = mr + 1;
        ni = mn + 1;
    }

    rows
}

/// Pair up removal/addition runs between two match anchors.
///
/// Aligned pairs become `Changed` lines; leftovers are additions or removal
/// markers. Removal markers for a replaced block come after the lines that
/// replaced them, which keeps the new text contiguous on screen.
fn push_gap(rows: &mut Vec<DiffRow>, removed: &[String], added: &[String]) {
    let paired = removed.len().min(added.len());
    for i in 0..paired {
        rows.push(DiffRow::Line {
            text: added[i].clone(),
            tag: LineTag::Changed,
            changed: changed_span(&removed[i], &added[i]),
        });
    }
    for line in &added[paired..] {
        rows.push(DiffRow::added(line));
    }
    for line in &removed[paired..] {
        rows.push(DiffRow::Removed { text: line.clone() });
    }
}

/// Fallback when inputs are too large to align: compare position by position.
fn positional_diff(reference: &[String], new: &[String]) -> Vec<DiffRow> {
    let mut rows = Vec::with_capacity(new.len());
    for (i, line) in new.iter().enumerate() {
        match reference.get(i) {
            Some(old) if old == line => rows.push(DiffRow::unchanged(line)),
            Some(old) => rows.push(DiffRow::Line {
                text: line.clone(),
                tag: LineTag::Changed,
                changed: changed_span(old, line),
            }),
            None => rows.push(DiffRow::added(line)),
        }
    }
    for line in reference.iter().skip(new.len()) {
        rows.push(DiffRow::Removed { text: line.clone() });
    }
    rows
}

/// Indices of matched (reference, new) line pairs, leftmost-preferring.
fn lcs_matches(reference: &[String], new: &[String]) -> Vec<(usize, usize)> {
    let rows = reference.len();
    let cols = new.len();
    // lengths[i][j] = LCS length of reference[i..] vs new[j..], flattened.
    let mut lengths = vec![0u32; (rows + 1) * (cols + 1)];
    let idx = |i: usize, j: usize| i * (cols + 1) + j;

    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            lengths[idx(i, j)] = if reference[i] == new[j] {
                lengths[idx(i + 1, j + 1)] + 1
            } else {
                lengths[idx(i + 1, j)].max(lengths[idx(i, j + 1)])
            };
        }
    }

    let mut matches = Vec::new();
    let mut i = 0usize;
    let mut j = 0usize;
    while i < rows && j < cols {
        if reference[i] == new[j] {
            matches.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[idx(i + 1, j)] >= lengths[idx(i, j + 1)] {
            i += 1;
        } else {
            j += 1;
        }
    }
    matches
}

/// Isolate the differing region of a changed line by trimming the common
/// prefix and suffix. Returns `None` when the whole line differs anyway.
fn changed_span(old: &str, new: &str) -> Option<Span> {
    let old_bytes = old.as_bytes();
    let new_bytes = new.as_bytes();

    let mut start = 0usize;
    let max_start = old_bytes.len().min(new_bytes.len());
    while start < max_start && old_bytes[start] == new_bytes[start] {
        start += 1;
    }
    // Keep the span on a char boundary.
    while start > 0 && !new.is_char_boundary(start) {
        start -= 1;
    }

    let mut old_end = old_bytes.len();
    let mut new_end = new_bytes.len();
    while old_end > start && new_end > start && old_bytes[old_end - 1] == new_bytes[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }
    while new_end < new.len() && !new.is_char_boundary(new_end) {
        new_end += 1;
    }

    if start == 0 && new_end == new.len() {
        return None;
    }
    Some(Span {
        start,
        end: new_end.max(start),
    })
}

/// Byte spans of every match of `pattern` in `line`.
#[must_use]
pub fn match_spans(pattern: &Regex, line: &str) -> Vec<Span> {
    pattern
        .find_iter(line)
        .filter(|found| !found.is_empty())
        .map(|found| Span {
            start: found.start(),
            end: found.end(),
        })
        .collect()
}
