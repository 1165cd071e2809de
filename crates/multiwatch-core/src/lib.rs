//! Core model for the multiwatch dashboard.
//!
//! Everything here is pure state and decision logic: panes and their
//! schedules, output history and diffing, and screen layout. There are no
//! terminal or subprocess dependencies, and every time-sensitive function
//! takes `now` explicitly so tests never sleep.

pub mod dashboard;
pub mod diff;
pub mod history;
pub mod layout;
pub mod pane;
pub mod schedule;

pub use dashboard::{CompletionEffect, Dashboard, RunKind};
pub use diff::{diff_lines, match_spans, DiffRow, LineTag, Span};
pub use history::{OutputHistory, RunRecord};
pub use layout::{compute_layout, Rect, Size, DEFAULT_MIN_PANE_WIDTH};
pub use pane::{CompletionTrigger, DiffMode, Pane, PaneId, RunState};
