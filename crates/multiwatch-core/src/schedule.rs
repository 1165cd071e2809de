//! Scheduling decisions for one pane.
//!
//! Pure functions over the pane's run state and schedule anchor so the
//! policy can be tested with synthetic instants. The coordinator calls
//! `auto_due` on every tick, `manual_allowed` for run-now requests, and
//! `next_due` to compute its wake deadline.

use std::time::{Duration, Instant};

use crate::pane::RunState;

/// Should an automatic run fire now?
///
/// Fires only from `Idle`, never while paused, and only once the interval
/// has elapsed since the schedule anchor. A pane that has never run
/// (`anchor == None`) is due immediately.
#[must_use]
pub fn auto_due(
    run_state: RunState,
    paused: bool,
    anchor: Option<Instant>,
    interval: Duration,
    now: Instant,
) -> bool {
    if run_state != RunState::Idle || paused {
        return false;
    }
    match anchor {
        None => true,
        Some(anchor) => now.saturating_duration_since(anchor) >= interval,
    }
}

/// A manual trigger runs even while paused and even mid-interval, but is a
/// dropped no-op while a run is outstanding: nothing is queued.
#[must_use]
pub fn manual_allowed(run_state: RunState) -> bool {
    run_state == RunState::Idle
}

/// When the next automatic run becomes due, for wake-deadline computation.
///
/// `None` while the pane cannot fire automatically (running or paused).
/// Interval changes show up here immediately because the deadline is always
/// recomputed from the anchor and the current interval.
#[must_use]
pub fn next_due(
    run_state: RunState,
    paused: bool,
    anchor: Option<Instant>,
    interval: Duration,
    now: Instant,
) -> Option<Instant> {
    if run_state != RunState::Idle || paused {
        return None;
    }
    match anchor {
        None => Some(now),
        Some(anchor) => Some(anchor + interval),
    }
}

#[cfg(test)]
mod tests {
    use super::{auto_due, manual_allowed, next_due};
    use crate::pane::RunState;
    use std::time::{Duration, Instant};

    const INTERVAL: Duration = Duration::from_secs(2);

    #[test]
    fn never_ran_pane_is_due_immediately() {
        let now = Instant::now();
        assert!(auto_due(RunState::Idle, false, None, INTERVAL, now));
    }

    #[test]
    fn fires_only_after_interval_elapses() {
        let start = Instant::now();
        let anchor = Some(start);
        assert!(!auto_due(
            RunState::Idle,
            false,
            anchor,
            INTERVAL,
            start + Duration::from_millis(1999)
        ));
        assert!(auto_due(RunState::Idle, false, anchor, INTERVAL, start + INTERVAL));
    }

    #[test]
    fn paused_pane_never_fires_automatically() {
        let start = Instant::now();
        assert!(!auto_due(
            RunState::Idle,
            true,
            Some(start),
            INTERVAL,
            start + Duration::from_secs(3600)
        ));
        assert!(!auto_due(RunState::Idle, true, None, INTERVAL, start));
    }

    #[test]
    fn running_pane_never_double_fires() {
        let start = Instant::now();
        assert!(!auto_due(
            RunState::Running,
            false,
            Some(start),
            INTERVAL,
            start + Duration::from_secs(10)
        ));
    }

    #[test]
    fn manual_trigger_ignores_pause_but_not_running() {
        assert!(manual_allowed(RunState::Idle));
        assert!(!manual_allowed(RunState::Running));
    }

    #[test]
    fn interval_change_applies_against_existing_anchor() {
        let start = Instant::now();
        let anchor = Some(start);
        let now = start + Duration::from_secs(3);
        // At a 5s interval the pane is not due yet...
        assert!(!auto_due(
            RunState::Idle,
            false,
            anchor,
            Duration::from_secs(5),
            now
        ));
        // ...shortening the interval to 2s makes it due at once, evaluated
        // against the same anchor rather than restarting the wait.
        assert!(auto_due(
            RunState::Idle,
            false,
            anchor,
            Duration::from_secs(2),
            now
        ));
    }

    #[test]
    fn next_due_tracks_anchor_plus_interval() {
        let start = Instant::now();
        assert_eq!(
            next_due(RunState::Idle, false, Some(start), INTERVAL, start),
            Some(start + INTERVAL)
        );
        assert_eq!(next_due(RunState::Idle, false, None, INTERVAL, start), Some(start));
        assert_eq!(next_due(RunState::Running, false, Some(start), INTERVAL, start), None);
        assert_eq!(next_due(RunState::Idle, true, Some(start), INTERVAL, start), None);
    }
}
