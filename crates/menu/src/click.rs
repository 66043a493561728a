//! Single vs. double click on the tray icon.
//!
//! Some shells report the first click of a double click as a plain click.
//! A click therefore only counts once the double-click interval has passed
//! without a second one.

use std::time::{Duration, Instant};

/// Fallback double-click interval.
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// What a resolved click means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Single click: open the dashboard.
    OpenDashboard,
    /// Double click: toggle the daemon.
    Toggle,
}

/// Resolves tray icon clicks into [`ClickAction`]s.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    interval: Duration,
    pending: Option<Instant>,
}

impl ClickTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    /// Records a click. It resolves in [`poll`](Self::poll) unless a double
    /// click arrives first.
    pub fn click(&mut self, now: Instant) {
        self.pending = Some(now + self.interval);
    }

    /// Records a double click, cancelling the pending single click.
    pub fn double_click(&mut self) -> ClickAction {
        self.pending = None;
        ClickAction::Toggle
    }

    /// Returns the single-click action once its interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ClickAction> {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                Some(ClickAction::OpenDashboard)
            }
            _ => None,
        }
    }

    /// When the pending click resolves, for scheduling the next wake-up.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_CLICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn single_click_resolves_after_interval() {
        let mut t = ClickTracker::new(300 * MS);
        let t0 = Instant::now();
        t.click(t0);

        assert_eq!(t.poll(t0 + 100 * MS), None);
        assert_eq!(t.deadline(), Some(t0 + 300 * MS));
        assert_eq!(t.poll(t0 + 300 * MS), Some(ClickAction::OpenDashboard));
        // Resolved once.
        assert_eq!(t.poll(t0 + 400 * MS), None);
        assert_eq!(t.deadline(), None);
    }

    #[test]
    fn double_click_cancels_single() {
        let mut t = ClickTracker::new(300 * MS);
        let t0 = Instant::now();
        t.click(t0);
        assert_eq!(t.double_click(), ClickAction::Toggle);
        assert_eq!(t.poll(t0 + 1000 * MS), None);
    }

    #[test]
    fn second_click_restarts_window() {
        let mut t = ClickTracker::new(300 * MS);
        let t0 = Instant::now();
        t.click(t0);
        t.click(t0 + 200 * MS);
        assert_eq!(t.poll(t0 + 300 * MS), None);
        assert_eq!(t.poll(t0 + 500 * MS), Some(ClickAction::OpenDashboard));
    }

    #[test]
    fn idle_tracker_does_nothing() {
        let mut t = ClickTracker::default();
        assert_eq!(t.poll(Instant::now()), None);
        assert_eq!(t.deadline(), None);
    }
}
