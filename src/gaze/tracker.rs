use chrono::{DateTime, Utc};

use super::seconds_between;

/// Focus/distraction state machine driven by the per-frame on-screen flag.
///
/// A session starts optimistically focused. Distraction intervals open on
/// focused-to-distracted flips and close on the way back; the average only
/// reflects closed intervals.
#[derive(Debug)]
pub struct FocusTracker {
    focused: bool,
    focus_started_at: DateTime<Utc>,
    distraction_started_at: Option<DateTime<Utc>>,
    closed_distractions: Vec<f64>,
    distraction_count: u32,
}

impl FocusTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            focused: true,
            focus_started_at: now,
            distraction_started_at: None,
            closed_distractions: Vec::new(),
            distraction_count: 0,
        }
    }

    pub fn update(&mut self, looking_at_screen: bool, now: DateTime<Utc>) {
        if self.focused && !looking_at_screen {
            self.focused = false;
            self.distraction_started_at = Some(now);
            self.distraction_count += 1;
        } else if !self.focused && looking_at_screen {
            if let Some(started) = self.distraction_started_at.take() {
                self.closed_distractions.push(seconds_between(started, now));
            }
            self.focused = true;
            self.focus_started_at = now;
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Length of the current focus interval; zero while distracted.
    pub fn focus_duration(&self, now: DateTime<Utc>) -> f64 {
        if self.focused {
            seconds_between(self.focus_started_at, now).max(0.0)
        } else {
            0.0
        }
    }

    pub fn distraction_count(&self) -> u32 {
        self.distraction_count
    }

    pub fn avg_distraction_time(&self) -> f64 {
        if self.closed_distractions.is_empty() {
            return 0.0;
        }
        self.closed_distractions.iter().sum::<f64>() / self.closed_distractions.len() as f64
    }

    /// Optimistic resume after a tracking pause: an open distraction is
    /// abandoned without recording a duration and a fresh focus interval
    /// starts now.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if !self.focused {
            self.focused = true;
            self.focus_started_at = now;
            self.distraction_started_at = None;
        }
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn one_closed_interval_with_two_second_average() {
        let mut tracker = FocusTracker::new(at(0));
        tracker.update(true, at(0));
        tracker.update(true, at(1));
        tracker.update(false, at(2));
        tracker.update(false, at(3));
        tracker.update(true, at(4));

        assert_eq!(tracker.distraction_count(), 1);
        assert!((tracker.avg_distraction_time() - 2.0).abs() < 1e-9);
        assert!(tracker.is_focused());
    }

    #[test]
    fn focus_duration_is_zero_while_distracted() {
        let mut tracker = FocusTracker::new(at(0));
        assert_eq!(tracker.focus_duration(at(5)), 5.0);

        tracker.update(false, at(5));
        assert_eq!(tracker.focus_duration(at(8)), 0.0);

        tracker.update(true, at(10));
        assert_eq!(tracker.focus_duration(at(12)), 2.0);
    }

    #[test]
    fn unchanged_observations_are_no_ops() {
        let mut tracker = FocusTracker::new(at(0));
        tracker.update(true, at(1));
        tracker.update(true, at(2));
        assert_eq!(tracker.distraction_count(), 0);
        assert_eq!(tracker.focus_duration(at(3)), 3.0);
    }

    #[test]
    fn average_reflects_only_closed_intervals() {
        let mut tracker = FocusTracker::new(at(0));
        tracker.update(false, at(10));
        tracker.update(true, at(13));
        tracker.update(false, at(20));

        // The second interval is still open.
        assert_eq!(tracker.distraction_count(), 2);
        assert!((tracker.avg_distraction_time() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn resume_abandons_the_open_interval() {
        let mut tracker = FocusTracker::new(at(0));
        tracker.update(false, at(10));
        tracker.resume(at(60));

        assert!(tracker.is_focused());
        assert_eq!(tracker.distraction_count(), 1);
        assert_eq!(tracker.avg_distraction_time(), 0.0);
        assert_eq!(tracker.focus_duration(at(65)), 5.0);
    }

    #[test]
    fn resume_while_focused_keeps_the_interval() {
        let mut tracker = FocusTracker::new(at(0));
        tracker.resume(at(30));
        assert_eq!(tracker.focus_duration(at(40)), 40.0);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut tracker = FocusTracker::new(at(0));
        tracker.update(false, at(5));
        tracker.update(true, at(7));
        tracker.reset(at(100));

        assert!(tracker.is_focused());
        assert_eq!(tracker.distraction_count(), 0);
        assert_eq!(tracker.avg_distraction_time(), 0.0);
        assert_eq!(tracker.focus_duration(at(101)), 1.0);
    }
}
