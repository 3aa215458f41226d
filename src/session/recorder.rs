use chrono::{DateTime, Utc};

use crate::models::{
    EyeMovementRecord, FocusData, FocusPoint, MetricSnapshot, SessionRecord,
};

/// Cap on persisted focus points per session. Long sessions at camera
/// frame rate would otherwise dwarf the rest of the row.
const MAX_STORED_POINTS: usize = 600;

/// Accumulates one session's focus history between start and end.
///
/// Focus events arrive at frame rate; metric snapshots are sampled on a
/// fixed cadence by the collector task. While tracking is paused the
/// engine republishes a frozen snapshot, so events are deduplicated by
/// timestamp: anything not strictly newer than the last observation is
/// ignored.
pub struct SessionRecorder {
    started_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    latest: FocusData,
    focused_events: u64,
    total_events: u64,
    longest_focus: f64,
    focus_points: Vec<FocusPoint>,
    snapshots: Vec<MetricSnapshot>,
}

impl SessionRecorder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            last_seen: now,
            latest: FocusData::initial(now),
            focused_events: 0,
            total_events: 0,
            longest_focus: 0.0,
            focus_points: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record one focus event from the capture loop.
    pub fn observe(&mut self, data: &FocusData) {
        if data.timestamp <= self.last_seen {
            return;
        }
        self.last_seen = data.timestamp;

        self.total_events += 1;
        if data.focused {
            self.focused_events += 1;
        }
        self.longest_focus = self.longest_focus.max(data.focus_duration);

        self.focus_points.push(FocusPoint {
            timestamp: data.timestamp,
            is_focused: data.focused,
            gaze_direction: data.direction,
        });

        self.latest = data.clone();
    }

    /// Append one metric snapshot from the latest observed focus state.
    pub fn sample(&mut self, now: DateTime<Utc>) {
        self.snapshots.push(MetricSnapshot {
            timestamp: now,
            focus_duration: self.latest.focus_duration,
            distraction_count: self.latest.distraction_count,
            avg_distraction_time: self.latest.avg_distraction_time,
        });
    }

    /// Close the session and build the record to persist.
    pub fn finish(
        self,
        id: String,
        ended_at: DateTime<Utc>,
        eye_movement: Option<EyeMovementRecord>,
    ) -> SessionRecord {
        let focus_percentage = if self.total_events == 0 {
            0.0
        } else {
            self.focused_events as f64 / self.total_events as f64 * 100.0
        };

        SessionRecord {
            id,
            started_at: self.started_at,
            ended_at,
            duration_secs: (ended_at - self.started_at).num_seconds(),
            distraction_count: self.latest.distraction_count,
            avg_distraction_time: self.latest.avg_distraction_time,
            focus_percentage,
            longest_focus_period: self.longest_focus,
            snapshots: self.snapshots,
            focus_points: subsample(self.focus_points, MAX_STORED_POINTS),
            eye_movement,
        }
    }
}

/// Keeps the head, a centered middle block and the tail of a series,
/// dropping the rest. Sessions usually open and close with the most
/// interesting transitions, so the edges are preserved.
fn subsample<T>(items: Vec<T>, max: usize) -> Vec<T> {
    let len = items.len();
    if len <= max {
        return items;
    }

    let head = max / 3;
    let tail = max / 3;
    let middle = max - head - tail;
    let mid_start = (len - middle) / 2;

    items
        .into_iter()
        .enumerate()
        .filter(|(index, _)| {
            *index < head
                || (*index >= mid_start && *index < mid_start + middle)
                || *index >= len - tail
        })
        .map(|(_, item)| item)
        .collect()
}
