use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::focus::GazeDirection;

/// One per-sample record of where the user was looking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusPoint {
    pub timestamp: DateTime<Utc>,
    pub is_focused: bool,
    pub gaze_direction: GazeDirection,
}

/// Periodic sample of the tracker-derived metrics, taken on the same
/// cadence as focus points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub focus_duration: f64,
    pub distraction_count: u32,
    pub avg_distraction_time: f64,
}

/// Accumulated saccade magnitudes and fixation durations for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeMovementRecord {
    pub gaze_ratio_changes: Vec<f64>,
    pub fixation_durations: Vec<f64>,
}

impl EyeMovementRecord {
    pub fn is_empty(&self) -> bool {
        self.gaze_ratio_changes.is_empty() && self.fixation_durations.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub distraction_count: u32,
    pub avg_distraction_time: f64,
    pub focus_percentage: f64,
    pub longest_focus_period: f64,
    pub snapshots: Vec<MetricSnapshot>,
    pub focus_points: Vec<FocusPoint>,
    pub eye_movement: Option<EyeMovementRecord>,
}

/// Session row without the bulky series, for history listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub distraction_count: u32,
    pub avg_distraction_time: f64,
    pub focus_percentage: f64,
    pub longest_focus_period: f64,
}

impl From<&SessionRecord> for SessionSummary {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            started_at: record.started_at,
            ended_at: record.ended_at,
            duration_secs: record.duration_secs,
            distraction_count: record.distraction_count,
            avg_distraction_time: record.avg_distraction_time,
            focus_percentage: record.focus_percentage,
            longest_focus_period: record.longest_focus_period,
        }
    }
}
