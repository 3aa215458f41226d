use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GazeDirection {
    Left,
    Center,
    Right,
    Unknown,
}

impl GazeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeDirection::Left => "LEFT",
            GazeDirection::Center => "CENTER",
            GazeDirection::Right => "RIGHT",
            GazeDirection::Unknown => "UNKNOWN",
        }
    }

    /// CENTER is the only direction that counts as looking at the screen.
    pub fn is_on_screen(self) -> bool {
        matches!(self, GazeDirection::Center)
    }
}

/// Snapshot published by the capture loop after every processed frame.
///
/// `focused` is the instantaneous classification of the current frame;
/// the duration/count fields come from the focus tracker and only move
/// while tracking is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusData {
    pub focused: bool,
    pub direction: GazeDirection,
    pub blinking: bool,
    pub focus_duration: f64,
    pub distraction_count: u32,
    pub avg_distraction_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl FocusData {
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            focused: true,
            direction: GazeDirection::Center,
            blinking: false,
            focus_duration: 0.0,
            distraction_count: 0,
            avg_distraction_time: 0.0,
            timestamp: now,
        }
    }
}
