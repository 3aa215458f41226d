pub mod config;
pub mod segmenter;
pub mod smoother;
pub mod tracker;

pub use config::GazeConfig;
pub use segmenter::{GazeSample, SaccadeEvent, SaccadeSegmenter};
pub use smoother::{classify_direction, GazeSmoother};
pub use tracker::FocusTracker;

use chrono::{DateTime, Utc};

/// Signed seconds between two instants as a float.
pub(crate) fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}
