pub mod focus;
pub mod session;

pub use focus::{FocusData, GazeDirection};
pub use session::{EyeMovementRecord, FocusPoint, MetricSnapshot, SessionRecord, SessionSummary};
