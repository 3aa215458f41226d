//! Webcam-based focus tracking.
//!
//! Frames from a camera source are reduced to eye landmarks, turned into
//! blink and gaze ratios, and smoothed into a gaze direction. A session
//! layer segments eye movement, tracks focus and distraction, records
//! periodic metric snapshots to SQLite, and can ask an LLM for short
//! focus advice based on the live numbers.

pub mod advice;
pub mod db;
pub mod engine;
pub mod gaze;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod session;
pub mod settings;
pub mod vision;

pub use advice::{AdviceModel, AdvicePipeline, GeminiClient};
pub use db::Database;
pub use engine::{CameraFactory, DetectorFactory, EngineController};
pub use gaze::GazeConfig;
pub use metrics::{MetricsCollector, MetricsReport};
pub use models::{FocusData, GazeDirection, SessionRecord, SessionSummary};
pub use session::{SessionController, TrackerStreams};
pub use settings::SettingsStore;
pub use vision::{FramePacket, FrameSource, LandmarkDetector};
