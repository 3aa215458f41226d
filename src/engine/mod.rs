pub mod controller;
pub mod loop_worker;
pub mod pipeline;

pub use controller::EngineController;
pub use pipeline::FramePipeline;

use anyhow::Result;
use tokio::sync::oneshot;

use crate::models::EyeMovementRecord;
use crate::vision::{FrameSource, LandmarkDetector};

/// Builds the camera inside the capture thread. Device handles are often
/// not `Send`, so construction is deferred until the thread owns them.
pub type CameraFactory = Box<dyn FnOnce() -> Result<Box<dyn FrameSource>> + Send + 'static>;

/// Builds the landmark detector inside the capture thread, for the same
/// reason as [`CameraFactory`].
pub type DetectorFactory = Box<dyn FnOnce() -> Result<Box<dyn LandmarkDetector>> + Send + 'static>;

/// Control messages applied by the capture loop between frames.
pub(crate) enum EngineCommand {
    StartTracking,
    PauseTracking,
    Reset,
    MovementSnapshot {
        reply: oneshot::Sender<EyeMovementRecord>,
    },
}
