pub mod controller;
pub mod recorder;

pub use controller::{SessionController, TrackerStreams};
pub use recorder::SessionRecorder;
