pub mod camera;
pub mod frame;
pub mod geometry;
pub mod landmarks;

pub use camera::FrameSource;
pub use frame::{FrameAnnotations, FramePacket};
pub use geometry::{blink_ratio, gaze_ratio};
pub use landmarks::{FaceLandmarks, LandmarkDetector, Point, LEFT_EYE, RIGHT_EYE};
