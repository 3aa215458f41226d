use anyhow::Result;
use image::RgbImage;

/// External frame acquisition capability. `next_frame` blocks until a
/// frame is available; an error means the source is gone and the capture
/// loop should exit.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<RgbImage>;
}
