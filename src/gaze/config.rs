/// Configuration for the gaze pipeline with tunable thresholds.
#[derive(Debug, Clone)]
pub struct GazeConfig {
    /// Moving-average window over per-frame gaze ratios
    pub smoothing_window: usize,

    /// Smoothed ratio below this reads as looking right (off screen)
    pub right_threshold: f64,
    /// Smoothed ratio above this reads as looking left (off screen)
    pub left_threshold: f64,

    /// Average blink ratio above this counts as a blink frame
    pub blink_threshold: f64,

    /// Smoothed-ratio delta that counts as a candidate saccade
    pub saccade_delta: f64,
    /// Consecutive candidate frames required to confirm a saccade
    pub saccade_confirmation: u32,
    /// Fixations shorter than this are discarded (seconds)
    pub min_fixation_secs: f64,

    /// Gray value above which a sclera pixel counts as white
    pub sclera_threshold: u8,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 10,
            right_threshold: 0.45,
            left_threshold: 5.5,
            blink_threshold: 5.2,
            saccade_delta: 0.8,
            saccade_confirmation: 2,
            min_fixation_secs: 0.3,
            sclera_threshold: 70,
        }
    }
}
