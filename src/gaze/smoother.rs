use std::collections::VecDeque;

use crate::models::GazeDirection;

use super::config::GazeConfig;

/// Bounded moving average over recent gaze ratios. Raw per-frame ratios
/// are too jittery to classify directly; the window evens them out.
#[derive(Debug)]
pub struct GazeSmoother {
    window: VecDeque<f64>,
    capacity: usize,
}

impl GazeSmoother {
    pub fn new(capacity: usize) -> Self {
        // A zero-length window would make the mean undefined.
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push one sample and return the mean over the retained window. The
    /// window is never empty after a push, so the mean is always defined.
    pub fn push(&mut self, sample: f64) -> f64 {
        self.window.push_back(sample);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

/// Map a smoothed gaze ratio onto a direction. The CENTER band is closed
/// on both thresholds.
pub fn classify_direction(smoothed_ratio: f64, config: &GazeConfig) -> GazeDirection {
    if smoothed_ratio < config.right_threshold {
        GazeDirection::Right
    } else if smoothed_ratio <= config.left_threshold {
        GazeDirection::Center
    } else {
        GazeDirection::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_bounded() {
        let mut smoother = GazeSmoother::new(10);
        let mut mean = 0.0;
        for _ in 0..11 {
            mean = smoother.push(1.0);
        }
        assert_eq!(mean, 1.0);
        assert_eq!(smoother.len(), 10);
    }

    #[test]
    fn mean_tracks_recent_samples() {
        let mut smoother = GazeSmoother::new(10);
        for _ in 0..10 {
            smoother.push(0.0);
        }
        let mean = smoother.push(10.0);
        assert!((mean - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clear_empties_the_window() {
        let mut smoother = GazeSmoother::new(4);
        smoother.push(2.0);
        smoother.clear();
        assert!(smoother.is_empty());
        assert_eq!(smoother.push(3.0), 3.0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut smoother = GazeSmoother::new(0);
        assert_eq!(smoother.push(2.0), 2.0);
        assert_eq!(smoother.len(), 1);
    }

    #[test]
    fn classification_boundaries_are_center() {
        let config = GazeConfig::default();
        assert_eq!(classify_direction(0.45, &config), GazeDirection::Center);
        assert_eq!(classify_direction(5.5, &config), GazeDirection::Center);
        assert_eq!(classify_direction(0.44, &config), GazeDirection::Right);
        assert_eq!(classify_direction(5.51, &config), GazeDirection::Left);
    }

    #[test]
    fn only_center_counts_as_on_screen() {
        let config = GazeConfig::default();
        assert!(classify_direction(1.0, &config).is_on_screen());
        assert!(!classify_direction(0.2, &config).is_on_screen());
        assert!(!classify_direction(6.0, &config).is_on_screen());
    }
}
