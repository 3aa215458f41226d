use chrono::{DateTime, Utc};

use crate::models::EyeMovementRecord;

use super::config::GazeConfig;
use super::seconds_between;

/// One smoothed gaze observation, fed to the segmenter per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    pub ratio: f64,
    pub timestamp: DateTime<Utc>,
}

/// A confirmed rapid gaze shift. `ended_fixation_secs` carries the length
/// of the fixation the saccade terminated, when it was long enough to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaccadeEvent {
    pub magnitude: f64,
    pub ended_fixation_secs: Option<f64>,
}

/// Splits the smoothed ratio stream into saccades and fixations.
///
/// A ratio delta above the configured threshold is only a candidate; it
/// must repeat on consecutive observations to confirm, which debounces the
/// jitter that survives smoothing. Everything between confirmed saccades
/// is one fixation.
#[derive(Debug)]
pub struct SaccadeSegmenter {
    change_delta: f64,
    confirmation_needed: u32,
    min_fixation_secs: f64,

    last_ratio: Option<f64>,
    pending_changes: u32,
    fixation_started_at: Option<DateTime<Utc>>,

    gaze_ratio_changes: Vec<f64>,
    fixation_durations: Vec<f64>,
}

impl SaccadeSegmenter {
    pub fn new(config: &GazeConfig) -> Self {
        Self {
            change_delta: config.saccade_delta,
            confirmation_needed: config.saccade_confirmation.max(1),
            min_fixation_secs: config.min_fixation_secs,
            last_ratio: None,
            pending_changes: 0,
            fixation_started_at: None,
            gaze_ratio_changes: Vec::new(),
            fixation_durations: Vec::new(),
        }
    }

    /// Feed one observation. The first seeds the baseline and opens a
    /// fixation; later ones may confirm a saccade.
    pub fn observe(&mut self, sample: GazeSample) -> Option<SaccadeEvent> {
        let Some(last) = self.last_ratio else {
            self.last_ratio = Some(sample.ratio);
            self.fixation_started_at = Some(sample.timestamp);
            return None;
        };

        let delta = (sample.ratio - last).abs();
        self.last_ratio = Some(sample.ratio);

        if delta <= self.change_delta {
            self.pending_changes = 0;
            return None;
        }

        self.pending_changes += 1;
        if self.pending_changes < self.confirmation_needed {
            return None;
        }

        self.gaze_ratio_changes.push(delta);

        let ended_fixation_secs = self
            .fixation_started_at
            .map(|started| seconds_between(started, sample.timestamp))
            .filter(|duration| *duration >= self.min_fixation_secs);
        if let Some(duration) = ended_fixation_secs {
            self.fixation_durations.push(duration);
        }

        self.fixation_started_at = Some(sample.timestamp);
        self.pending_changes = 0;

        Some(SaccadeEvent {
            magnitude: delta,
            ended_fixation_secs,
        })
    }

    pub fn saccade_count(&self) -> usize {
        self.gaze_ratio_changes.len()
    }

    pub fn fixation_count(&self) -> usize {
        self.fixation_durations.len()
    }

    pub fn movement_record(&self) -> EyeMovementRecord {
        EyeMovementRecord {
            gaze_ratio_changes: self.gaze_ratio_changes.clone(),
            fixation_durations: self.fixation_durations.clone(),
        }
    }

    pub fn reset(&mut self) {
        self.last_ratio = None;
        self.pending_changes = 0;
        self.fixation_started_at = None;
        self.gaze_ratio_changes.clear();
        self.fixation_durations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn feed(segmenter: &mut SaccadeSegmenter, trace: &[(f64, i64)]) -> Vec<SaccadeEvent> {
        trace
            .iter()
            .filter_map(|&(ratio, millis)| {
                segmenter.observe(GazeSample {
                    ratio,
                    timestamp: at(millis),
                })
            })
            .collect()
    }

    #[test]
    fn identical_ratios_produce_nothing() {
        let mut segmenter = SaccadeSegmenter::new(&GazeConfig::default());
        let events = feed(&mut segmenter, &[(1.0, 0), (1.0, 1000), (1.0, 2000)]);
        assert!(events.is_empty());
        assert!(segmenter.movement_record().is_empty());
    }

    #[test]
    fn single_step_change_is_not_confirmed() {
        let mut segmenter = SaccadeSegmenter::new(&GazeConfig::default());
        let events = feed(
            &mut segmenter,
            &[(1.0, 0), (1.0, 1000), (2.0, 2000), (2.0, 3000)],
        );
        assert!(events.is_empty());
        assert_eq!(segmenter.saccade_count(), 0);
    }

    #[test]
    fn sustained_shift_confirms_one_saccade() {
        let mut segmenter = SaccadeSegmenter::new(&GazeConfig::default());
        let events = feed(&mut segmenter, &[(1.0, 0), (2.0, 1000), (3.0, 2000)]);

        assert_eq!(events.len(), 1);
        assert!((events[0].magnitude - 1.0).abs() < 1e-9);
        assert_eq!(events[0].ended_fixation_secs, Some(2.0));

        let record = segmenter.movement_record();
        assert_eq!(record.gaze_ratio_changes, vec![1.0]);
        assert_eq!(record.fixation_durations, vec![2.0]);
    }

    #[test]
    fn short_fixations_are_discarded() {
        let mut segmenter = SaccadeSegmenter::new(&GazeConfig::default());
        let events = feed(&mut segmenter, &[(1.0, 0), (2.0, 100), (3.0, 200)]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ended_fixation_secs, None);
        assert_eq!(segmenter.saccade_count(), 1);
        assert_eq!(segmenter.fixation_count(), 0);
    }

    #[test]
    fn confirmation_count_resets_on_stable_frames() {
        let mut segmenter = SaccadeSegmenter::new(&GazeConfig::default());
        // Each large delta is followed by a stable frame, so no pair of
        // consecutive candidates ever forms.
        let events = feed(
            &mut segmenter,
            &[(1.0, 0), (2.0, 1000), (2.0, 2000), (3.0, 3000), (3.0, 4000)],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn reset_clears_accumulated_events() {
        let mut segmenter = SaccadeSegmenter::new(&GazeConfig::default());
        feed(&mut segmenter, &[(1.0, 0), (2.0, 1000), (3.0, 2000)]);
        assert_eq!(segmenter.saccade_count(), 1);

        segmenter.reset();
        assert!(segmenter.movement_record().is_empty());

        // Behaves like a fresh segmenter: the next observation reseeds.
        let events = feed(&mut segmenter, &[(5.0, 3000), (5.0, 4000)]);
        assert!(events.is_empty());
    }
}
