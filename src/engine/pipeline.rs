use chrono::{DateTime, Utc};
use image::{imageops, GrayImage, RgbImage};

use crate::gaze::{
    classify_direction, FocusTracker, GazeConfig, GazeSample, GazeSmoother, SaccadeSegmenter,
};
use crate::models::{EyeMovementRecord, FocusData, GazeDirection};
use crate::vision::frame::annotate_frame;
use crate::vision::{
    blink_ratio, gaze_ratio, FrameAnnotations, FramePacket, LandmarkDetector, Point, LEFT_EYE,
    RIGHT_EYE,
};

/// Per-frame gaze state machine. Owns the smoothing window, the saccade
/// segmenter and the focus tracker, and turns raw camera frames into
/// annotated packets plus focus snapshots.
///
/// Direction and blink state are evaluated on every frame so the preview
/// stays live; the focus snapshot only advances while tracking is on.
pub struct FramePipeline {
    gaze_smoother: GazeSmoother,
    segmenter: SaccadeSegmenter,
    tracker: FocusTracker,
    tracking: bool,
    last_direction: GazeDirection,
    snapshot: FocusData,
    config: GazeConfig,
}

impl FramePipeline {
    pub fn new(config: GazeConfig, now: DateTime<Utc>) -> Self {
        Self {
            gaze_smoother: GazeSmoother::new(config.smoothing_window),
            segmenter: SaccadeSegmenter::new(&config),
            tracker: FocusTracker::new(now),
            tracking: false,
            last_direction: GazeDirection::Center,
            snapshot: FocusData::initial(now),
            config,
        }
    }

    /// Process one camera frame. The frame is mirrored first so the preview
    /// behaves like a mirror, then analyzed in grayscale.
    pub fn process(
        &mut self,
        frame: &RgbImage,
        detector: &mut dyn LandmarkDetector,
        now: DateTime<Utc>,
    ) -> (FramePacket, FocusData) {
        let mut mirrored = imageops::flip_horizontal(frame);
        let gray: GrayImage = imageops::grayscale(&mirrored);

        let faces = detector.detect_faces(&gray);

        let mut direction = GazeDirection::Unknown;
        let mut blinking = false;
        let mut eye_points: Vec<Point> = Vec::new();

        for face in &faces {
            let left_eye = face.eye(&LEFT_EYE);
            let right_eye = face.eye(&RIGHT_EYE);
            eye_points.extend_from_slice(&left_eye);
            eye_points.extend_from_slice(&right_eye);

            let blink = (blink_ratio(&left_eye) + blink_ratio(&right_eye)) / 2.0;

            if blink > self.config.blink_threshold {
                // Eyelids swallow the sclera mid-blink, so the gaze ratio is
                // meaningless there. Hold the last known direction instead.
                blinking = true;
                direction = self.last_direction;
            } else {
                blinking = false;
                let gaze = (gaze_ratio(&left_eye, &gray, self.config.sclera_threshold)
                    + gaze_ratio(&right_eye, &gray, self.config.sclera_threshold))
                    / 2.0;
                let smoothed = self.gaze_smoother.push(gaze);
                direction = classify_direction(smoothed, &self.config);

                if self.tracking {
                    self.segmenter.observe(GazeSample {
                        ratio: smoothed,
                        timestamp: now,
                    });
                }
            }
        }

        let focused = direction.is_on_screen();

        if self.tracking {
            self.tracker.update(focused, now);
            self.snapshot = FocusData {
                focused,
                direction,
                blinking,
                focus_duration: self.tracker.focus_duration(now),
                distraction_count: self.tracker.distraction_count(),
                avg_distraction_time: self.tracker.avg_distraction_time(),
                timestamp: now,
            };
        }
        self.last_direction = direction;

        annotate_frame(&mut mirrored, self.tracking, focused, &eye_points);

        let packet = FramePacket {
            image: mirrored,
            annotations: FrameAnnotations {
                timestamp: now,
                tracking: self.tracking,
                focused,
                direction,
                blinking,
                face_count: faces.len(),
                saccade_count: self.segmenter.saccade_count(),
                fixation_count: self.segmenter.fixation_count(),
            },
        };

        (packet, self.snapshot.clone())
    }

    /// Resume focus bookkeeping. Any distraction left open when tracking
    /// paused is abandoned rather than counted.
    pub fn start_tracking(&mut self, now: DateTime<Utc>) {
        if self.tracking {
            return;
        }
        self.tracking = true;
        self.tracker.resume(now);
        self.snapshot.focus_duration = self.tracker.focus_duration(now);
        self.snapshot.distraction_count = self.tracker.distraction_count();
        self.snapshot.avg_distraction_time = self.tracker.avg_distraction_time();
        self.snapshot.timestamp = now;
    }

    /// Freeze the focus snapshot. Frames keep flowing for the preview.
    pub fn pause_tracking(&mut self) {
        self.tracking = false;
    }

    /// Drop all accumulated state and return to the initial snapshot.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.gaze_smoother.clear();
        self.segmenter.reset();
        self.tracker.reset(now);
        self.tracking = false;
        self.last_direction = GazeDirection::Center;
        self.snapshot = FocusData::initial(now);
    }

    pub fn snapshot(&self) -> FocusData {
        self.snapshot.clone()
    }

    pub fn movement_record(&self) -> EyeMovementRecord {
        self.segmenter.movement_record()
    }
}
