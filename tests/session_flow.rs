use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use image::{GrayImage, RgbImage};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use focustrack::db::Database;
use focustrack::gaze::GazeConfig;
use focustrack::models::{FocusData, GazeDirection};
use focustrack::session::SessionController;
use focustrack::vision::landmarks::LANDMARK_COUNT;
use focustrack::vision::{FaceLandmarks, FrameSource, LandmarkDetector, Point, LEFT_EYE, RIGHT_EYE};

const FRAME_WIDTH: u32 = 40;
const FRAME_HEIGHT: u32 = 20;
const FRAME_INTERVAL_MS: u64 = 10;
const WAIT_SECS: u64 = 10;

const FACE_VISIBLE: usize = 0;
const FACE_HIDDEN: usize = 1;

/// Paced source of black frames. Black pixels put the whole eye region
/// below the sclera threshold, which classifies as a centered gaze.
struct DarkCamera;

impl FrameSource for DarkCamera {
    fn next_frame(&mut self) -> Result<RgbImage> {
        std::thread::sleep(Duration::from_millis(FRAME_INTERVAL_MS));
        Ok(RgbImage::new(FRAME_WIDTH, FRAME_HEIGHT))
    }
}

/// Detector whose face comes and goes under test control.
struct PhasedDetector {
    phase: Arc<AtomicUsize>,
}

impl LandmarkDetector for PhasedDetector {
    fn detect_faces(&mut self, _frame: &GrayImage) -> Vec<FaceLandmarks> {
        if self.phase.load(Ordering::Relaxed) == FACE_HIDDEN {
            Vec::new()
        } else {
            vec![open_eye_face()]
        }
    }
}

struct NoFaceDetector;

impl LandmarkDetector for NoFaceDetector {
    fn detect_faces(&mut self, _frame: &GrayImage) -> Vec<FaceLandmarks> {
        Vec::new()
    }
}

/// A 68-point face whose eye landmarks form wide-open hexagons, placed
/// identically for both eyes.
fn open_eye_face() -> FaceLandmarks {
    let mut points = vec![Point::new(2, 2); LANDMARK_COUNT];
    let eye = [(8, 10), (14, 6), (26, 6), (32, 10), (26, 14), (14, 14)];
    for (slot, (x, y)) in LEFT_EYE.iter().zip(eye) {
        points[*slot] = Point::new(x, y);
    }
    for (slot, (x, y)) in RIGHT_EYE.iter().zip(eye) {
        points[*slot] = Point::new(x, y);
    }
    FaceLandmarks::from_points(points).expect("full landmark set")
}

async fn wait_for_focus<F>(rx: &mut UnboundedReceiver<FocusData>, mut predicate: F) -> FocusData
where
    F: FnMut(&FocusData) -> bool,
{
    timeout(Duration::from_secs(WAIT_SECS), async {
        loop {
            let event = rx.recv().await.expect("focus stream closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for a focus event")
}

#[tokio::test]
async fn full_session_round_trips_through_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::new(dir.path().join("focustrack.sqlite3")).expect("database");

    let phase = Arc::new(AtomicUsize::new(FACE_VISIBLE));
    let detector_phase = Arc::clone(&phase);

    let (mut controller, mut streams) = SessionController::launch(
        db.clone(),
        Box::new(|| Ok(Box::new(DarkCamera) as Box<dyn FrameSource>)),
        Box::new(move || {
            Ok(Box::new(PhasedDetector {
                phase: detector_phase,
            }) as Box<dyn LandmarkDetector>)
        }),
        GazeConfig::default(),
        None,
    )
    .expect("launch");

    // The capture loop should be streaming mirrored frames with the
    // scripted face before any session exists.
    let packet = timeout(Duration::from_secs(WAIT_SECS), streams.frames.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("frame stream closed");
    assert_eq!(packet.annotations.face_count, 1);
    assert!(!packet.annotations.tracking);

    controller.start_session().await.expect("start session");

    // Commands apply between frames; wait for a packet that confirms
    // tracking engaged, then ignore focus events older than it.
    let live_after = timeout(Duration::from_secs(WAIT_SECS), async {
        loop {
            let packet = streams.frames.recv().await.expect("frame stream closed");
            if packet.annotations.tracking {
                return packet.annotations.timestamp;
            }
        }
    })
    .await
    .expect("timed out waiting for tracking to engage");

    let focused = wait_for_focus(&mut streams.focus, |event| {
        event.timestamp >= live_after && event.focused && event.direction == GazeDirection::Center
    })
    .await;
    assert_eq!(focused.distraction_count, 0);

    // Hide the face: the gaze becomes unknown and a distraction opens.
    phase.store(FACE_HIDDEN, Ordering::Relaxed);

    let distracted = wait_for_focus(&mut streams.focus, |event| {
        !event.focused && event.direction == GazeDirection::Unknown
    })
    .await;
    assert_eq!(distracted.distraction_count, 1);

    // Let the distraction span a few frames of real time.
    for _ in 0..3 {
        wait_for_focus(&mut streams.focus, |event| !event.focused).await;
    }

    // Bring the face back; refocusing closes the distraction interval.
    phase.store(FACE_VISIBLE, Ordering::Relaxed);

    let refocused = wait_for_focus(&mut streams.focus, |event| event.focused).await;
    assert_eq!(refocused.distraction_count, 1);
    assert!(refocused.avg_distraction_time > 0.0);

    let summary = controller.end_session().await.expect("end session");
    assert_eq!(summary.distraction_count, 1);
    assert!(summary.avg_distraction_time > 0.0);
    assert!(summary.focus_percentage > 0.0);
    assert!(summary.focus_percentage < 100.0);
    assert!(summary.duration_secs >= 0);

    let details = db
        .get_session_details(&summary.id)
        .await
        .expect("read session")
        .expect("session should be stored");
    assert_eq!(details.id, summary.id);
    assert_eq!(details.distraction_count, 1);
    assert!(!details.focus_points.is_empty());
    assert!(details
        .focus_points
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert!(details.focus_points.iter().any(|point| !point.is_focused));
    assert!(details.focus_points.iter().any(|point| point.is_focused));

    let sessions = db.get_all_sessions().await.expect("list sessions");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, summary.id);

    controller.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn ending_without_a_session_reports_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::new(dir.path().join("focustrack.sqlite3")).expect("database");

    let (mut controller, mut streams) = SessionController::launch(
        db,
        Box::new(|| Ok(Box::new(DarkCamera) as Box<dyn FrameSource>)),
        Box::new(|| Ok(Box::new(NoFaceDetector) as Box<dyn LandmarkDetector>)),
        GazeConfig::default(),
        None,
    )
    .expect("launch");

    let packet = timeout(Duration::from_secs(WAIT_SECS), streams.frames.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("frame stream closed");
    assert_eq!(packet.annotations.face_count, 0);
    assert_eq!(packet.annotations.direction, GazeDirection::Unknown);

    let err = controller
        .end_session()
        .await
        .expect_err("there is no session to end");
    assert!(err.to_string().contains("no active session"));

    assert!(!controller.advice_ready());

    let report = controller.metrics_report();
    assert!(report.frame_count > 0);
    assert!(report.no_face_count > 0);

    controller.shutdown().await.expect("shutdown");
}
