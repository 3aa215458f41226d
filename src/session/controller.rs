use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::advice::{AdviceModel, AdvicePipeline, AdviceRequest};
use crate::db::Database;
use crate::engine::{CameraFactory, DetectorFactory, EngineController};
use crate::gaze::GazeConfig;
use crate::metrics::{MetricsCollector, MetricsReport};
use crate::models::{FocusData, SessionSummary};
use crate::vision::FramePacket;

use super::recorder::SessionRecorder;

const SAMPLE_INTERVAL_SECS: u64 = 5;

/// Event streams handed to the embedding UI.
pub struct TrackerStreams {
    pub frames: UnboundedReceiver<FramePacket>,
    pub focus: UnboundedReceiver<FocusData>,
    pub advice: UnboundedReceiver<String>,
}

/// Ties the capture engine, the session recorder, the database and the
/// advice pipeline together. One controller drives one camera.
pub struct SessionController {
    db: Database,
    engine: EngineController,
    recorder: Arc<Mutex<Option<SessionRecorder>>>,
    latest: Arc<Mutex<FocusData>>,
    collector: Option<JoinHandle<()>>,
    collector_cancel: Option<CancellationToken>,
    advice: AdvicePipeline,
    metrics: MetricsCollector,
}

impl SessionController {
    /// Spin up the capture thread and the collector task. The camera and
    /// detector factories run on the capture thread itself.
    pub fn launch(
        db: Database,
        open_camera: CameraFactory,
        open_detector: DetectorFactory,
        config: GazeConfig,
        advice_model: Option<Box<dyn AdviceModel>>,
    ) -> Result<(Self, TrackerStreams)> {
        let metrics = MetricsCollector::new();

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (engine_focus_tx, engine_focus_rx) = mpsc::unbounded_channel();
        let (focus_tx, focus_rx) = mpsc::unbounded_channel();

        let mut engine = EngineController::new();
        engine.start(
            open_camera,
            open_detector,
            config,
            frame_tx,
            engine_focus_tx,
            metrics.clone(),
        )?;

        let recorder = Arc::new(Mutex::new(None));
        let latest = Arc::new(Mutex::new(FocusData::initial(Utc::now())));

        let collector_cancel = CancellationToken::new();
        let collector = tokio::spawn(collector_loop(
            engine_focus_rx,
            Arc::clone(&recorder),
            Arc::clone(&latest),
            focus_tx,
            collector_cancel.clone(),
        ));

        let (advice, advice_rx) = match advice_model {
            Some(model) => AdvicePipeline::start(model),
            None => AdvicePipeline::disabled(),
        };

        let controller = Self {
            db,
            engine,
            recorder,
            latest,
            collector: Some(collector),
            collector_cancel: Some(collector_cancel),
            advice,
            metrics,
        };

        let streams = TrackerStreams {
            frames: frame_rx,
            focus: focus_rx,
            advice: advice_rx,
        };

        Ok((controller, streams))
    }

    /// Start a new session, or resume the current one after a pause.
    pub async fn start_session(&self) -> Result<()> {
        {
            let mut recorder = self.recorder.lock().await;
            if recorder.is_none() {
                *recorder = Some(SessionRecorder::new(Utc::now()));
                info!("session started");
            } else {
                info!("session resumed");
            }
        }
        self.engine.start_tracking()
    }

    /// Pause focus bookkeeping without ending the session. Frames keep
    /// flowing for the preview.
    pub fn pause_session(&self) -> Result<()> {
        self.engine.pause_tracking()
    }

    /// Discard the current session without persisting anything.
    pub async fn reset_session(&self) -> Result<()> {
        *self.recorder.lock().await = None;
        self.engine.reset()
    }

    /// Stop tracking, persist the session and return its summary.
    pub async fn end_session(&self) -> Result<SessionSummary> {
        if let Err(err) = self.engine.pause_tracking() {
            warn!("failed to pause tracking before ending session: {err:#}");
        }

        let recorder = self.recorder.lock().await.take();
        let Some(recorder) = recorder else {
            bail!("no active session to end");
        };

        let eye_movement = match self.engine.movement_snapshot().await {
            Ok(record) if !record.is_empty() => Some(record),
            Ok(_) => None,
            Err(err) => {
                warn!("eye movement record unavailable: {err:#}");
                None
            }
        };

        // Clear engine-side counters so the next session starts clean.
        if let Err(err) = self.engine.reset() {
            warn!("failed to reset capture state after session end: {err:#}");
        }

        let record = recorder.finish(Uuid::new_v4().to_string(), Utc::now(), eye_movement);
        let summary = SessionSummary::from(&record);
        self.db.save_session(&record).await?;

        info!(
            "session {} saved ({}s, {:.1}% focused)",
            summary.id, summary.duration_secs, summary.focus_percentage
        );
        Ok(summary)
    }

    /// Queue an advice request built from the latest focus state.
    pub async fn request_advice(&self) -> Result<()> {
        if !self.advice.is_ready() {
            bail!("advice model is not ready");
        }
        let latest = self.latest.lock().await.clone();
        self.advice.submit(AdviceRequest::from(&latest)).await;
        Ok(())
    }

    pub fn advice_ready(&self) -> bool {
        self.advice.is_ready()
    }

    pub fn metrics_report(&self) -> MetricsReport {
        self.metrics.report()
    }

    /// Tear everything down. Safe to call once at shutdown.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.engine.stop().await?;

        if let Some(token) = self.collector_cancel.take() {
            token.cancel();
        }
        if let Some(handle) = self.collector.take() {
            handle.await.context("focus collector failed to join")?;
        }

        self.advice.stop().await
    }
}

async fn collector_loop(
    mut events: UnboundedReceiver<FocusData>,
    recorder: Arc<Mutex<Option<SessionRecorder>>>,
    latest: Arc<Mutex<FocusData>>,
    outward: UnboundedSender<FocusData>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(SAMPLE_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else {
                    info!("focus event stream closed");
                    break;
                };

                *latest.lock().await = event.clone();
                if let Some(recorder) = recorder.lock().await.as_mut() {
                    recorder.observe(&event);
                }
                let _ = outward.send(event);
            }
            _ = ticker.tick() => {
                if let Some(recorder) = recorder.lock().await.as_mut() {
                    recorder.sample(Utc::now());
                }
            }
            _ = cancel_token.cancelled() => {
                info!("focus collector shutting down");
                break;
            }
        }
    }
}
