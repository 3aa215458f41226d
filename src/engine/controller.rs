use std::sync::mpsc::{self, Sender};

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

use crate::gaze::GazeConfig;
use crate::metrics::MetricsCollector;
use crate::models::{EyeMovementRecord, FocusData};
use crate::vision::FramePacket;

use super::loop_worker::{capture_loop, CaptureContext};
use super::{CameraFactory, DetectorFactory, EngineCommand};

/// Commands apply between frames, so a reply should arrive within one
/// frame interval. Anything past this means the loop is wedged.
const MOVEMENT_QUERY_TIMEOUT_SECS: u64 = 2;

/// Handle to the capture thread. Spawns it, feeds it commands and tears
/// it down on shutdown.
pub struct EngineController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    commands: Option<Sender<EngineCommand>>,
}

impl EngineController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            commands: None,
        }
    }

    pub fn start(
        &mut self,
        open_camera: CameraFactory,
        open_detector: DetectorFactory,
        config: GazeConfig,
        frames: UnboundedSender<FramePacket>,
        focus: UnboundedSender<FocusData>,
        metrics: MetricsCollector,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("capture already active");
        }

        let cancel_token = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::channel();

        let ctx = CaptureContext {
            config,
            commands: command_rx,
            frames,
            focus,
            metrics,
            cancel_token: cancel_token.clone(),
        };

        let handle =
            tokio::task::spawn_blocking(move || capture_loop(open_camera, open_detector, ctx));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.commands = Some(command_tx);
        Ok(())
    }

    pub fn start_tracking(&self) -> Result<()> {
        self.send(EngineCommand::StartTracking)
    }

    pub fn pause_tracking(&self) -> Result<()> {
        self.send(EngineCommand::PauseTracking)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(EngineCommand::Reset)
    }

    /// Ask the capture thread for its current saccade and fixation record.
    pub async fn movement_snapshot(&self) -> Result<EyeMovementRecord> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineCommand::MovementSnapshot { reply: reply_tx })?;

        match timeout(Duration::from_secs(MOVEMENT_QUERY_TIMEOUT_SECS), reply_rx).await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(_)) => bail!("capture loop dropped the movement query"),
            Err(_) => bail!("timed out waiting for the capture loop"),
        }
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.commands = None;

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("capture task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        let Some(commands) = &self.commands else {
            bail!("capture loop is not running");
        };
        if commands.send(command).is_err() {
            bail!("capture loop is no longer receiving commands");
        }
        Ok(())
    }
}
