use std::sync::mpsc::Receiver;
use std::time::Instant;

use chrono::Utc;
use log::{error, info};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::gaze::GazeConfig;
use crate::metrics::{FrameMetrics, MetricsCollector};
use crate::models::FocusData;
use crate::vision::FramePacket;

use super::pipeline::FramePipeline;
use super::{CameraFactory, DetectorFactory, EngineCommand};

/// Everything the capture loop needs, bundled so the spawn site stays flat.
pub(crate) struct CaptureContext {
    pub config: GazeConfig,
    pub commands: Receiver<EngineCommand>,
    pub frames: UnboundedSender<FramePacket>,
    pub focus: UnboundedSender<FocusData>,
    pub metrics: MetricsCollector,
    pub cancel_token: CancellationToken,
}

/// Blocking capture loop. Runs on a dedicated thread because camera reads
/// block; commands are drained between frames and cancellation is checked
/// once per iteration.
pub(crate) fn capture_loop(
    open_camera: CameraFactory,
    open_detector: DetectorFactory,
    ctx: CaptureContext,
) {
    let mut camera = match open_camera() {
        Ok(camera) => camera,
        Err(err) => {
            error!("camera init failed: {err:#}");
            return;
        }
    };
    let mut detector = match open_detector() {
        Ok(detector) => detector,
        Err(err) => {
            error!("landmark detector init failed: {err:#}");
            return;
        }
    };

    let mut pipeline = FramePipeline::new(ctx.config.clone(), Utc::now());
    info!("capture loop started");

    while !ctx.cancel_token.is_cancelled() {
        while let Ok(command) = ctx.commands.try_recv() {
            apply_command(&mut pipeline, command, &ctx.focus);
        }

        let read_start = Instant::now();
        let frame = match camera.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                error!("camera read failed, stopping capture: {err:#}");
                break;
            }
        };
        let read_ms = read_start.elapsed().as_millis() as u64;

        let process_start = Instant::now();
        let now = Utc::now();
        let (packet, snapshot) = pipeline.process(&frame, detector.as_mut(), now);
        let process_ms = process_start.elapsed().as_millis() as u64;

        ctx.metrics.record_frame(FrameMetrics {
            timestamp: now,
            read_ms,
            process_ms,
            total_ms: read_start.elapsed().as_millis() as u64,
            faces: packet.annotations.face_count,
            blinking: packet.annotations.blinking,
        });

        // Receivers can drop during shutdown; losing frames then is fine.
        let _ = ctx.focus.send(snapshot);
        let _ = ctx.frames.send(packet);
    }

    info!("capture loop shutting down");
}

fn apply_command(
    pipeline: &mut FramePipeline,
    command: EngineCommand,
    focus: &UnboundedSender<FocusData>,
) {
    match command {
        EngineCommand::StartTracking => {
            pipeline.start_tracking(Utc::now());
            let _ = focus.send(pipeline.snapshot());
        }
        EngineCommand::PauseTracking => {
            pipeline.pause_tracking();
        }
        EngineCommand::Reset => {
            pipeline.reset(Utc::now());
            let _ = focus.send(pipeline.snapshot());
        }
        EngineCommand::MovementSnapshot { reply } => {
            let _ = reply.send(pipeline.movement_record());
        }
    }
}
