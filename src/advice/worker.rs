use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::client::{AdviceModel, AdviceRequest};

const POLL_INTERVAL_MS: u64 = 100;
const ADVICE_WAIT_SECS: u64 = 15;

/// Background advice generation. A single pending request slot is polled
/// by the worker; generated text (or a readable error) flows out on an
/// unbounded channel.
pub struct AdvicePipeline {
    payload: Arc<Mutex<Option<AdviceRequest>>>,
    ready: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AdvicePipeline {
    pub fn start(model: Box<dyn AdviceModel>) -> (Self, UnboundedReceiver<String>) {
        let payload = Arc::new(Mutex::new(None));
        let ready = Arc::new(AtomicBool::new(false));
        let cancel_token = CancellationToken::new();
        let (advice_tx, advice_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(advice_loop(
            model,
            Arc::clone(&payload),
            Arc::clone(&ready),
            advice_tx,
            cancel_token.clone(),
        ));

        (
            Self {
                payload,
                ready,
                worker: Some(worker),
                cancel_token: Some(cancel_token),
            },
            advice_rx,
        )
    }

    /// Pipeline with no model behind it. `is_ready` stays false and the
    /// advice stream closes immediately.
    pub fn disabled() -> (Self, UnboundedReceiver<String>) {
        let (_advice_tx, advice_rx) = mpsc::unbounded_channel();
        (
            Self {
                payload: Arc::new(Mutex::new(None)),
                ready: Arc::new(AtomicBool::new(false)),
                worker: None,
                cancel_token: None,
            },
            advice_rx,
        )
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Queue focus metrics for the worker. A request already waiting is
    /// replaced; only the newest state matters.
    pub async fn submit(&self, request: AdviceRequest) {
        *self.payload.lock().await = Some(request);
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(worker) = self.worker.take() {
            worker.await.context("advice worker failed to join")?;
        }
        Ok(())
    }
}

async fn advice_loop(
    model: Box<dyn AdviceModel>,
    payload: Arc<Mutex<Option<AdviceRequest>>>,
    ready: Arc<AtomicBool>,
    advice_tx: UnboundedSender<String>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    ready.store(true, Ordering::Relaxed);
    info!("advice worker started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Take before generating so a failure cannot wedge the slot.
                let request = payload.lock().await.take();
                let Some(request) = request else {
                    continue;
                };

                let message = match model.generate(&request).await {
                    Ok(advice) => advice,
                    Err(err) => {
                        error!("advice generation failed: {err:#}");
                        format!("Error generating advice: {err:#}")
                    }
                };

                if advice_tx.send(message).is_err() {
                    info!("advice receiver dropped, stopping worker");
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                info!("advice worker shutting down");
                break;
            }
        }
    }
}

/// Wait for the next advice message, discarding anything stale first.
/// Call right after submitting; generation takes at least one poll
/// interval, so the fresh reply cannot be drained here.
pub async fn advice_or_fallback(advice_rx: &mut UnboundedReceiver<String>) -> String {
    while advice_rx.try_recv().is_ok() {}

    match timeout(Duration::from_secs(ADVICE_WAIT_SECS), advice_rx.recv()).await {
        Ok(Some(advice)) => advice,
        Ok(None) | Err(_) => fallback_advice(),
    }
}

/// Canned tips shown when generation is unavailable or too slow.
pub fn fallback_advice() -> String {
    "Sorry, I couldn't generate personalized advice at this time. Here are some general focus tips:\n\
     - Take regular short breaks (5 minutes) every 25-30 minutes of focused work\n\
     - Remove distractions from your workspace\n\
     - Use the Pomodoro Technique to structure your work sessions\n\
     - Stay hydrated and maintain good posture\n\
     You can try generating advice again later."
        .to_string()
}
