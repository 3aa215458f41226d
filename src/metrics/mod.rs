mod types;

pub use types::{FrameMetrics, MetricsReport, SystemMetrics};

use std::sync::{Arc, Mutex, MutexGuard};
use sysinfo::{Pid, ProcessesToUpdate, System};

const MAX_RECENT_FRAMES: usize = 20;

pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_frames: Vec<FrameMetrics>,
    frame_count: u64,
    blink_count: u64,
    no_face_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Initial refresh to establish baseline for CPU calculation
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_frames: Vec::with_capacity(MAX_RECENT_FRAMES),
                frame_count: 0,
                blink_count: 0,
                no_face_count: 0,
                system,
                pid,
            })),
        }
    }

    /// Records one processed frame. Called from the capture thread, so no
    /// sysinfo refresh happens here; `report` does that on demand.
    pub fn record_frame(&self, metrics: FrameMetrics) {
        let mut state = self.lock();

        state.frame_count += 1;

        if metrics.blinking {
            state.blink_count += 1;
        }
        if metrics.faces == 0 {
            state.no_face_count += 1;
        }

        state.recent_frames.push(metrics);

        if state.recent_frames.len() > MAX_RECENT_FRAMES {
            state.recent_frames.remove(0);
        }
    }

    pub fn report(&self) -> MetricsReport {
        let mut state = self.lock();
        let pid = state.pid;

        // cpu_usage is measured against the previous refresh.
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system_metrics = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsReport {
            system: system_metrics,
            recent_frames: state.recent_frames.clone(),
            frame_count: state.frame_count,
            blink_count: state.blink_count,
            no_face_count: state.no_face_count,
        }
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        let pid = state.pid;
        state.recent_frames.clear();
        state.frame_count = 0;
        state.blink_count = 0;
        state.no_face_count = 0;
        // Re-establish baseline for CPU after reset
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn frame(faces: usize, blinking: bool) -> FrameMetrics {
        FrameMetrics {
            timestamp: Utc::now(),
            read_ms: 5,
            process_ms: 10,
            total_ms: 15,
            faces,
            blinking,
        }
    }

    #[test]
    fn counts_blinks_and_missing_faces() {
        let collector = MetricsCollector::new();
        collector.record_frame(frame(1, false));
        collector.record_frame(frame(1, true));
        collector.record_frame(frame(0, false));

        let report = collector.report();
        assert_eq!(report.frame_count, 3);
        assert_eq!(report.blink_count, 1);
        assert_eq!(report.no_face_count, 1);
        assert_eq!(report.recent_frames.len(), 3);
    }

    #[test]
    fn recent_frames_are_capped() {
        let collector = MetricsCollector::new();
        for _ in 0..(MAX_RECENT_FRAMES + 5) {
            collector.record_frame(frame(1, false));
        }

        let report = collector.report();
        assert_eq!(report.recent_frames.len(), MAX_RECENT_FRAMES);
        assert_eq!(report.frame_count, (MAX_RECENT_FRAMES + 5) as u64);
    }

    #[test]
    fn reset_clears_counters_but_keeps_collecting() {
        let collector = MetricsCollector::new();
        collector.record_frame(frame(1, true));
        collector.reset();

        let report = collector.report();
        assert_eq!(report.frame_count, 0);
        assert_eq!(report.blink_count, 0);
        assert!(report.recent_frames.is_empty());

        collector.record_frame(frame(1, false));
        assert_eq!(collector.report().frame_count, 1);
    }

    #[test]
    fn clones_share_state() {
        let collector = MetricsCollector::new();
        let other = collector.clone();
        other.record_frame(frame(1, false));

        assert_eq!(collector.report().frame_count, 1);
    }
}
