use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub timestamp: DateTime<Utc>,
    pub read_ms: u64,
    pub process_ms: u64,
    pub total_ms: u64,
    pub faces: usize,
    pub blinking: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub system: SystemMetrics,
    pub recent_frames: Vec<FrameMetrics>,
    pub frame_count: u64,
    pub blink_count: u64,
    pub no_face_count: u64,
}

impl Default for MetricsReport {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_frames: Vec::new(),
            frame_count: 0,
            blink_count: 0,
            no_face_count: 0,
        }
    }
}
