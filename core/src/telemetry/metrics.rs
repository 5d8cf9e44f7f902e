use serde::Serialize;
use std::sync::Mutex;

/// Point-in-time view of a stream's transfer counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub frames: u64,
    pub samples: u64,
    pub dropped_frames: u64,
}

/// Transfer counters kept by the sample ports and reported by the demos at
/// the end of a run.
pub struct StreamMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_frame(&self, samples: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames += 1;
            metrics.samples += samples as u64;
        }
    }

    pub fn record_dropped(&self, frames: u64) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped_frames += frames;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for StreamMetrics {
    fn default() -> Self {
        Self::new()
    }
}
