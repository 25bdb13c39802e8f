//! Timing collection for dispatched operations
//!
//! Durations recorded here are diagnostics only; they never appear in an
//! operation's result.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

const MAX_MEASUREMENTS: usize = 10_000;

/// Individual performance measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMeasurement {
    pub operation: String,
    pub duration_ms: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub correlation_id: Option<Uuid>,
}

/// Statistical summary of performance measurements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub operation: String,
    pub count: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
}

/// Thread-safe metrics collector
pub struct MetricsCollector {
    measurements: Mutex<Vec<PerformanceMeasurement>>,
    enabled: bool,
}

impl MetricsCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            measurements: Mutex::new(Vec::new()),
            enabled,
        }
    }

    pub fn record(&self, operation: &str, duration: Duration, correlation_id: Option<Uuid>) {
        if !self.enabled {
            return;
        }

        let measurement = PerformanceMeasurement {
            operation: operation.to_string(),
            duration_ms: duration.as_secs_f64() * 1000.0,
            timestamp: chrono::Utc::now(),
            correlation_id,
        };

        if let Ok(mut measurements) = self.measurements.lock() {
            measurements.push(measurement);

            // Keep only the most recent half once the buffer is full
            if measurements.len() > MAX_MEASUREMENTS {
                measurements.drain(0..MAX_MEASUREMENTS / 2);
            }
        }
    }

    pub fn get_measurements(&self, operation: &str) -> Vec<PerformanceMeasurement> {
        if let Ok(measurements) = self.measurements.lock() {
            measurements
                .iter()
                .filter(|m| m.operation == operation)
                .cloned()
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Summary statistics for one operation name
    pub fn calculate_stats(&self, operation: &str) -> Option<PerformanceStats> {
        let mut durations: Vec<f64> = self
            .get_measurements(operation)
            .iter()
            .map(|m| m.duration_ms)
            .collect();
        if durations.is_empty() {
            return None;
        }
        durations.sort_by(|a, b| a.total_cmp(b));

        let count = durations.len();
        let mean = durations.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (durations[count / 2 - 1] + durations[count / 2]) / 2.0
        } else {
            durations[count / 2]
        };
        let p95_index = ((count as f64) * 0.95) as usize;

        Some(PerformanceStats {
            operation: operation.to_string(),
            count,
            mean_ms: mean,
            median_ms: median,
            min_ms: durations[0],
            max_ms: durations[count - 1],
            p95_ms: durations[p95_index.min(count - 1)],
        })
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.lock().map(|m| m.len()).unwrap_or(0)
    }
}
