//! Span around a single dispatched operation

use instant::Instant;
use tracing::{span, Level, Span};
use uuid::Uuid;

pub struct OperationSpan {
    span: Span,
    start_time: Instant,
    operation: &'static str,
}

impl OperationSpan {
    pub fn new(
        family: &'static str,
        operation: &'static str,
        owner_key: &str,
        owner_idx: usize,
        correlation_id: Option<Uuid>,
    ) -> Self {
        let span = if let Some(corr_id) = correlation_id {
            span!(
                Level::DEBUG,
                "operation",
                family = family,
                op = operation,
                owner_key = owner_key,
                owner_idx = owner_idx,
                correlation_id = %corr_id
            )
        } else {
            span!(
                Level::DEBUG,
                "operation",
                family = family,
                op = operation,
                owner_key = owner_key,
                owner_idx = owner_idx
            )
        };

        Self {
            span,
            start_time: Instant::now(),
            operation,
        }
    }

    /// Record the outcome and return the elapsed time.
    pub fn record_completion(&self, success: bool) -> std::time::Duration {
        let duration = self.start_time.elapsed();
        tracing::debug!(
            parent: &self.span,
            op = self.operation,
            success = success,
            elapsed_ms = duration.as_secs_f64() * 1000.0,
            "Operation completed"
        );
        duration
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}
