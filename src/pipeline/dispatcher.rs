use super::traits::{OpRecord, OperationFamily, OperationKind};
use super::types::{Combined, Dispatch, OwnerToken};
use crate::error::OpError;
use crate::logging::{get_correlation_id, MetricsCollector, OperationSpan};
use crate::Result;
use instant::Instant;
use ndarray::ArrayView2;
use std::sync::Arc;

/// Routes requests to the operations of one family on behalf of one owner.
///
/// The owner check only drops stale requests. It is not a lock: a
/// dispatcher shared between threads gives no mutual exclusion.
pub struct Dispatcher<F: OperationFamily> {
    owner: OwnerToken,
    family: F,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<F: OperationFamily> Dispatcher<F> {
    pub fn new(owner: OwnerToken, family: F) -> Self {
        Self {
            owner,
            family,
            metrics: None,
        }
    }

    /// Forward operation timings to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn owner(&self) -> &OwnerToken {
        &self.owner
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    pub fn accepts(&self, token: &OwnerToken) -> bool {
        *token == self.owner
    }

    /// Run one operation if `token` matches the bound owner.
    pub fn invoke(
        &self,
        kind: F::Kind,
        token: &OwnerToken,
        image: ArrayView2<'_, f64>,
        params: &F::Params,
    ) -> Result<Dispatch<F::Output>> {
        if !self.accepts(token) {
            self.log_stale(token, kind.name());
            return Ok(Dispatch::Stale);
        }
        self.timed(kind, image, params).map(Dispatch::Completed)
    }

    /// Like [`Dispatcher::invoke`], looking the operation up by name.
    ///
    /// The owner is checked first; a stale request with an unknown name
    /// is still just stale.
    pub fn invoke_named(
        &self,
        name: &str,
        token: &OwnerToken,
        image: ArrayView2<'_, f64>,
        params: &F::Params,
    ) -> Result<Dispatch<F::Output>> {
        if !self.accepts(token) {
            self.log_stale(token, name);
            return Ok(Dispatch::Stale);
        }
        let kind = F::Kind::parse(name).ok_or_else(|| OpError::UnknownOperation {
            family: self.family.family_name(),
            name: name.to_string(),
        })?;
        self.timed(kind, image, params).map(Dispatch::Completed)
    }

    /// Run every operation of the family in registration order.
    pub fn invoke_all(
        &self,
        token: &OwnerToken,
        image: ArrayView2<'_, f64>,
        params: &F::Params,
    ) -> Result<Dispatch<Combined<F::Output>>> {
        if !self.accepts(token) {
            self.log_stale(token, "*");
            return Ok(Dispatch::Stale);
        }

        let start = Instant::now();
        let kinds = F::Kind::all();
        let mut ops = Vec::with_capacity(kinds.len());
        let mut outputs = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let output = self.timed(kind, image, params)?;
            ops.push(output.op());
            outputs.push(output);
        }

        tracing::info!(
            family = self.family.family_name(),
            operations = ops.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "All operations performed"
        );
        Ok(Dispatch::Completed(Combined { ops, outputs }))
    }

    fn timed(
        &self,
        kind: F::Kind,
        image: ArrayView2<'_, f64>,
        params: &F::Params,
    ) -> Result<F::Output> {
        let correlation_id = get_correlation_id();
        let span = OperationSpan::new(
            self.family.family_name(),
            kind.name(),
            &self.owner.key,
            self.owner.idx,
            correlation_id,
        );
        let result = {
            let _entered = span.enter();
            self.family.run(kind, image, params)
        };
        let elapsed = span.record_completion(result.is_ok());

        if let Some(metrics) = &self.metrics {
            metrics.record(kind.name(), elapsed, correlation_id);
        }
        if let Err(ref e) = result {
            tracing::error!(op = kind.name(), error = %e, "Operation failed");
        }
        result
    }

    fn log_stale(&self, token: &OwnerToken, operation: &str) {
        tracing::debug!(
            family = self.family.family_name(),
            op = operation,
            expected_key = %self.owner.key,
            expected_idx = self.owner.idx,
            key = %token.key,
            idx = token.idx,
            "Ignoring stale request"
        );
    }
}
