use super::traits::{OpRecord, Record};
use crate::error::{OpError, Result};
use ndarray::{ArrayView1, ArrayView2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key/value view of an operation result.
pub type ResultMap = serde_json::Map<String, Value>;

/// Identity a dispatcher is bound to: which image/session it serves.
///
/// Callers attach the token to every request; a request carrying a token
/// other than the dispatcher's is stale and is answered with
/// [`Dispatch::Stale`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerToken {
    pub key: String,
    pub idx: usize,
}

impl OwnerToken {
    pub fn new<K: Into<String>>(key: K, idx: usize) -> Self {
        Self { key: key.into(), idx }
    }
}

/// Outcome of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<T> {
    /// The request's token did not match; nothing was computed.
    Stale,
    Completed(T),
}

impl<T> Dispatch<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Dispatch::Stale)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Dispatch::Stale => None,
            Dispatch::Completed(value) => Some(value),
        }
    }

    pub fn as_completed(&self) -> Option<&T> {
        match self {
            Dispatch::Stale => None,
            Dispatch::Completed(value) => Some(value),
        }
    }
}

impl<T: Record> Dispatch<T> {
    /// Record of the result; a stale dispatch yields an empty record.
    pub fn to_record(&self) -> ResultMap {
        match self {
            Dispatch::Stale => ResultMap::new(),
            Dispatch::Completed(value) => value.to_record(),
        }
    }
}

/// Results of running every operation of a family.
#[derive(Debug, Clone)]
pub struct Combined<O> {
    /// `op` tag of each operation, in execution order
    pub ops: Vec<&'static str>,
    pub outputs: Vec<O>,
}

impl<O: OpRecord> Record for Combined<O> {
    /// Merge of all records: later keys overwrite earlier ones, the
    /// per-operation `op` tag is replaced by the ordered `ops` list.
    fn to_record(&self) -> ResultMap {
        let mut merged = ResultMap::new();
        for output in &self.outputs {
            merged.extend(output.to_record());
        }
        merged.remove("op");
        merged.insert(
            "ops".to_string(),
            Value::Array(self.ops.iter().map(|op| Value::from(*op)).collect()),
        );
        merged
    }
}

/// Deserialize a family's parameters from a JSON object.
///
/// Unknown keys are ignored and missing keys take their defaults.
pub fn params_from_value<P: DeserializeOwned>(value: Value) -> Result<P> {
    let value = match value {
        Value::Null => Value::Object(ResultMap::new()),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| OpError::InvalidParameter(e.to_string()))
}

pub fn array1_value(values: ArrayView1<'_, f64>) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}

pub fn slice_value(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}

/// Nested rows; not-a-number samples become `null`.
pub fn array2_value(image: ArrayView2<'_, f64>) -> Value {
    Value::Array(image.outer_iter().map(array1_value).collect())
}
