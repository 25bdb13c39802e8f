use super::types::ResultMap;
use crate::Result;
use ndarray::ArrayView2;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Closed set of operations offered by one family.
pub trait OperationKind: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Every operation of the family, in registration order
    fn all() -> &'static [Self];

    /// Name used in result records and when invoking by name
    fn name(self) -> &'static str;

    fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.name() == name)
    }
}

/// Conversion of an operation output into a key/value record.
pub trait Record {
    fn to_record(&self) -> ResultMap;
}

/// Output of a single operation. Its record always carries `op`.
pub trait OpRecord: Record {
    fn op(&self) -> &'static str;
}

/// A capability family: a fixed table of operations sharing one
/// parameter set and one tagged output type.
pub trait OperationFamily: Send + Sync {
    type Kind: OperationKind;
    type Params: Default + DeserializeOwned + Debug + Sync;
    type Output: OpRecord + Debug + Send;

    fn family_name(&self) -> &'static str;

    fn run(
        &self,
        kind: Self::Kind,
        image: ArrayView2<'_, f64>,
        params: &Self::Params,
    ) -> Result<Self::Output>;
}
