use crate::data::min_max;
use crate::error::Result;
use crate::pipeline::{array1_value, OpRecord, OperationFamily, OperationKind, Record, ResultMap};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Number of histogram bins
pub const HISTOGRAM_BINS: usize = 1000;

/// The stats operations take no options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsParams {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub min: f64,
    pub max: f64,
    /// Reported for compatibility; equals `median`.
    pub average: f64,
    pub median: f64,
    /// Arithmetic mean of all samples
    pub mean: f64,
    pub count: usize,
}

impl BasicStats {
    fn empty() -> Self {
        Self {
            min: f64::NAN,
            max: f64::NAN,
            average: f64::NAN,
            median: f64::NAN,
            mean: f64::NAN,
            count: 0,
        }
    }
}

/// Order statistics of every sample in `image`.
///
/// With `s` sorted and `m = n / 2` the median is `(s[m - 1] + s[m]) / 2`,
/// where `m - 1` wraps to the last sample for a single-sample image.
pub fn basics(image: ArrayView2<'_, f64>) -> BasicStats {
    let mut sorted: Vec<f64> = image.iter().copied().collect();
    if sorted.is_empty() {
        return BasicStats::empty();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let m = n / 2;
    let below = if m == 0 { n - 1 } else { m - 1 };
    let median = 0.5 * (sorted[below] + sorted[m]);

    BasicStats {
        min: sorted[0],
        max: sorted[n - 1],
        average: median,
        median,
        mean: sorted.iter().sum::<f64>() / n as f64,
        count: n,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin centers
    pub bins: Array1<f64>,
    /// Samples per bin
    pub counts: Array1<u64>,
}

/// [`HISTOGRAM_BINS`] equal-width bins spanning the sample range.
///
/// The last bin includes its upper edge. A constant image is binned over
/// `[v - 0.5, v + 0.5]`, an empty one over `[0, 1]`.
pub fn histogram(image: ArrayView2<'_, f64>) -> Histogram {
    let (lo, hi) = match min_max(image.iter().filter(|v| v.is_finite())) {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
        Some(range) => range,
    };
    let width = (hi - lo) / HISTOGRAM_BINS as f64;

    let mut counts = Array1::<u64>::zeros(HISTOGRAM_BINS);
    for &v in image.iter() {
        if !(v >= lo && v <= hi) {
            continue;
        }
        let bin = (((v - lo) / width) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }
    let bins = Array1::from_shape_fn(HISTOGRAM_BINS, |i| lo + (i as f64 + 0.5) * width);
    Histogram { bins, counts }
}

/// Last computed [`BasicStats`], kept apart from the computation itself.
#[derive(Debug, Default)]
pub struct StatsCache {
    latest: Mutex<Option<BasicStats>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, stats: BasicStats) {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *latest = Some(stats);
    }

    /// `None` until `basics` ran at least once since the last invalidation.
    pub fn latest(&self) -> Option<BasicStats> {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn invalidate(&self) {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *latest = None;
    }

    /// Compute and remember the statistics of `image`.
    pub fn basics(&self, image: ArrayView2<'_, f64>) -> BasicStats {
        let stats = basics(image);
        self.store(stats);
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsOp {
    Basics,
    Histogram,
}

impl OperationKind for StatsOp {
    fn all() -> &'static [Self] {
        &[StatsOp::Basics, StatsOp::Histogram]
    }

    fn name(self) -> &'static str {
        match self {
            StatsOp::Basics => "basics",
            StatsOp::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsOutput {
    Basics(BasicStats),
    Histogram(Histogram),
}

impl Record for StatsOutput {
    fn to_record(&self) -> ResultMap {
        let mut record = ResultMap::new();
        record.insert("op".to_string(), self.op().into());
        match self {
            StatsOutput::Basics(stats) => {
                record.insert("min".to_string(), stats.min.into());
                record.insert("max".to_string(), stats.max.into());
                record.insert("average".to_string(), stats.average.into());
                record.insert("median".to_string(), stats.median.into());
                record.insert("mean".to_string(), stats.mean.into());
                record.insert("count".to_string(), stats.count.into());
            }
            StatsOutput::Histogram(histogram) => {
                record.insert("bins".to_string(), array1_value(histogram.bins.view()));
                let counts = histogram.counts.iter().map(|&c| Value::from(c)).collect();
                record.insert("counts".to_string(), Value::Array(counts));
            }
        }
        record
    }
}

impl OpRecord for StatsOutput {
    fn op(&self) -> &'static str {
        match self {
            StatsOutput::Basics(_) => StatsOp::Basics.name(),
            StatsOutput::Histogram(_) => StatsOp::Histogram.name(),
        }
    }
}

/// The statistics family. With a cache attached, every `basics` run
/// stores its result there.
#[derive(Debug, Clone, Default)]
pub struct Stats2D {
    cache: Option<Arc<StatsCache>>,
}

impl Stats2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<StatsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<StatsCache>> {
        self.cache.as_ref()
    }
}

impl OperationFamily for Stats2D {
    type Kind = StatsOp;
    type Params = StatsParams;
    type Output = StatsOutput;

    fn family_name(&self) -> &'static str {
        "Stats2D"
    }

    fn run(
        &self,
        kind: StatsOp,
        image: ArrayView2<'_, f64>,
        _params: &StatsParams,
    ) -> Result<StatsOutput> {
        match kind {
            StatsOp::Basics => {
                let stats = match &self.cache {
                    Some(cache) => cache.basics(image),
                    None => basics(image),
                };
                debug!(count = stats.count, median = stats.median, "Computed basic statistics");
                Ok(StatsOutput::Basics(stats))
            }
            StatsOp::Histogram => Ok(StatsOutput::Histogram(histogram(image))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_even_count_median_averages_middle_values() {
        let stats = basics(array![[4.0, 1.0], [3.0, 2.0]].view());
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.average, stats.median);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn test_odd_count_median_uses_lower_pair() {
        let stats = basics(array![[1.0, 2.0, 10.0]].view());
        assert_eq!(stats.median, 1.5);
        assert!((stats.mean - 13.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_median() {
        let stats = basics(array![[7.0]].view());
        assert_eq!(stats.median, 7.0);
    }

    #[test]
    fn test_empty_image_is_nan() {
        let stats = basics(Array2::<f64>::zeros((0, 3)).view());
        assert!(stats.min.is_nan() && stats.max.is_nan() && stats.median.is_nan());
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_histogram_edges() {
        let histogram = histogram(array![[0.0, 1000.0], [500.0, 999.5]].view());
        assert_eq!(histogram.counts[0], 1);
        assert_eq!(histogram.counts[500], 1);
        assert_eq!(histogram.counts[999], 2);
        assert!((histogram.bins[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_image_histogram() {
        let histogram = histogram(Array2::from_elem((3, 3), 2.0).view());
        assert_eq!(histogram.counts.sum(), 9);
        assert!((histogram.bins[0] - (1.5 + 0.0005)).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_record_counts_are_integers() {
        let output = StatsOutput::Histogram(histogram(array![[1.0, 2.0], [2.0, 3.0]].view()));
        let record = output.to_record();
        let counts = record["counts"].as_array().unwrap();
        assert_eq!(counts.len(), HISTOGRAM_BINS);
        assert!(counts.iter().all(|c| c.is_u64()));
        assert_eq!(counts.iter().filter_map(|c| c.as_u64()).sum::<u64>(), 4);
    }

    #[test]
    fn test_cache_lifecycle() {
        let cache = StatsCache::new();
        assert!(cache.latest().is_none());
        let stats = cache.basics(array![[1.0, 2.0]].view());
        assert_eq!(cache.latest(), Some(stats));
        cache.invalidate();
        assert!(cache.latest().is_none());
    }
}
