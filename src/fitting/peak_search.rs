use ndarray::ArrayView1;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeakSearchError {
    #[error("no peaks found")]
    NoPeaks,
    #[error("peak search failed: {0}")]
    Failed(String),
}

/// Heuristic search for peak positions in a curve.
pub trait PeakSearch: Send + Sync {
    /// Indices of the peaks found in `curve`. `yscaling` multiplies the
    /// intensities before any noise estimate is made.
    fn seek(
        &self,
        curve: ArrayView1<'_, f64>,
        yscaling: f64,
    ) -> Result<Vec<usize>, PeakSearchError>;
}

/// Local maxima whose height above the curve's lower quartile is
/// significant under counting statistics.
#[derive(Debug, Clone)]
pub struct LocalMaximaSearch {
    /// Required height above the floor, in units of `sqrt(counts)`
    pub sensitivity: f64,
    /// Minimum separation between reported peaks, in samples
    pub min_distance: usize,
}

impl Default for LocalMaximaSearch {
    fn default() -> Self {
        Self {
            sensitivity: 3.5,
            min_distance: 3,
        }
    }
}

impl LocalMaximaSearch {
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_min_distance(mut self, min_distance: usize) -> Self {
        self.min_distance = min_distance;
        self
    }
}

impl PeakSearch for LocalMaximaSearch {
    fn seek(
        &self,
        curve: ArrayView1<'_, f64>,
        yscaling: f64,
    ) -> Result<Vec<usize>, PeakSearchError> {
        let n = curve.len();
        if n < 3 {
            return Err(PeakSearchError::Failed(format!(
                "curve of {} samples is too short",
                n
            )));
        }
        let scaled: Vec<f64> = curve.iter().map(|&y| y * yscaling).collect();
        if scaled.iter().any(|y| !y.is_finite()) {
            return Err(PeakSearchError::Failed("curve contains non-finite samples".to_string()));
        }

        let mut sorted = scaled.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let floor = sorted[n / 4];

        let mut candidates: Vec<(usize, f64)> = (1..n - 1)
            .filter(|&i| scaled[i] > scaled[i - 1] && scaled[i] >= scaled[i + 1])
            .filter(|&i| {
                let noise = scaled[i].abs().max(1.0).sqrt();
                (scaled[i] - floor) / noise > self.sensitivity
            })
            .map(|i| (i, scaled[i]))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut used = vec![false; n];
        let mut peaks = Vec::new();
        for (idx, _) in candidates {
            let lo = idx.saturating_sub(self.min_distance);
            let hi = (idx + self.min_distance).min(n - 1);
            if used[lo..=hi].iter().any(|&u| u) {
                continue;
            }
            used[idx] = true;
            peaks.push(idx);
        }

        if peaks.is_empty() {
            return Err(PeakSearchError::NoPeaks);
        }
        peaks.sort_unstable();
        Ok(peaks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn two_peaks() -> Array1<f64> {
        Array1::from_shape_fn(60, |i| {
            let x = i as f64;
            5.0 * (-(x - 15.0).powi(2) / 8.0).exp() + 9.0 * (-(x - 42.0).powi(2) / 8.0).exp()
        })
    }

    #[test]
    fn test_finds_both_peaks() {
        let peaks = LocalMaximaSearch::default().seek(two_peaks().view(), 100.0).unwrap();
        assert_eq!(peaks, vec![15, 42]);
    }

    #[test]
    fn test_flat_curve_has_no_peaks() {
        let flat = Array1::from_elem(20, 3.0);
        assert_eq!(
            LocalMaximaSearch::default().seek(flat.view(), 100.0),
            Err(PeakSearchError::NoPeaks)
        );
    }

    #[test]
    fn test_non_finite_curve_fails() {
        let mut curve = two_peaks();
        curve[3] = f64::NAN;
        assert!(matches!(
            LocalMaximaSearch::default().seek(curve.view(), 100.0),
            Err(PeakSearchError::Failed(_))
        ));
    }
}
