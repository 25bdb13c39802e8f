//! Nonlinear least squares
//!
//! Levenberg-Marquardt on the normal equations, with a Gaussian peak
//! model parameterized by height, position and full width at half maximum.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Conversion factor between a Gaussian's FWHM and its standard deviation
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("normal equations are singular")]
    Singular,
    #[error("{points} points cannot constrain {params} parameters")]
    InsufficientData { points: usize, params: usize },
    #[error("expected {expected} initial parameters, got {got}")]
    ParameterCount { expected: usize, got: usize },
}

/// A model `y = f(x; params)` with analytic first derivatives.
pub trait FitModel: Send + Sync {
    fn n_params(&self) -> usize;

    fn value(&self, x: f64, params: &[f64]) -> f64;

    /// Partial derivatives of the model at `x`, one per parameter.
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: Vec<f64>,
    /// Reduced chi-square of the final parameters
    pub chi_square: f64,
    /// One standard deviation uncertainty per parameter
    pub sigma: Vec<f64>,
    pub iterations: usize,
}

pub trait LeastSquaresSolver: Send + Sync {
    fn fit(
        &self,
        model: &dyn FitModel,
        initial: &[f64],
        xdata: &[f64],
        ydata: &[f64],
    ) -> Result<FitOutcome, FitError>;
}

/// `height * exp(-(x - position)^2 / (2 sigma^2))` with
/// `sigma = fwhm / (2 sqrt(2 ln 2))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gaussian;

impl FitModel for Gaussian {
    fn n_params(&self) -> usize {
        3
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        let (height, position, fwhm) = (params[0], params[1], params[2]);
        let d = (x - position) * FWHM_PER_SIGMA / fwhm;
        height * (-0.5 * d * d).exp()
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (height, position, fwhm) = (params[0], params[1], params[2]);
        let sigma = fwhm / FWHM_PER_SIGMA;
        let d = (x - position) / sigma;
        let e = (-0.5 * d * d).exp();
        out[0] = e;
        out[1] = height * e * d / sigma;
        out[2] = height * e * d * d / fwhm;
    }
}

#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    /// Relative chi-square decrease below which iteration stops
    pub tolerance: f64,
    pub initial_lambda: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
            initial_lambda: 1e-3,
        }
    }
}

struct NormalEquations {
    alpha: Array2<f64>,
    beta: Array1<f64>,
    chi2: f64,
}

impl LevenbergMarquardt {
    fn normal_equations(
        model: &dyn FitModel,
        params: &[f64],
        xdata: &[f64],
        ydata: &[f64],
    ) -> NormalEquations {
        let p = params.len();
        let mut alpha = Array2::<f64>::zeros((p, p));
        let mut beta = Array1::<f64>::zeros(p);
        let mut chi2 = 0.0;
        let mut grad = vec![0.0; p];

        for (&x, &y) in xdata.iter().zip(ydata) {
            let residual = y - model.value(x, params);
            model.gradient(x, params, &mut grad);
            for i in 0..p {
                beta[i] += grad[i] * residual;
                for j in 0..=i {
                    alpha[[i, j]] += grad[i] * grad[j];
                }
            }
            chi2 += residual * residual;
        }
        for i in 0..p {
            for j in 0..i {
                alpha[[j, i]] = alpha[[i, j]];
            }
        }
        NormalEquations { alpha, beta, chi2 }
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn fit(
        &self,
        model: &dyn FitModel,
        initial: &[f64],
        xdata: &[f64],
        ydata: &[f64],
    ) -> Result<FitOutcome, FitError> {
        let p = model.n_params();
        if initial.len() != p {
            return Err(FitError::ParameterCount {
                expected: p,
                got: initial.len(),
            });
        }
        let n = xdata.len().min(ydata.len());
        if n < p {
            return Err(FitError::InsufficientData { points: n, params: p });
        }

        let mut params = initial.to_vec();
        let mut current = Self::normal_equations(model, &params, xdata, ydata);
        if !current.chi2.is_finite() {
            return Err(FitError::Singular);
        }

        let mut lambda = self.initial_lambda;
        let mut iterations = 0;
        while iterations < self.max_iterations {
            iterations += 1;

            let mut damped = current.alpha.clone();
            for i in 0..p {
                damped[[i, i]] *= 1.0 + lambda;
            }
            let delta = solve(damped, current.beta.clone())?;
            let trial: Vec<f64> = params.iter().zip(delta.iter()).map(|(a, d)| a + d).collect();
            let candidate = Self::normal_equations(model, &trial, xdata, ydata);

            if candidate.chi2.is_finite() && candidate.chi2 <= current.chi2 {
                let converged = current.chi2 - candidate.chi2 <= self.tolerance * current.chi2;
                params = trial;
                current = candidate;
                lambda = (lambda / 10.0).max(1e-12);
                if converged {
                    break;
                }
            } else {
                lambda *= 10.0;
                if lambda > 1e12 {
                    break;
                }
            }
        }

        let covariance = invert(&current.alpha)?;
        let dof = (n - p).max(1) as f64;
        let reduced_chi2 = current.chi2 / dof;
        let sigma = (0..p)
            .map(|i| (covariance[[i, i]] * reduced_chi2).abs().sqrt())
            .collect();

        Ok(FitOutcome {
            params,
            chi_square: reduced_chi2,
            sigma,
            iterations,
        })
    }
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, FitError> {
    let n = b.len();
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if !(scale > 0.0) || !scale.is_finite() {
        return Err(FitError::Singular);
    }
    let eps = f64::EPSILON * scale * n as f64;

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if !(a[[pivot_row, col]].abs() > eps) {
            return Err(FitError::Singular);
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

fn invert(a: &Array2<f64>) -> Result<Array2<f64>, FitError> {
    let n = a.nrows();
    let mut inverse = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        let mut unit = Array1::<f64>::zeros(n);
        unit[i] = 1.0;
        let column = solve(a.clone(), unit)?;
        inverse.column_mut(i).assign(&column);
    }
    Ok(inverse)
}
