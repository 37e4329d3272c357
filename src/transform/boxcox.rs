//! Box-Cox power transformation with grid-search lambda estimation.
//!
//! For lambda != 0: y = (x^lambda - 1) / lambda
//! For lambda == 0: y = ln(x)
//!
//! A single lambda is shared by every column. When no lambda is given it is
//! chosen by maximising the summed Box-Cox log-likelihood of the columns over
//! an evenly spaced grid. The lambda must be kept by the caller to invert.

use crate::error::{CodaError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Parameters for [`boxcox`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxCoxConfig {
    /// Fixed lambda; `None` searches for one.
    pub lambda: Option<f64>,
    /// Inclusive (min, max) range of the lambda grid.
    pub search_space: (f64, f64),
    /// Number of grid points.
    pub search_steps: usize,
}

impl Default for BoxCoxConfig {
    fn default() -> Self {
        Self {
            lambda: None,
            search_space: (-1.0, 5.0),
            search_steps: 100,
        }
    }
}

impl BoxCoxConfig {
    /// Configuration with a fixed lambda.
    pub fn with_lambda(lambda: f64) -> Self {
        Self {
            lambda: Some(lambda),
            ..Self::default()
        }
    }

    /// Configuration searching the given grid.
    pub fn search(min: f64, max: f64, steps: usize) -> Self {
        Self {
            lambda: None,
            search_space: (min, max),
            search_steps: steps,
        }
    }

    fn validate(&self) -> Result<()> {
        let (min, max) = self.search_space;
        if self.search_steps == 0 {
            return Err(CodaError::InvalidParameter(
                "Lambda search needs at least one step".to_string(),
            ));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(CodaError::InvalidParameter(
                "Lambda search space must be finite".to_string(),
            ));
        }
        if self.search_steps > 1 && min >= max {
            return Err(CodaError::InvalidParameter(format!(
                "Lambda search space ({}, {}) is empty",
                min, max
            )));
        }
        Ok(())
    }
}

/// Transformed data together with the lambda that produced it.
#[derive(Debug, Clone)]
pub struct BoxCoxResult {
    /// Transformed data, same shape as the input.
    pub data: DMatrix<f64>,
    /// Lambda used for every column.
    pub lambda: f64,
}

impl BoxCoxResult {
    /// Inverse transform to recover original scale.
    pub fn inverse(&self) -> DMatrix<f64> {
        inverse_boxcox(&self.data, self.lambda)
    }
}

/// Outcome of a lambda grid search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaSelection {
    /// Evaluated lambda values.
    pub grid: Vec<f64>,
    /// Aggregate log-likelihood at each grid point.
    pub log_likelihood: Vec<f64>,
    /// Every grid point equal to the maximum log-likelihood.
    pub candidates: Vec<f64>,
}

impl LambdaSelection {
    /// Whether more than one grid point attains the maximum.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }

    /// The maximiser, or [`CodaError::AmbiguousLambda`] if several tie.
    pub fn unique(&self) -> Result<f64> {
        match self.candidates.as_slice() {
            [lambda] => Ok(*lambda),
            _ => Err(CodaError::AmbiguousLambda {
                candidates: self.candidates.clone(),
            }),
        }
    }

    /// Smallest tied maximiser.
    pub fn first(&self) -> Option<f64> {
        self.candidates.first().copied()
    }
}

/// `steps` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (steps - 1) as f64;
            let mut values: Vec<f64> = (0..steps).map(|i| start + i as f64 * step).collect();
            values[steps - 1] = stop;
            values
        }
    }
}

/// Box-Cox transform of a single value; non-positive values map to NaN.
#[inline]
pub fn boxcox_value(x: f64, lambda: f64) -> f64 {
    if x <= 0.0 {
        f64::NAN
    } else if lambda == 0.0 {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

/// Inverse Box-Cox of a single value; out-of-domain values map to NaN.
#[inline]
pub fn inverse_boxcox_value(y: f64, lambda: f64) -> f64 {
    if lambda == 0.0 {
        y.exp()
    } else {
        ((lambda * y).ln_1p() / lambda).exp()
    }
}

/// Box-Cox log-likelihood of `data` at `lambda`.
///
/// llf = (lambda - 1) Σ ln x - N/2 ln(var(boxcox(x, lambda)))
///
/// Uses the population variance. NaN or non-positive data give NaN; constant
/// data give +inf.
pub fn boxcox_llf(data: &[f64], lambda: f64) -> f64 {
    let n = data.len();
    if n == 0 {
        return f64::NAN;
    }
    let log_sum: f64 = data.iter().map(|x| x.ln()).sum();

    let transformed: Vec<f64> = data.iter().map(|&x| boxcox_value(x, lambda)).collect();
    let mean = transformed.iter().sum::<f64>() / n as f64;
    let variance = transformed.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n as f64;

    (lambda - 1.0) * log_sum - 0.5 * n as f64 * variance.ln()
}

/// Search for the lambda maximising the log-likelihood of every column.
///
/// Columns are evaluated independently and their log-likelihoods summed per
/// grid point, skipping NaN. All grid points equal to the maximum are
/// returned as candidates.
pub fn search_lambda(x: &DMatrix<f64>, search_space: (f64, f64), steps: usize) -> Result<LambdaSelection> {
    BoxCoxConfig::search(search_space.0, search_space.1, steps).validate()?;
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(CodaError::EmptyData(
            "Cannot search for a Box-Cox lambda on empty data".to_string(),
        ));
    }

    let grid = linspace(search_space.0, search_space.1, steps);

    let per_column: Vec<Vec<f64>> = (0..x.ncols())
        .into_par_iter()
        .map(|j| {
            let column: Vec<f64> = x.column(j).iter().copied().collect();
            grid.iter().map(|&lambda| boxcox_llf(&column, lambda)).collect()
        })
        .collect();

    let log_likelihood: Vec<f64> = if per_column.len() == 1 {
        per_column[0].clone()
    } else {
        (0..grid.len())
            .map(|k| {
                per_column
                    .iter()
                    .map(|llf| llf[k])
                    .filter(|v| !v.is_nan())
                    .sum()
            })
            .collect()
    };

    let max = log_likelihood
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if log_likelihood.iter().all(|v| v.is_nan()) {
        return Err(CodaError::Numerical(
            "Box-Cox log-likelihood is NaN across the whole search grid".to_string(),
        ));
    }

    let candidates: Vec<f64> = grid
        .iter()
        .zip(&log_likelihood)
        .filter(|(_, &llf)| llf == max)
        .map(|(&lambda, _)| lambda)
        .collect();

    debug!(
        columns = x.ncols(),
        steps,
        min = search_space.0,
        max = search_space.1,
        selected = ?candidates,
        "box-cox lambda search"
    );
    if candidates.len() > 1 {
        warn!(ties = candidates.len(), "box-cox lambda search found tied maxima");
    }

    Ok(LambdaSelection {
        grid,
        log_likelihood,
        candidates,
    })
}

/// Apply the Box-Cox transformation columnwise.
///
/// With `config.lambda == None` the lambda is found by [`search_lambda`];
/// tied maxima are reported as [`CodaError::AmbiguousLambda`] so the caller
/// can choose one from the candidates and call again with a fixed lambda.
///
/// A single-row input is searched as one series of its D values, since each
/// one-value column has no variance to fit.
pub fn boxcox(x: &DMatrix<f64>, config: &BoxCoxConfig) -> Result<BoxCoxResult> {
    let lambda = match config.lambda {
        Some(lambda) => lambda,
        None if x.nrows() == 1 => {
            search_lambda(&x.transpose(), config.search_space, config.search_steps)?.unique()?
        }
        None => search_lambda(x, config.search_space, config.search_steps)?.unique()?,
    };
    debug!(rows = x.nrows(), cols = x.ncols(), lambda, "box-cox");

    Ok(BoxCoxResult {
        data: x.map(|v| boxcox_value(v, lambda)),
        lambda,
    })
}

/// Box-Cox of a single series; returns the transformed series and lambda.
pub fn boxcox_slice(x: &[f64], config: &BoxCoxConfig) -> Result<(Vec<f64>, f64)> {
    let column = DMatrix::from_column_slice(x.len(), 1, x);
    let result = boxcox(&column, config)?;
    Ok((result.data.iter().copied().collect(), result.lambda))
}

/// Inverse Box-Cox transformation for a known lambda.
pub fn inverse_boxcox(y: &DMatrix<f64>, lambda: f64) -> DMatrix<f64> {
    y.map(|v| inverse_boxcox_value(v, lambda))
}

/// Inverse Box-Cox of a single series.
pub fn inverse_boxcox_slice(y: &[f64], lambda: f64) -> Vec<f64> {
    y.iter().map(|&v| inverse_boxcox_value(v, lambda)).collect()
}
