//! Centred Log-Ratio (CLR) transformation for compositional data.

use crate::closure::{close, close_with, nansum};
use crate::closure::close::row_totals;
use crate::error::{CodaError, Result};
use nalgebra::DMatrix;
use tracing::debug;

/// Apply the Centred Log-Ratio transformation.
///
/// CLR closes each row, takes the log of every part, and subtracts the
/// row mean of the logs (the log of the geometric mean).
///
/// # Formula
/// For sample i: CLR(x_ij) = log(c_ij) - (1/D) Σ_j log(c_ij), with c = close(x)
///
/// # NaN handling
/// The row total of the logs skips NaN but is always divided by D, not by
/// the number of finite parts. Rows containing NaN are therefore not centred
/// to a zero sum.
///
/// # Returns
/// Array of shape (N, D).
pub fn clr(x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (n_rows, n_parts) = x.shape();
    if n_parts == 0 {
        return Err(CodaError::EmptyData(
            "Cannot apply CLR to a composition with no parts".to_string(),
        ));
    }
    debug!(rows = n_rows, parts = n_parts, "clr");

    let log_data = close(x).map(f64::ln);
    let centres: Vec<f64> = row_totals(&log_data, nansum)
        .into_iter()
        .map(|total| total / n_parts as f64)
        .collect();

    Ok(DMatrix::from_fn(n_rows, n_parts, |i, j| {
        log_data[(i, j)] - centres[i]
    }))
}

/// Inverse Centred Log-Ratio transformation.
///
/// Exponentiates and closes each row with a NaN-aware total.
pub fn inverse_clr(y: &DMatrix<f64>) -> DMatrix<f64> {
    debug!(rows = y.nrows(), parts = y.ncols(), "inverse clr");
    close_with(&y.map(f64::exp), nansum)
}

/// Column labels for CLR output: `"CLR({part}/g)"`.
pub fn clr_labels(columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| format!("CLR({}/g)", c)).collect()
}
