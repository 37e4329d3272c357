//! Additive Log-Ratio (ALR) transformation for compositional data.
//!
//! ALR transforms compositional data by taking the log-ratio of each part
//! relative to a denominator part. The result is an unconstrained coordinate
//! system, but depends on which part is chosen as the denominator.
//!
//! # Comparison with CLR
//!
//! | Property | CLR | ALR |
//! |----------|-----|-----|
//! | Output dimensions | D | D-1 (D with `null_col`) |
//! | Sum constraint | Sums to zero | None |
//! | Reference | Geometric mean | Single part |
//! | Interpretation | Relative to average | Relative to denominator |

use crate::closure::close;
use crate::error::{CodaError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the ALR denominator is chosen on a labeled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlrReference {
    /// Column position; negative values count from the end.
    Index(isize),
    /// Column name.
    Column(String),
}

impl Default for AlrReference {
    fn default() -> Self {
        AlrReference::Index(-1)
    }
}

impl AlrReference {
    /// Resolve to a column position within `columns`.
    pub fn resolve(&self, columns: &[String]) -> Result<usize> {
        match self {
            AlrReference::Index(ind) => resolve_index(*ind, columns.len()),
            AlrReference::Column(name) => columns.iter().position(|c| c == name).ok_or_else(|| {
                CodaError::InvalidParameter(format!(
                    "Denominator column '{}' not found",
                    name
                ))
            }),
        }
    }
}

/// Resolve a possibly negative index against `d` parts.
pub fn resolve_index(ind: isize, d: usize) -> Result<usize> {
    let resolved = if ind < 0 { ind + d as isize } else { ind };
    if resolved < 0 || resolved >= d as isize {
        return Err(CodaError::InvalidParameter(format!(
            "ALR index {} out of bounds for {} parts",
            ind, d
        )));
    }
    Ok(resolved as usize)
}

/// Apply the Additive Log-Ratio transformation.
///
/// # Formula
/// ALR(x_ij) = log(x_ij / x_i,ind)
///
/// # Arguments
/// * `x` - Composition of shape (N, D)
/// * `ind` - Index of the denominator part; negative values count from the end
/// * `null_col` - Keep the (all-zero) denominator column in the output
///
/// # Returns
/// Array of shape (N, D-1), or (N, D) when `null_col` is set.
///
/// Zero parts give infinite or NaN log-ratios; NaN propagates.
pub fn alr(x: &DMatrix<f64>, ind: isize, null_col: bool) -> Result<DMatrix<f64>> {
    let (n_rows, n_parts) = x.shape();
    if n_parts == 0 {
        return Err(CodaError::EmptyData(
            "Cannot apply ALR to a composition with no parts".to_string(),
        ));
    }
    let denominator = resolve_index(ind, n_parts)?;
    debug!(rows = n_rows, parts = n_parts, denominator, null_col, "alr");

    let kept: Vec<usize> = (0..n_parts)
        .filter(|&j| null_col || j != denominator)
        .collect();

    Ok(DMatrix::from_fn(n_rows, kept.len(), |i, j| {
        (x[(i, kept[j])] / x[(i, denominator)]).ln()
    }))
}

/// Inverse Additive Log-Ratio transformation.
///
/// Reinserts the denominator as a zero log-ratio at position `ind` of the
/// D-part output (unless `null_col`, in which case it is already present),
/// exponentiates and closes. Use the same `ind` and `null_col` as the forward
/// call; the result is the closed composition.
pub fn inverse_alr(y: &DMatrix<f64>, ind: isize, null_col: bool) -> Result<DMatrix<f64>> {
    let (n_rows, n_cols) = y.shape();
    debug!(rows = n_rows, cols = n_cols, ind, null_col, "inverse alr");

    let log_ratios = if null_col {
        y.clone()
    } else {
        let n_parts = n_cols + 1;
        let denominator = resolve_index(ind, n_parts)?;
        DMatrix::from_fn(n_rows, n_parts, |i, j| {
            if j < denominator {
                y[(i, j)]
            } else if j == denominator {
                0.0
            } else {
                y[(i, j - 1)]
            }
        })
    };

    Ok(close(&log_ratios.map(f64::exp)))
}

/// ALR of a single 1-D composition.
pub fn alr_vector(x: &[f64], ind: isize, null_col: bool) -> Result<Vec<f64>> {
    let row = DMatrix::from_row_slice(1, x.len(), x);
    Ok(alr(&row, ind, null_col)?.iter().copied().collect())
}

/// Inverse ALR of a single 1-D coordinate vector.
pub fn inverse_alr_vector(y: &[f64], ind: isize, null_col: bool) -> Result<Vec<f64>> {
    let row = DMatrix::from_row_slice(1, y.len(), y);
    Ok(inverse_alr(&row, ind, null_col)?.iter().copied().collect())
}

/// Column labels for ALR output: `"{part}/{denominator}"`.
pub fn alr_labels(columns: &[String], denominator: usize, null_col: bool) -> Vec<String> {
    let reference = &columns[denominator];
    columns
        .iter()
        .enumerate()
        .filter(|(j, _)| null_col || *j != denominator)
        .map(|(_, c)| format!("{}/{}", c, reference))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_data() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    #[test]
    fn test_alr_manual_calculation() {
        let y = alr(&create_test_data(), -1, false).unwrap();
        assert_eq!(y.shape(), (2, 2));

        assert_relative_eq!(y[(0, 0)], (1.0_f64 / 3.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(y[(0, 1)], (2.0_f64 / 3.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(y[(1, 0)], (4.0_f64 / 6.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(y[(1, 1)], (5.0_f64 / 6.0).ln(), epsilon = 1e-12);

        assert_relative_eq!(y[(0, 0)], -1.0986, epsilon = 1e-4);
        assert_relative_eq!(y[(1, 1)], -0.1823, epsilon = 1e-4);
    }

    #[test]
    fn test_alr_null_col_keeps_zero_column() {
        let y = alr(&create_test_data(), 1, true).unwrap();
        assert_eq!(y.shape(), (2, 3));
        assert_eq!(y[(0, 1)], 0.0);
        assert_eq!(y[(1, 1)], 0.0);
        assert_relative_eq!(y[(0, 0)], 0.5_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_alr_roundtrip_every_index() {
        let x = DMatrix::from_row_slice(
            3,
            4,
            &[
                0.1, 0.2, 0.3, 0.4, //
                5.0, 1.0, 2.0, 2.0, //
                7.5, 0.5, 1.0, 11.0,
            ],
        );
        let closed = close(&x);

        for ind in -4isize..4 {
            for null_col in [false, true] {
                let y = alr(&x, ind, null_col).unwrap();
                let back = inverse_alr(&y, ind, null_col).unwrap();
                assert_eq!(back.shape(), x.shape());
                for (a, b) in back.iter().zip(closed.iter()) {
                    assert_relative_eq!(*a, *b, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_inverse_alr_places_denominator() {
        // Zero log-ratios everywhere except a single coordinate
        let y = DMatrix::from_row_slice(1, 2, &[2.0_f64.ln(), 0.0]);
        let x = inverse_alr(&y, 0, false).unwrap();
        // Denominator at position 0, then parts 1 and 2
        assert_relative_eq!(x[(0, 0)], 0.25, epsilon = 1e-12);
        assert_relative_eq!(x[(0, 1)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(x[(0, 2)], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_alr_vector() {
        let y = alr_vector(&[1.0, 2.0, 4.0], 0, false).unwrap();
        assert_eq!(y.len(), 2);
        assert_relative_eq!(y[0], 2.0_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(y[1], 4.0_f64.ln(), epsilon = 1e-12);

        let x = inverse_alr_vector(&y, 0, false).unwrap();
        assert_relative_eq!(x[0], 1.0 / 7.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 4.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_alr_invalid_index() {
        assert!(alr(&create_test_data(), 3, false).is_err());
        assert!(alr(&create_test_data(), -4, false).is_err());
        assert!(inverse_alr(&create_test_data(), 3, false).is_ok());
        assert!(inverse_alr(&create_test_data(), 4, false).is_err());
    }

    #[test]
    fn test_alr_rejects_empty() {
        let x = DMatrix::<f64>::zeros(2, 0);
        assert!(matches!(alr(&x, -1, false), Err(CodaError::EmptyData(_))));
    }

    #[test]
    fn test_alr_propagates_nan_and_zero() {
        let x = DMatrix::from_row_slice(1, 3, &[f64::NAN, 0.0, 1.0]);
        let y = alr(&x, -1, false).unwrap();
        assert!(y[(0, 0)].is_nan());
        assert_eq!(y[(0, 1)], f64::NEG_INFINITY);
    }

    #[test]
    fn test_reference_resolution() {
        let columns: Vec<String> = vec!["MgO".into(), "SiO2".into(), "CaO".into()];
        assert_eq!(AlrReference::default().resolve(&columns).unwrap(), 2);
        assert_eq!(AlrReference::Index(-3).resolve(&columns).unwrap(), 0);
        assert_eq!(
            AlrReference::Column("SiO2".into()).resolve(&columns).unwrap(),
            1
        );
        assert!(AlrReference::Column("FeO".into()).resolve(&columns).is_err());
    }

    #[test]
    fn test_alr_labels() {
        let columns: Vec<String> = vec!["MgO".into(), "SiO2".into(), "CaO".into()];
        assert_eq!(alr_labels(&columns, 1, false), vec!["MgO/SiO2", "CaO/SiO2"]);
        assert_eq!(
            alr_labels(&columns, 1, true),
            vec!["MgO/SiO2", "SiO2/SiO2", "CaO/SiO2"]
        );
    }
}
