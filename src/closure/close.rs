//! Closure operator for compositional data.
//!
//! Closure divides every part of a composition by the total of its row so the
//! parts sum to one. No check is made for non-positive parts: zeros and
//! negatives pass straight through and a zero total yields NaN or infinity.

use nalgebra::DMatrix;

/// NaN-aware sum: NaN entries are skipped, infinities are kept.
///
/// An all-NaN (or empty) slice sums to zero.
pub fn nansum(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

/// Plain sum; any NaN entry makes the total NaN.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Per-row totals of a matrix using the given aggregation.
pub(crate) fn row_totals<F>(x: &DMatrix<f64>, sum_fn: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    (0..x.nrows())
        .map(|i| {
            let row: Vec<f64> = x.row(i).iter().copied().collect();
            sum_fn(&row)
        })
        .collect()
}

/// Close each row of an (N, D) composition so that it sums to one.
///
/// # Example
/// ```
/// use geochem_coda::closure::close;
/// use nalgebra::DMatrix;
///
/// let x = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 2.0]);
/// let closed = close(&x);
/// assert_eq!(closed[(0, 2)], 0.5);
/// ```
pub fn close(x: &DMatrix<f64>) -> DMatrix<f64> {
    close_with(x, sum)
}

/// Close each row using a caller-supplied row aggregation (e.g. [`nansum`]).
pub fn close_with<F>(x: &DMatrix<f64>, sum_fn: F) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let totals = row_totals(x, sum_fn);
    DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] / totals[i])
}

/// Close a single 1-D composition.
pub fn close_vector(x: &[f64]) -> Vec<f64> {
    close_vector_with(x, sum)
}

/// Close a single 1-D composition using a caller-supplied aggregation.
pub fn close_vector_with<F>(x: &[f64], sum_fn: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let total = sum_fn(x);
    x.iter().map(|v| v / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_close_rows_sum_to_one() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let closed = close(&x);

        assert_relative_eq!(closed[(0, 0)], 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(closed[(0, 1)], 2.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(closed[(0, 2)], 3.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(closed[(1, 0)], 4.0 / 15.0, epsilon = 1e-12);
        assert_relative_eq!(closed[(1, 1)], 5.0 / 15.0, epsilon = 1e-12);
        assert_relative_eq!(closed[(1, 2)], 6.0 / 15.0, epsilon = 1e-12);

        for i in 0..2 {
            assert_relative_eq!(closed.row(i).sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_close_does_not_mutate_input() {
        let x = DMatrix::from_row_slice(1, 2, &[3.0, 1.0]);
        let _ = close(&x);
        assert_eq!(x[(0, 0)], 3.0);
    }

    #[test]
    fn test_close_vector() {
        let closed = close_vector(&[2.0, 6.0]);
        assert_relative_eq!(closed[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(closed[1], 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_close_zero_row_is_nan() {
        let x = DMatrix::from_row_slice(1, 2, &[0.0, 0.0]);
        let closed = close(&x);
        assert!(closed[(0, 0)].is_nan());
    }

    #[test]
    fn test_close_nan_propagates_with_plain_sum() {
        let x = DMatrix::from_row_slice(1, 3, &[1.0, f64::NAN, 1.0]);
        let closed = close(&x);
        assert!(closed[(0, 0)].is_nan());

        let closed = close_with(&x, nansum);
        assert_relative_eq!(closed[(0, 0)], 0.5, epsilon = 1e-12);
        assert!(closed[(0, 1)].is_nan());
    }

    #[test]
    fn test_nansum() {
        assert_eq!(nansum(&[1.0, f64::NAN, 2.0]), 3.0);
        assert_eq!(nansum(&[f64::NAN]), 0.0);
        assert_eq!(nansum(&[1.0, f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }
}
