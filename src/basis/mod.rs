//! Orthonormal bases for the isometric log-ratio transform.
//!
//! The basis Ψ is a (D-1, D) matrix whose rows are mutually orthogonal unit
//! vectors, each orthogonal to the vector of ones, so that Ψ·Ψᵗ = I(D-1) and
//! Ψ maps centred log-ratio coordinates onto an isometric, non-redundant
//! coordinate system.
//!
//! # Construction
//!
//! Rows are those of the Helmert sub-matrix in reverse order. Row `k` of the
//! Helmert sub-matrix (k = 1..D-1) is
//!
//! ```text
//! ( 1, …, 1, -k, 0, …, 0 ) / sqrt(k (k + 1))
//!   └─ k ─┘
//! ```
//!
//! so the first ILR coordinate balances the last part against all others.

use crate::error::{CodaError, Result};
use nalgebra::DMatrix;

/// Maximum absolute deviation of Ψ·Ψᵗ from the identity that is accepted.
pub const BASIS_TOLERANCE: f64 = 1e-8;

/// Default orthonormal basis for `d`-part compositions.
///
/// Depends only on `d`; requires `d >= 2`.
pub fn orthogonal_basis_default(d: usize) -> Result<DMatrix<f64>> {
    if d < 2 {
        return Err(CodaError::InvalidParameter(format!(
            "An ILR basis requires at least 2 parts, got {}",
            d
        )));
    }

    let mut psi = DMatrix::zeros(d - 1, d);
    for row in 0..d - 1 {
        let k = d - 1 - row;
        let norm = ((k * (k + 1)) as f64).sqrt();
        for j in 0..k {
            psi[(row, j)] = 1.0 / norm;
        }
        psi[(row, k)] = -(k as f64) / norm;
    }
    Ok(psi)
}

/// Orthonormal basis matching the column structure of a reference array.
///
/// The reference fixes the number of parts, so a forward and inverse ILR
/// given the same reference use the same basis.
pub fn orthogonal_basis_from_array(reference: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    orthogonal_basis_default(reference.ncols())
}

/// Largest absolute deviation of Ψ·Ψᵗ from the identity.
pub fn orthonormality_deviation(psi: &DMatrix<f64>) -> f64 {
    let gram = psi * psi.transpose();
    let identity = DMatrix::<f64>::identity(gram.nrows(), gram.ncols());
    (gram - identity).amax()
}

/// Verify that Ψ·Ψᵗ equals the identity within [`BASIS_TOLERANCE`].
pub fn check_orthonormal(psi: &DMatrix<f64>) -> Result<()> {
    let max_deviation = orthonormality_deviation(psi);
    if max_deviation.is_nan() || max_deviation > BASIS_TOLERANCE {
        return Err(CodaError::BasisInvariant { max_deviation });
    }
    Ok(())
}
