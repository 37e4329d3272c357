//! Isometric Log-Ratio (ILR) transformation for compositional data.
//!
//! ILR projects centred log-ratio coordinates onto an orthonormal basis Ψ,
//! giving D-1 non-redundant coordinates that preserve Aitchison distances.

use crate::basis::{check_orthonormal, orthogonal_basis_default, orthogonal_basis_from_array};
use crate::error::{CodaError, Result};
use crate::transform::clr::{clr, inverse_clr};
use nalgebra::DMatrix;
use tracing::debug;

/// Apply the Isometric Log-Ratio transformation.
///
/// # Formula
/// ILR(x) = CLR(x) · Ψᵗ, with Ψ derived from the columns of `x`
///
/// # Returns
/// Array of shape (N, D-1).
///
/// # Errors
/// Fails when `x` has fewer than two parts, or if the basis is not
/// orthonormal.
pub fn ilr(x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let psi = orthogonal_basis_from_array(x)?;
    check_orthonormal(&psi)?;
    debug!(rows = x.nrows(), parts = x.ncols(), "ilr");

    Ok(clr(x)? * psi.transpose())
}

/// Inverse Isometric Log-Ratio transformation.
///
/// With a `reference`, the basis is derived from it exactly as the forward
/// transform derives it from its input; pass the array used in the forward
/// call. Without one, the default basis for D = `y.ncols() + 1` is used.
/// A reference of a different width is rejected.
///
/// # Returns
/// Closed composition of shape (N, D).
pub fn inverse_ilr(y: &DMatrix<f64>, reference: Option<&DMatrix<f64>>) -> Result<DMatrix<f64>> {
    let n_parts = y.ncols() + 1;
    let psi = match reference {
        Some(reference) => {
            if reference.ncols() != n_parts {
                return Err(CodaError::DimensionMismatch {
                    expected: n_parts,
                    actual: reference.ncols(),
                });
            }
            orthogonal_basis_from_array(reference)?
        }
        None => orthogonal_basis_default(n_parts)?,
    };
    debug!(
        rows = y.nrows(),
        parts = n_parts,
        with_reference = reference.is_some(),
        "inverse ilr"
    );

    Ok(inverse_clr(&(y * psi)))
}

/// Column labels for ILR output: `"ILR1"` … `"ILR{D-1}"`.
pub fn ilr_labels(n_parts: usize) -> Vec<String> {
    (1..n_parts).map(|k| format!("ILR{}", k)).collect()
}
