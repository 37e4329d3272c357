//! Log-ratio and power transforms for compositional data.
//!
//! This module provides forward/inverse pairs:
//!
//! - **ALR**: Additive log-ratio against a denominator part
//! - **CLR**: Centred log-ratio against the geometric mean
//! - **ILR**: Isometric log-ratio on an orthonormal basis
//! - **Box-Cox**: Power transform with grid-search lambda
//!
//! and a log-ratio-aware mean built on any matched pair.

pub mod alr;
pub mod boxcox;
pub mod clr;
pub mod ilr;
pub mod mean;

pub use alr::{alr, alr_vector, inverse_alr, inverse_alr_vector, AlrReference};
pub use boxcox::{
    boxcox, boxcox_llf, boxcox_slice, inverse_boxcox, inverse_boxcox_slice, search_lambda,
    BoxCoxConfig, BoxCoxResult, LambdaSelection,
};
pub use clr::{clr, inverse_clr};
pub use ilr::{ilr, inverse_ilr};
pub use mean::{logratiomean, logratiomean_with, Alr, Clr, Ilr, LogRatioKind, LogRatioTransform};
