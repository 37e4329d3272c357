//! Compositional Data Analysis (CoDA) transforms for geochemical datasets.
//!
//! This library provides the log-ratio machinery used to analyse closed
//! compositional data such as major-element oxide weight percentages.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **closure**: Closure and (sub-composition) renormalisation
//! - **basis**: Orthonormal bases for the isometric log-ratio transform
//! - **transform**: ALR, CLR, ILR and Box-Cox pairs plus the log-ratio mean
//! - **data**: Labeled tables (CompositionTable, LogRatioTable)
//! - **pipeline**: Pipeline composition and execution
//!
//! Zero and negative parts are not rejected: they flow through the transforms
//! as infinities or NaN, and NaN propagates. Replace zeros before
//! transforming.
//!
//! # Example
//!
//! ```no_run
//! use geochem_coda::prelude::*;
//!
//! let table = CompositionTable::from_tsv("majors.tsv").unwrap();
//!
//! // Renormalise the major elements and move to ILR coordinates
//! let coords = table
//!     .renormalise(&["SiO2", "MgO", "CaO"], 100.0)
//!     .select(&["SiO2", "MgO", "CaO"])
//!     .unwrap()
//!     .ilr()
//!     .unwrap();
//!
//! // ...and back again
//! let closed = coords.invert().unwrap();
//! ```

pub mod basis;
pub mod closure;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod transform;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::basis::{check_orthonormal, orthogonal_basis_default, orthogonal_basis_from_array};
    pub use crate::closure::{close, close_vector, close_with, nansum, renormalise};
    pub use crate::data::{CompositionRow, CompositionTable, LogRatioTable, TransformKind};
    pub use crate::error::{CodaError, Result};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutput, PipelineStep};
    pub use crate::transform::{
        alr, alr_vector, boxcox, boxcox_slice, clr, ilr, inverse_alr, inverse_alr_vector,
        inverse_boxcox, inverse_boxcox_slice, inverse_clr, inverse_ilr, logratiomean,
        logratiomean_with, search_lambda, Alr, AlrReference, BoxCoxConfig, BoxCoxResult, Clr,
        Ilr, LambdaSelection, LogRatioKind, LogRatioTransform,
    };
}
