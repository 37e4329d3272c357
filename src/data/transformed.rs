//! Transformed tables that remember how to map back to compositional space.

use crate::data::composition::{write_tsv, CompositionTable};
use crate::error::{CodaError, Result};
use crate::transform::alr::inverse_alr;
use crate::transform::boxcox::inverse_boxcox;
use crate::transform::clr::inverse_clr;
use crate::transform::ilr::inverse_ilr;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The transform that produced a [`LogRatioTable`], with the parameters
/// needed to invert it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformKind {
    /// Additive log-ratio against the part at `index` (already resolved).
    Alr { index: usize, null_col: bool },
    /// Centred log-ratio.
    Clr,
    /// Isometric log-ratio using the default basis.
    Ilr,
    /// Box-Cox power transform.
    BoxCox { lambda: f64 },
}

impl TransformKind {
    /// Width of the transformed table for a `d`-part composition.
    pub fn output_width(&self, d: usize) -> usize {
        match self {
            TransformKind::Alr { null_col: false, .. } | TransformKind::Ilr => d.saturating_sub(1),
            _ => d,
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformKind::Alr { index, null_col } => {
                write!(f, "ALR(ind={}, null_col={})", index, null_col)
            }
            TransformKind::Clr => write!(f, "CLR"),
            TransformKind::Ilr => write!(f, "ILR"),
            TransformKind::BoxCox { lambda } => write!(f, "BoxCox(lambda={})", lambda),
        }
    }
}

/// A transformed matrix with metadata about the transformation.
///
/// Holds log-ratio coordinates and also Box-Cox output, which keeps the
/// source column names; `transform` says which.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRatioTable {
    /// The transformed data (samples × coordinates).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    /// Coordinate labels.
    pub columns: Vec<String>,
    /// Sample identifiers.
    pub index: Vec<String>,
    /// Header of the index column.
    pub index_name: String,
    /// Column names of the composition this table inverts to.
    pub inverts_to: Vec<String>,
    /// Transform applied, with its inversion parameters.
    pub transform: TransformKind,
}

impl LogRatioTable {
    pub(crate) fn new(
        data: DMatrix<f64>,
        columns: Vec<String>,
        source: &CompositionTable,
        transform: TransformKind,
    ) -> Result<Self> {
        Self::from_parts(
            data,
            columns,
            source.index().to_vec(),
            source.columns().to_vec(),
            transform,
        )
        .map(|table| table.with_index_name(source.index_name()))
    }

    /// Wrap already-transformed values, e.g. coordinates read back from disk.
    ///
    /// The width must match what `transform` produces for `inverts_to`.
    pub fn from_parts(
        data: DMatrix<f64>,
        columns: Vec<String>,
        index: Vec<String>,
        inverts_to: Vec<String>,
        transform: TransformKind,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if ncols != columns.len() {
            return Err(CodaError::DimensionMismatch {
                expected: ncols,
                actual: columns.len(),
            });
        }
        if nrows != index.len() {
            return Err(CodaError::DimensionMismatch {
                expected: nrows,
                actual: index.len(),
            });
        }
        let expected = transform.output_width(inverts_to.len());
        if ncols != expected {
            return Err(CodaError::DimensionMismatch {
                expected,
                actual: ncols,
            });
        }
        Ok(Self {
            data,
            columns,
            index,
            index_name: crate::data::composition::DEFAULT_INDEX_NAME.to_string(),
            inverts_to,
            transform,
        })
    }

    fn with_index_name(mut self, name: &str) -> Self {
        self.index_name = name.to_string();
        self
    }

    /// Get the transformed value for a sample and coordinate.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of samples.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of coordinates.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Get a row (sample) as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().cloned().collect()
    }

    /// Map back to a composition table labeled with `inverts_to`.
    ///
    /// Log-ratio inverses return closed compositions (rows sum to one);
    /// Box-Cox returns the original scale.
    pub fn invert(&self) -> Result<CompositionTable> {
        let data = match self.transform {
            TransformKind::Alr { index, null_col } => {
                inverse_alr(&self.data, index as isize, null_col)?
            }
            TransformKind::Clr => inverse_clr(&self.data),
            TransformKind::Ilr => inverse_ilr(&self.data, None)?,
            TransformKind::BoxCox { lambda } => inverse_boxcox(&self.data, lambda),
        };
        Ok(
            CompositionTable::new(data, self.inverts_to.clone(), self.index.clone())?
                .with_index_name(&self.index_name),
        )
    }

    /// Write the transformed values to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_tsv(path, &self.index_name, &self.columns, &self.index, &self.data)
    }
}
