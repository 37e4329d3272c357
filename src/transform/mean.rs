//! Mean composition computed in log-ratio space.

use crate::data::{CompositionRow, CompositionTable};
use crate::error::{CodaError, Result};
use crate::transform::alr::{alr, inverse_alr};
use crate::transform::clr::{clr, inverse_clr};
use crate::transform::ilr::{ilr, inverse_ilr};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A matched forward/inverse log-ratio transform pair.
pub trait LogRatioTransform {
    /// Map an (N, D) composition to log-ratio coordinates.
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Map log-ratio coordinates back to a closed (N, D) composition.
    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Additive log-ratio with a fixed denominator index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alr {
    pub ind: isize,
    pub null_col: bool,
}

impl Default for Alr {
    fn default() -> Self {
        Self {
            ind: -1,
            null_col: false,
        }
    }
}

impl LogRatioTransform for Alr {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        alr(x, self.ind, self.null_col)
    }

    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        inverse_alr(y, self.ind, self.null_col)
    }

    fn name(&self) -> &'static str {
        "ALR"
    }
}

/// Centred log-ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Clr;

impl LogRatioTransform for Clr {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        clr(x)
    }

    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        Ok(inverse_clr(y))
    }

    fn name(&self) -> &'static str {
        "CLR"
    }
}

/// Isometric log-ratio with the default basis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ilr;

impl LogRatioTransform for Ilr {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        ilr(x)
    }

    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        inverse_ilr(y, None)
    }

    fn name(&self) -> &'static str {
        "ILR"
    }
}

/// Serialisable choice of log-ratio transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LogRatioKind {
    Alr {
        ind: isize,
        null_col: bool,
    },
    #[default]
    Clr,
    Ilr,
}

impl LogRatioTransform for LogRatioKind {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        match *self {
            LogRatioKind::Alr { ind, null_col } => Alr { ind, null_col }.forward(x),
            LogRatioKind::Clr => Clr.forward(x),
            LogRatioKind::Ilr => Ilr.forward(x),
        }
    }

    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        match *self {
            LogRatioKind::Alr { ind, null_col } => Alr { ind, null_col }.inverse(y),
            LogRatioKind::Clr => Clr.inverse(y),
            LogRatioKind::Ilr => Ilr.inverse(y),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            LogRatioKind::Alr { .. } => "ALR",
            LogRatioKind::Clr => "CLR",
            LogRatioKind::Ilr => "ILR",
        }
    }
}

/// Mean of a table's rows taken in log-ratio space.
///
/// Transforms every row, takes the column-wise arithmetic mean of the
/// coordinates, and maps that single mean back with the inverse transform.
/// The result is labeled with the table's columns.
pub fn logratiomean<T: LogRatioTransform + ?Sized>(
    table: &CompositionTable,
    transform: &T,
) -> Result<CompositionRow> {
    debug!(transform = transform.name(), rows = table.n_rows(), "log-ratio mean");
    logratiomean_with(table, |x| transform.forward(x), |y| transform.inverse(y))
}

/// [`logratiomean`] for an arbitrary pair of forward and inverse functions.
pub fn logratiomean_with<F, G>(table: &CompositionTable, forward: F, inverse: G) -> Result<CompositionRow>
where
    F: Fn(&DMatrix<f64>) -> Result<DMatrix<f64>>,
    G: Fn(&DMatrix<f64>) -> Result<DMatrix<f64>>,
{
    if table.n_rows() == 0 {
        return Err(CodaError::EmptyData(
            "Cannot take the mean of a table with no rows".to_string(),
        ));
    }

    let coordinates = forward(table.data())?;
    let n = coordinates.nrows() as f64;
    let mean = DMatrix::from_fn(1, coordinates.ncols(), |_, j| coordinates.column(j).sum() / n);

    let values = inverse(&mean)?;
    if values.ncols() != table.n_cols() {
        return Err(CodaError::DimensionMismatch {
            expected: table.n_cols(),
            actual: values.ncols(),
        });
    }

    Ok(CompositionRow {
        columns: table.columns().to_vec(),
        values: values.row(0).iter().copied().collect(),
    })
}
