//! Labeled composition table: samples as rows, parts (oxides, elements) as columns.

use crate::closure::{close, renormalise};
use crate::data::transformed::{LogRatioTable, TransformKind};
use crate::error::{CodaError, Result};
use crate::transform::alr::{alr, alr_labels, AlrReference};
use crate::transform::boxcox::{boxcox, BoxCoxConfig};
use crate::transform::clr::{clr, clr_labels};
use crate::transform::ilr::{ilr, ilr_labels};
use crate::transform::mean::{logratiomean, LogRatioTransform};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default header for the index column of a table.
pub const DEFAULT_INDEX_NAME: &str = "sample_id";

/// A dense table of compositional data with named columns and a row index.
///
/// Values are stored as an (N, D) matrix: one row per sample, one column per
/// part. Values may be zero or NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTable {
    data: DMatrix<f64>,
    columns: Vec<String>,
    index: Vec<String>,
    index_name: String,
}

impl CompositionTable {
    /// Create a new table, checking that the labels match the data shape.
    pub fn new(data: DMatrix<f64>, columns: Vec<String>, index: Vec<String>) -> Result<Self> {
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
        Ok(Self {
            data,
            columns,
            index,
            index_name: DEFAULT_INDEX_NAME.to_string(),
        })
    }

    /// Create a table whose row index is `0..N`.
    pub fn with_default_index(data: DMatrix<f64>, columns: Vec<String>) -> Result<Self> {
        let index = (0..data.nrows()).map(|i| i.to_string()).collect();
        Self::new(data, columns, index)
    }

    /// Build a table from row-major values.
    pub fn from_row_slice(columns: &[&str], n_rows: usize, values: &[f64]) -> Result<Self> {
        if values.len() != n_rows * columns.len() {
            return Err(CodaError::DimensionMismatch {
                expected: n_rows * columns.len(),
                actual: values.len(),
            });
        }
        let data = DMatrix::from_row_slice(n_rows, columns.len(), values);
        Self::with_default_index(data, columns.iter().map(|c| c.to_string()).collect())
    }

    /// Rename the index column used in TSV output.
    pub fn with_index_name(mut self, name: &str) -> Self {
        self.index_name = name.to_string();
        self
    }

    /// Load a table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header; the first cell names the index, the rest name parts
    /// - Subsequent rows: sample ID followed by one value per part
    ///
    /// Empty cells and `NaN`/`nan` parse as NaN.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        if header.len() < 2 {
            return Err(CodaError::EmptyData(
                "TSV must have at least one value column".to_string(),
            ));
        }
        let index_name = header[0].to_string();
        let columns: Vec<String> = header.iter().skip(1).map(|s| s.to_string()).collect();

        let mut index = Vec::new();
        let mut values = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            index.push(record[0].to_string());
            for (col_idx, cell) in record.iter().skip(1).enumerate() {
                values.push(parse_value(cell, row_idx, col_idx)?);
            }
        }

        if index.is_empty() {
            return Err(CodaError::EmptyData("No rows in TSV".to_string()));
        }

        let data = DMatrix::from_row_slice(index.len(), columns.len(), &values);
        Ok(Self::new(data, columns, index)?.with_index_name(&index_name))
    }

    /// Write the table to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_tsv(path, &self.index_name, &self.columns, &self.index, &self.data)
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of parts (columns).
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Column names.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row identifiers.
    #[inline]
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Header of the index column.
    #[inline]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Get reference to the underlying matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of a named column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        self.column_index(name)
            .map(|j| self.data.column(j).iter().copied().collect())
    }

    /// Values of a row.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    /// Keep only the named columns, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let positions = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    CodaError::InvalidParameter(format!("Column '{}' not found", name))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let data = DMatrix::from_fn(self.n_rows(), positions.len(), |i, j| {
            self.data[(i, positions[j])]
        });
        Ok(Self {
            data,
            columns: names.iter().map(|n| n.to_string()).collect(),
            index: self.index.clone(),
            index_name: self.index_name.clone(),
        })
    }

    /// Replace the values while keeping labels. The shape must not change.
    pub(crate) fn with_data(&self, data: DMatrix<f64>) -> Self {
        debug_assert_eq!(data.shape(), self.data.shape());
        Self {
            data,
            columns: self.columns.clone(),
            index: self.index.clone(),
            index_name: self.index_name.clone(),
        }
    }

    /// Close every row so that it sums to one.
    pub fn close(&self) -> Self {
        self.with_data(close(&self.data))
    }

    /// Renormalise to `scale`, optionally restricted to a sub-composition.
    ///
    /// See [`crate::closure::renormalise`].
    pub fn renormalise<S: AsRef<str>>(&self, components: &[S], scale: f64) -> Self {
        renormalise(self, components, scale)
    }

    /// Additive log-ratio transform with the denominator chosen by index or name.
    pub fn alr(&self, reference: &AlrReference, null_col: bool) -> Result<LogRatioTable> {
        let ind = reference.resolve(&self.columns)?;
        let data = alr(&self.data, ind as isize, null_col)?;
        LogRatioTable::new(
            data,
            alr_labels(&self.columns, ind, null_col),
            self,
            TransformKind::Alr {
                index: ind,
                null_col,
            },
        )
    }

    /// Centred log-ratio transform.
    pub fn clr(&self) -> Result<LogRatioTable> {
        let data = clr(&self.data)?;
        LogRatioTable::new(data, clr_labels(&self.columns), self, TransformKind::Clr)
    }

    /// Isometric log-ratio transform.
    pub fn ilr(&self) -> Result<LogRatioTable> {
        let data = ilr(&self.data)?;
        LogRatioTable::new(data, ilr_labels(self.n_cols()), self, TransformKind::Ilr)
    }

    /// Box-Cox transform; the resolved lambda is kept for inversion.
    pub fn boxcox(&self, config: &BoxCoxConfig) -> Result<LogRatioTable> {
        let result = boxcox(&self.data, config)?;
        LogRatioTable::new(
            result.data,
            self.columns.clone(),
            self,
            TransformKind::BoxCox {
                lambda: result.lambda,
            },
        )
    }

    /// Mean composition computed in log-ratio space.
    pub fn logratiomean<T: LogRatioTransform + ?Sized>(&self, transform: &T) -> Result<CompositionRow> {
        logratiomean(self, transform)
    }
}

/// A single labeled composition, e.g. the result of a log-ratio mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRow {
    /// Part names.
    pub columns: Vec<String>,
    /// One value per part.
    pub values: Vec<f64>,
}

impl CompositionRow {
    /// Value of a named part.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|j| self.values[j])
    }

    /// Iterate over (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .zip(self.values.iter().copied())
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no parts.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_value(cell: &str, row: usize, col: usize) -> Result<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| CodaError::Parse {
        value: cell.to_string(),
        row,
        col,
    })
}

pub(crate) fn write_tsv<P: AsRef<Path>>(
    path: P,
    index_name: &str,
    columns: &[String],
    index: &[String],
    data: &DMatrix<f64>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push(index_name.to_string());
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for (i, id) in index.iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(id.clone());
        record.extend(data.row(i).iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
