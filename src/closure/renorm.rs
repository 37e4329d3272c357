//! Renormalisation of labeled tables, optionally to a sub-composition.

use crate::closure::close::nansum;
use crate::data::CompositionTable;
use tracing::debug;

/// Divisor substituted for an all-zero row when renormalising every column.
const ZERO_TOTAL_FILL: f64 = 100.0;

/// Renormalise compositional data to ensure closure.
///
/// Works on a copy; the input table is never modified. Row totals skip NaN.
///
/// # Arguments
/// * `table` - Table to renormalise
/// * `components` - Optional sub-composition to renormalise. Only names present
///   in the table are used; the other columns are left untouched. Useful when
///   compositional and non-compositional data share a table.
/// * `scale` - Closure total, typically 100 or 1
///
/// # Degenerate rows
/// A row whose sub-composition total is exactly zero becomes NaN in those
/// columns. When no sub-composition is given, an all-zero row is divided by
/// 100 and so stays zero.
pub fn renormalise<S: AsRef<str>>(
    table: &CompositionTable,
    components: &[S],
    scale: f64,
) -> CompositionTable {
    let mut data = table.data().clone();

    if !components.is_empty() {
        let mut selected: Vec<usize> = Vec::with_capacity(components.len());
        for name in components {
            if let Some(j) = table.column_index(name.as_ref()) {
                if !selected.contains(&j) {
                    selected.push(j);
                }
            }
        }
        debug!(
            requested = components.len(),
            matched = selected.len(),
            scale,
            "renormalising sub-composition"
        );

        for i in 0..data.nrows() {
            let block: Vec<f64> = selected.iter().map(|&j| data[(i, j)]).collect();
            let total = nansum(&block);
            let total = if total == 0.0 { f64::NAN } else { total };
            for &j in &selected {
                data[(i, j)] = scale * data[(i, j)] / total;
            }
        }
    } else {
        debug!(columns = data.ncols(), scale, "renormalising all columns");
        for i in 0..data.nrows() {
            let row: Vec<f64> = data.row(i).iter().copied().collect();
            let total = nansum(&row);
            let total = if total == 0.0 { ZERO_TOTAL_FILL } else { total };
            for j in 0..data.ncols() {
                data[(i, j)] = data[(i, j)] / total * scale;
            }
        }
    }

    table.with_data(data)
}
