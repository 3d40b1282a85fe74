use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, Int32Array, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

// ---------------------------------------------------------------------------
// Column builders
// ---------------------------------------------------------------------------

pub fn text_column<'a>(values: impl IntoIterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

pub fn year_column(values: impl IntoIterator<Item = i32>) -> ArrayRef {
    Arc::new(Int32Array::from_iter_values(values))
}

pub fn count_column(values: impl IntoIterator<Item = u64>) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(values))
}

/// Fixed-precision numbers, so tables do not show float noise.
pub fn decimal_column(values: impl IntoIterator<Item = f64>, precision: usize) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(
        values.into_iter().map(|v| format!("{v:.precision$}")),
    ))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render named columns as a boxed ASCII table.
pub fn table(columns: Vec<(&str, ArrayRef)>) -> Result<String> {
    let batch = RecordBatch::try_from_iter(columns)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}
