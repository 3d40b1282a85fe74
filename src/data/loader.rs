use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{fields, RawRow, RawValue};
use crate::analysis::cache::SourceKey;

/// Raw rows read from one file, with the fingerprint of the file's bytes.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub key: SourceKey,
    pub rows: Vec<RawRow>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the raw expedition table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one expedition per line
/// * `.json`    – `[{ "expid": "...", "year": 1953, ... }, ...]`
/// * `.parquet` – flat columns of strings, integers, floats or booleans
///
/// Spreadsheets have to be exported to one of these first.
pub fn load_file(path: &Path) -> Result<RawSource> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let key = SourceKey::of_bytes(&bytes);

    let rows = match ext.as_str() {
        "csv" => parse_csv(&bytes)?,
        "json" => parse_json(&bytes)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!("Read {} raw rows from {}", rows.len(), path.display());
    Ok(RawSource { key, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "expid": "EVER53101", "year": 1953, "pkname": "Everest", "success1": true },
///   ...
/// ]
/// ```
pub fn parse_json(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.trim().to_string(), json_to_raw(val)))
                .collect())
        })
        .collect()
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawValue::Float(f)
            } else {
                RawValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => RawValue::Bool(*b),
        JsonValue::Null => RawValue::Null,
        other => RawValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Columns that hold names and identifiers. Their cells stay text even when
/// they look numeric, so an id like `0012` keeps its leading zeros.
const TEXT_COLUMNS: [&str; 5] = [
    fields::EXPEDITION_ID,
    fields::PEAK_NAME,
    fields::NATION,
    fields::COUNTRIES,
    fields::AGENCY,
];

/// Header row with column names; short rows simply lack the trailing columns.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut row = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            let cell = if TEXT_COLUMNS.contains(&col_name.as_str()) {
                text_cell(value)
            } else {
                guess_raw_type(value)
            };
            row.insert(col_name.clone(), cell);
        }
        rows.push(row);
    }

    Ok(rows)
}

fn text_cell(s: &str) -> RawValue {
    let s = s.trim();
    if s.is_empty() {
        RawValue::Null
    } else {
        RawValue::String(s.to_string())
    }
}

fn guess_raw_type(s: &str) -> RawValue {
    let s = s.trim();
    if s.is_empty() {
        return RawValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return RawValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return RawValue::Float(f);
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return RawValue::Bool(s.eq_ignore_ascii_case("true"));
    }
    RawValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Every column becomes a raw cell; nested or temporal types are kept as
/// their display text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut raw = BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_raw_value(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", field.name()))?;
                raw.insert(field.name().clone(), value);
            }
            rows.push(raw);
        }
    }

    Ok(rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &ArrayRef, row: usize) -> Result<RawValue> {
    if col.is_null(row) {
        return Ok(RawValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => RawValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => RawValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => RawValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => RawValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => RawValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => RawValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => RawValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => RawValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => RawValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(RawValue::Float(v as f64), RawValue::Integer)
        }
        DataType::Float32 => RawValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => RawValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => RawValue::Bool(col.as_boolean().value(row)),
        _ => RawValue::String(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(value)
}
