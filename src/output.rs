//! Writing results out: the report as JSON, the normalized records as CSV.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::data::model::ExpeditionRecord;
use crate::report::Report;

/// Writes the report as pretty-printed JSON.
pub fn write_json(writer: impl Write, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Writes normalized records to a CSV file with a header row, replacing any
/// existing file.
pub fn export_records(path: &Path, records: &[ExpeditionRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
