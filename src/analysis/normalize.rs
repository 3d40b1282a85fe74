//! Raw rows → validated [`ExpeditionRecord`]s.

use serde::Serialize;

use crate::data::model::{fields, ExpeditionBatch, ExpeditionRecord, RawRow, RawValue, Season};

/// Records before this year are treated as historical noise.
pub const DEFAULT_MIN_YEAR: i32 = 1950;

const TRUTHY: [&str; 5] = ["TRUE", "1", "1.0", "YES", "T"];

/// Row counts from one normalization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub kept: usize,
    /// Rows whose year could not be parsed.
    pub malformed: usize,
    /// Rows with a valid year before the cut-off.
    pub before_cutoff: usize,
}

/// What became of a single raw row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Kept(ExpeditionRecord),
    Malformed,
    BeforeCutoff(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    pub min_year: i32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
        }
    }
}

impl Normalizer {
    pub fn new(min_year: i32) -> Self {
        Self { min_year }
    }

    /// Normalize a whole batch. Pure: the same rows always give the same batch.
    pub fn normalize(&self, rows: &[RawRow]) -> (ExpeditionBatch, NormalizeReport) {
        let mut report = NormalizeReport {
            rows_read: rows.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            match self.normalize_row(index, row) {
                RowOutcome::Kept(record) => records.push(record),
                RowOutcome::Malformed => {
                    report.malformed += 1;
                    log::debug!("Row {index}: unparseable year {:?}", row.get(fields::YEAR));
                }
                RowOutcome::BeforeCutoff(_) => report.before_cutoff += 1,
            }
        }
        report.kept = records.len();

        if report.malformed > 0 {
            log::warn!("Dropped {} rows without a usable year", report.malformed);
        }
        log::info!(
            "Normalized {} of {} rows ({} before {})",
            report.kept,
            report.rows_read,
            report.before_cutoff,
            self.min_year
        );

        (ExpeditionBatch::from_records(records), report)
    }

    /// Validate one raw row. `index` is its position in the source, used as
    /// the identifier when the row has no `expid`.
    pub fn normalize_row(&self, index: usize, row: &RawRow) -> RowOutcome {
        let Some(year) = cell(row, fields::YEAR).as_f64().and_then(to_year) else {
            return RowOutcome::Malformed;
        };
        if year < self.min_year {
            return RowOutcome::BeforeCutoff(year);
        }

        let record = ExpeditionRecord {
            expedition_id: text(row, fields::EXPEDITION_ID)
                .unwrap_or_else(|| format!("row-{index}")),
            year,
            peak_name: text(row, fields::PEAK_NAME).unwrap_or_else(|| "Unknown".to_string()),
            peak_height_meters: cell(row, fields::PEAK_HEIGHT)
                .as_f64()
                .filter(|h| *h > 0.0),
            season: Season::from_raw(cell(row, fields::SEASON)),
            nation_field: text(row, fields::NATION).unwrap_or_default(),
            countries_field: text(row, fields::COUNTRIES).unwrap_or_default(),
            agency_name: text(row, fields::AGENCY).unwrap_or_default(),
            total_members: count(cell(row, fields::TOTAL_MEMBERS)).unwrap_or(0),
            member_deaths: count(cell(row, fields::MEMBER_DEATHS)).unwrap_or(0),
            summit_members: count(cell(row, fields::SUMMIT_MEMBERS)),
            high_point_meters: cell(row, fields::HIGH_POINT)
                .as_f64()
                .map_or(0.0, |h| h.max(0.0)),
            success: is_truthy(cell(row, fields::SUCCESS)),
        };
        RowOutcome::Kept(record)
    }
}

/// Tolerant success flag: "TRUE", "1", "1.0", "YES" and "T" in any case are
/// true, everything else (including a missing cell) is false.
pub fn is_truthy(value: &RawValue) -> bool {
    let token = match value {
        RawValue::Bool(b) => return *b,
        RawValue::Float(v) if *v == 1.0 => return true,
        other => other.as_text(),
    };
    token.is_some_and(|t| TRUTHY.contains(&t.to_ascii_uppercase().as_str()))
}

fn cell<'a>(row: &'a RawRow, field: &str) -> &'a RawValue {
    row.get(field).unwrap_or(&RawValue::Null)
}

fn text(row: &RawRow, field: &str) -> Option<String> {
    cell(row, field).as_text()
}

fn to_year(value: f64) -> Option<i32> {
    let year = value.trunc();
    (year >= f64::from(i32::MIN) && year <= f64::from(i32::MAX)).then_some(year as i32)
}

/// Non-negative member count; negatives clamp to zero.
fn count(value: &RawValue) -> Option<u32> {
    value
        .as_f64()
        .map(|v| v.trunc().clamp(0.0, f64::from(u32::MAX)) as u32)
}
