use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names of the raw expedition table
// ---------------------------------------------------------------------------

pub mod fields {
    pub const EXPEDITION_ID: &str = "expid";
    pub const YEAR: &str = "year";
    pub const PEAK_NAME: &str = "pkname";
    pub const PEAK_HEIGHT: &str = "heightm";
    pub const SEASON: &str = "season";
    pub const NATION: &str = "nation";
    pub const COUNTRIES: &str = "countries";
    pub const AGENCY: &str = "agency";
    pub const TOTAL_MEMBERS: &str = "totmembers";
    pub const MEMBER_DEATHS: &str = "mdeaths";
    pub const SUMMIT_MEMBERS: &str = "smtmembers";
    pub const HIGH_POINT: &str = "highpoint";
    pub const SUCCESS: &str = "success1";
}

// ---------------------------------------------------------------------------
// RawValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common spreadsheet dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::String(s) => write!(f, "{s}"),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Float(v) => write!(f, "{v:?}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Null => write!(f, "<null>"),
        }
    }
}

impl RawValue {
    /// Lenient numeric coercion: numbers pass through, numeric strings are
    /// parsed, booleans count as 1/0. NaN and infinities are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            RawValue::Float(v) => *v,
            RawValue::Integer(i) => *i as f64,
            RawValue::Bool(b) => f64::from(u8::from(*b)),
            RawValue::String(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Text form of the cell, `None` for nulls and blank strings.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::String(s) if s.trim().is_empty() => None,
            RawValue::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }
}

/// One row of the source table: column name → cell.
pub type RawRow = BTreeMap<String, RawValue>;

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    Unknown,
}

impl Season {
    pub const ALL: [Season; 5] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
        Season::Unknown,
    ];

    /// Names are matched case-insensitively; the numeric codes 1–4 used by
    /// the Himalayan Database map to Spring, Summer, Autumn and Winter.
    pub fn from_raw(value: &RawValue) -> Season {
        if let RawValue::Integer(code) = value {
            return Self::from_code(*code);
        }
        if let RawValue::Float(code) = value {
            if code.fract() == 0.0 {
                return Self::from_code(*code as i64);
            }
        }
        let Some(text) = value.as_text() else {
            return Season::Unknown;
        };
        match text.to_ascii_lowercase().as_str() {
            "spring" => Season::Spring,
            "summer" => Season::Summer,
            "autumn" | "fall" => Season::Autumn,
            "winter" => Season::Winter,
            other => match other.parse::<i64>() {
                Ok(code) => Self::from_code(code),
                Err(_) => Season::Unknown,
            },
        }
    }

    fn from_code(code: i64) -> Season {
        match code {
            1 => Season::Spring,
            2 => Season::Summer,
            3 => Season::Autumn,
            4 => Season::Winter,
            _ => Season::Unknown,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ExpeditionRecord – one validated row
// ---------------------------------------------------------------------------

/// A single expedition after normalization. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpeditionRecord {
    pub expedition_id: String,
    /// Always at or above the normalizer's cut-off year.
    pub year: i32,
    /// Never empty; "Unknown" when the source had no peak name.
    pub peak_name: String,
    pub peak_height_meters: Option<f64>,
    pub season: Season,
    /// Comma-separated country list, kept verbatim.
    pub nation_field: String,
    /// Comma-separated country list, kept verbatim.
    pub countries_field: String,
    pub agency_name: String,
    pub total_members: u32,
    pub member_deaths: u32,
    /// `None` when the source did not report a summit count for this row.
    pub summit_members: Option<u32>,
    pub high_point_meters: f64,
    pub success: bool,
}

// ---------------------------------------------------------------------------
// ExpeditionBatch – the clean record set
// ---------------------------------------------------------------------------

/// The normalized records with pre-computed indices used by the views.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpeditionBatch {
    pub records: Vec<ExpeditionRecord>,
    /// Sorted set of distinct peak names.
    pub peak_names: BTreeSet<String>,
    /// Earliest and latest year present.
    pub year_span: Option<(i32, i32)>,
}

impl ExpeditionBatch {
    /// Build indices from normalized records.
    pub fn from_records(records: Vec<ExpeditionRecord>) -> Self {
        let peak_names = records.iter().map(|r| r.peak_name.clone()).collect();
        let year_span = records.iter().fold(None, |span, r| match span {
            None => Some((r.year, r.year)),
            Some((lo, hi)) => Some((r.year.min(lo), r.year.max(hi))),
        });
        ExpeditionBatch {
            records,
            peak_names,
            year_span,
        }
    }

    /// A new batch holding the records at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let records = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        Self::from_records(records)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
