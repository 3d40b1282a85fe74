use super::model::{ExpeditionBatch, ExpeditionRecord};

// ---------------------------------------------------------------------------
// Scope predicate: which records the views look at
// ---------------------------------------------------------------------------

/// Year range (inclusive) and optional single peak. `None` means "no
/// constraint" for that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub years: Option<(i32, i32)>,
    pub peak: Option<String>,
}

impl Scope {
    /// A scope that keeps everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_years(mut self, from: i32, to: i32) -> Self {
        self.years = Some((from.min(to), from.max(to)));
        self
    }

    pub fn with_peak(mut self, peak: impl Into<String>) -> Self {
        self.peak = Some(peak.into());
        self
    }

    /// The same year range over every peak.
    pub fn all_peaks(&self) -> Self {
        Scope {
            years: self.years,
            peak: None,
        }
    }

    pub fn matches(&self, record: &ExpeditionRecord) -> bool {
        if let Some((from, to)) = self.years {
            if record.year < from || record.year > to {
                return false;
            }
        }
        match &self.peak {
            Some(peak) => &record.peak_name == peak,
            None => true,
        }
    }
}

/// Initial scope for a freshly loaded batch: from `start_year` (clamped into
/// the batch's span) to the latest year, every peak.
pub fn init_scope(batch: &ExpeditionBatch, start_year: i32) -> Scope {
    match batch.year_span {
        Some((min, max)) => Scope::all().with_years(start_year.clamp(min, max), max),
        None => Scope::all(),
    }
}

/// Return indices of records inside `scope`.
pub fn filtered_indices(batch: &ExpeditionBatch, scope: &Scope) -> Vec<usize> {
    batch
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| scope.matches(record))
        .map(|(i, _)| i)
        .collect()
}
