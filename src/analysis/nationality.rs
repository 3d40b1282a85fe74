//! Country counts from the multi-valued `nation` / `countries` fields.
//!
//! Each comma-separated token counts once per occurrence, per field. A record
//! naming the same country in both fields therefore counts it twice; that is
//! the established counting rule for this data set and is kept as is.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::{AnalysisError, AnalysisResult};
use crate::data::model::ExpeditionRecord;

/// Historical or alternate spellings and their current names.
pub const DEFAULT_ALIASES: [(&str, &str); 4] = [
    ("W Germany", "Germany"),
    ("UK", "United Kingdom"),
    ("USA", "United States"),
    ("USSR", "Russia"),
];

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryAliases {
    map: BTreeMap<String, String>,
}

impl Default for CountryAliases {
    fn default() -> Self {
        Self {
            map: DEFAULT_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl CountryAliases {
    /// The default aliases plus `extra`; entries in `extra` win.
    pub fn with_extra<'a>(extra: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut aliases = Self::default();
        for (from, to) in extra {
            aliases.map.insert(from.trim().to_string(), to.trim().to_string());
        }
        aliases
    }

    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map_or(name, String::as_str)
    }
}

/// Trimmed, non-empty tokens of a comma-separated field.
pub fn split_countries(field: &str) -> impl Iterator<Item = &str> {
    field.split(',').map(str::trim).filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Counts and ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub climbers: u64,
}

/// Country totals, ranked by count (descending) then name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalityCounts {
    pub ranking: Vec<CountryCount>,
}

impl NationalityCounts {
    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    pub fn count(&self, country: &str) -> Option<u64> {
        self.position(country).map(|i| self.ranking[i].climbers)
    }

    /// 1-based position in the ranking.
    pub fn rank(&self, country: &str) -> Option<usize> {
        self.position(country).map(|i| i + 1)
    }

    /// rank / number of countries × 100; lower is better.
    pub fn percentile(&self, country: &str) -> Option<f64> {
        self.rank(country)
            .map(|rank| rank as f64 / self.ranking.len() as f64 * 100.0)
    }

    fn position(&self, country: &str) -> Option<usize> {
        self.ranking.iter().position(|c| c.country == country)
    }
}

/// Count every country token of both fields across `records`.
pub fn expand_nationalities(
    records: &[ExpeditionRecord],
    aliases: &CountryAliases,
) -> AnalysisResult<NationalityCounts> {
    if records.is_empty() {
        return Err(AnalysisError::insufficient("nationalities", "no records in scope"));
    }

    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        let tokens = split_countries(&record.nation_field)
            .chain(split_countries(&record.countries_field));
        for token in tokens {
            *totals.entry(aliases.canonical(token).to_string()).or_default() += 1;
        }
    }

    // Stable sort over name-ordered entries: ties stay alphabetical.
    let mut ranking: Vec<CountryCount> = totals
        .into_iter()
        .map(|(country, climbers)| CountryCount { country, climbers })
        .collect();
    ranking.sort_by(|a, b| b.climbers.cmp(&a.climbers));

    Ok(NationalityCounts { ranking })
}

// ---------------------------------------------------------------------------
// Spotlight
// ---------------------------------------------------------------------------

/// One country's standing, as shown in the headline panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySpotlight {
    pub country: String,
    pub climbers: u64,
    pub rank: usize,
    pub of: usize,
    /// Floor of the percentile, e.g. rank 3 of 40 → "top 7%".
    pub top_percent: u32,
}

pub fn spotlight(counts: &NationalityCounts, country: &str) -> Option<CountrySpotlight> {
    let climbers = counts.count(country)?;
    let rank = counts.rank(country)?;
    let percentile = counts.percentile(country)?;
    Some(CountrySpotlight {
        country: country.to_string(),
        climbers,
        rank,
        of: counts.len(),
        top_percent: percentile.floor() as u32,
    })
}
