//! Group-by primitives over a plain record slice, and the views built on them.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::{AnalysisError, AnalysisResult};
use super::utility::{pct, trailing_mean};
use crate::data::model::{ExpeditionRecord, Season};

// ---------------------------------------------------------------------------
// Keys and measures
// ---------------------------------------------------------------------------

/// A categorical or temporal axis records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Year,
    Season,
    Peak,
    Agency,
}

impl Dimension {
    fn key_of(self, record: &ExpeditionRecord) -> GroupKey {
        match self {
            Dimension::Year => GroupKey::Year(record.year),
            Dimension::Season => GroupKey::Season(record.season),
            Dimension::Peak => GroupKey::Name(record.peak_name.clone()),
            Dimension::Agency => GroupKey::Name(record.agency_name.clone()),
        }
    }
}

/// One component of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Year(i32),
    Season(Season),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measure {
    /// Sum of `total_members`.
    Climbers,
    /// Sum of `member_deaths`.
    Deaths,
    /// Number of records.
    Expeditions,
    /// Number of successful records.
    Successes,
}

/// All measures for one group. They are cheap enough to always accumulate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub climbers: u64,
    pub deaths: u64,
    pub expeditions: u64,
    pub successes: u64,
}

impl Totals {
    fn add(&mut self, record: &ExpeditionRecord) {
        self.climbers += u64::from(record.total_members);
        self.deaths += u64::from(record.member_deaths);
        self.expeditions += 1;
        self.successes += u64::from(record.success);
    }

    pub fn get(&self, measure: Measure) -> u64 {
        match measure {
            Measure::Climbers => self.climbers,
            Measure::Deaths => self.deaths,
            Measure::Expeditions => self.expeditions,
            Measure::Successes => self.successes,
        }
    }

    /// 100 × deaths / climbers, 0 when nobody climbed.
    pub fn death_rate_percent(&self) -> f64 {
        pct(self.deaths as f64, self.climbers as f64)
    }

    /// 100 × successes / expeditions, 0 for an empty group.
    pub fn success_rate_percent(&self) -> f64 {
        pct(self.successes as f64, self.expeditions as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// One component per grouping dimension, in query order.
    pub key: Vec<GroupKey>,
    pub totals: Totals,
}

impl AggregateRow {
    /// Selected measures, in the order asked for.
    pub fn measures(&self, selection: &[Measure]) -> Vec<u64> {
        selection.iter().map(|m| self.totals.get(*m)).collect()
    }
}

// ---------------------------------------------------------------------------
// GroupBy query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending by key.
    ByKey,
    /// Descending by a measure; ties ascending by key.
    Descending(Measure),
}

#[derive(Debug, Clone)]
pub struct GroupBy {
    dimensions: Vec<Dimension>,
    order: Order,
}

impl GroupBy {
    pub fn new(dimensions: &[Dimension]) -> Self {
        Self {
            dimensions: dimensions.to_vec(),
            order: Order::ByKey,
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// One row per distinct key combination present in `records`.
    pub fn run(&self, records: &[ExpeditionRecord]) -> AnalysisResult<Vec<AggregateRow>> {
        if records.is_empty() {
            return Err(AnalysisError::insufficient("aggregate", "no records in scope"));
        }

        let mut groups: BTreeMap<Vec<GroupKey>, Totals> = BTreeMap::new();
        for record in records {
            let key = self.dimensions.iter().map(|d| d.key_of(record)).collect();
            groups.entry(key).or_default().add(record);
        }

        // BTreeMap iteration is already ascending by key, and the sort below
        // is stable, so key order breaks measure ties.
        let mut rows: Vec<AggregateRow> = groups
            .into_iter()
            .map(|(key, totals)| AggregateRow { key, totals })
            .collect();
        if let Order::Descending(measure) = self.order {
            rows.sort_by(|a, b| b.totals.get(measure).cmp(&a.totals.get(measure)));
        }
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Risk over time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRisk {
    pub year: i32,
    pub climbers: u64,
    pub deaths: u64,
    pub death_rate_percent: f64,
}

/// Climbers, deaths and death rate per year, ascending by year. Each year is
/// computed on its own; no smoothing.
pub fn yearly_risk(records: &[ExpeditionRecord]) -> AnalysisResult<Vec<YearRisk>> {
    let rows = GroupBy::new(&[Dimension::Year]).run(records)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match row.key.first() {
            Some(GroupKey::Year(year)) => Some(YearRisk {
                year: *year,
                climbers: row.totals.climbers,
                deaths: row.totals.deaths,
                death_rate_percent: row.totals.death_rate_percent(),
            }),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummary {
    pub first_year: i32,
    pub last_year: i32,
    pub total_climbers: u64,
    /// Death rate of the latest year in scope.
    pub current_death_rate: f64,
    /// Mean death rate over the last `window` years in scope.
    pub recent_death_rate: f64,
    pub window: usize,
}

/// Headline figures over a yearly series (as returned by [`yearly_risk`]).
pub fn risk_summary(years: &[YearRisk], window: usize) -> AnalysisResult<RiskSummary> {
    let (Some(first), Some(last)) = (years.first(), years.last()) else {
        return Err(AnalysisError::insufficient("risk summary", "no years in scope"));
    };
    let rates: Vec<f64> = years.iter().map(|y| y.death_rate_percent).collect();

    Ok(RiskSummary {
        first_year: first.year,
        last_year: last.year,
        total_climbers: years.iter().map(|y| y.climbers).sum(),
        current_death_rate: last.death_rate_percent,
        recent_death_rate: trailing_mean(&rates, window),
        window,
    })
}

// ---------------------------------------------------------------------------
// Peak popularity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeakCount {
    pub peak: String,
    pub expeditions: u64,
}

/// Peaks by number of expeditions, most popular first, ties by name.
/// `top` of `None` keeps every peak.
pub fn peak_popularity(
    records: &[ExpeditionRecord],
    top: Option<usize>,
) -> AnalysisResult<Vec<PeakCount>> {
    let rows = GroupBy::new(&[Dimension::Peak])
        .order(Order::Descending(Measure::Expeditions))
        .run(records)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match row.key.into_iter().next() {
            Some(GroupKey::Name(peak)) => Some(PeakCount {
                peak,
                expeditions: row.totals.expeditions,
            }),
            _ => None,
        })
        .take(top.unwrap_or(usize::MAX))
        .collect())
}

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonShare {
    pub season: Season,
    pub climbers: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonDistribution {
    /// Seasons present in scope, in calendar order.
    pub shares: Vec<SeasonShare>,
    pub total_climbers: u64,
    /// Season with the most climbers; `None` when nobody climbed.
    pub predominant: Option<Season>,
}

/// Share of climbers per season.
pub fn season_distribution(records: &[ExpeditionRecord]) -> AnalysisResult<SeasonDistribution> {
    let rows = GroupBy::new(&[Dimension::Season]).run(records)?;
    let total_climbers: u64 = rows.iter().map(|r| r.totals.climbers).sum();

    let shares: Vec<SeasonShare> = rows
        .into_iter()
        .filter_map(|row| match row.key.first() {
            Some(GroupKey::Season(season)) => Some(SeasonShare {
                season: *season,
                climbers: row.totals.climbers,
                percent: pct(row.totals.climbers as f64, total_climbers as f64),
            }),
            _ => None,
        })
        .collect();

    let predominant = shares
        .iter()
        .filter(|s| s.climbers > 0)
        .fold(None::<&SeasonShare>, |best, s| match best {
            Some(b) if b.climbers >= s.climbers => Some(b),
            _ => Some(s),
        })
        .map(|s| s.season);

    Ok(SeasonDistribution {
        shares,
        total_climbers,
        predominant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn climb(year: i32, peak: &str, members: u32, deaths: u32) -> ExpeditionRecord {
        ExpeditionRecord {
            total_members: members,
            member_deaths: deaths,
            ..record(year, peak)
        }
    }

    #[test]
    fn test_empty_batch_is_insufficient() {
        let err = GroupBy::new(&[Dimension::Year]).run(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
        assert!(yearly_risk(&[]).is_err());
        assert!(season_distribution(&[]).is_err());
    }

    #[test]
    fn test_multi_dimension_grouping() {
        let mut spring = climb(1996, "Everest", 4, 0);
        spring.success = true;
        let mut autumn = climb(1996, "Everest", 6, 1);
        autumn.season = Season::Autumn;
        let records = vec![spring.clone(), autumn, spring];

        let rows = GroupBy::new(&[Dimension::Peak, Dimension::Season])
            .run(&records)
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].key,
            vec![GroupKey::Name("Everest".into()), GroupKey::Season(Season::Spring)]
        );
        assert_eq!(
            rows[0].measures(&[Measure::Climbers, Measure::Expeditions, Measure::Successes]),
            vec![8, 2, 2]
        );
        assert_eq!(rows[1].totals.deaths, 1);
    }

    #[test]
    fn test_descending_order_breaks_ties_by_key() {
        let records = vec![
            climb(2000, "Lhotse", 1, 0),
            climb(2000, "Cho Oyu", 1, 0),
            climb(2001, "Everest", 1, 0),
            climb(2002, "Everest", 1, 0),
        ];
        let peaks = peak_popularity(&records, None).unwrap();
        let names: Vec<&str> = peaks.iter().map(|p| p.peak.as_str()).collect();

        assert_eq!(names, vec!["Everest", "Cho Oyu", "Lhotse"]);
        assert_eq!(peaks[0].expeditions, 2);
        assert_eq!(peak_popularity(&records, Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_success_rate_of_totals() {
        assert_eq!(Totals::default().success_rate_percent(), 0.0);

        let totals = Totals {
            expeditions: 4,
            successes: 3,
            ..Totals::default()
        };
        assert_eq!(totals.success_rate_percent(), 75.0);
    }

    #[test]
    fn test_zero_climbers_year_has_zero_rate() {
        let records = vec![
            climb(1990, "Everest", 0, 0),
            climb(1991, "Everest", 20, 1),
        ];
        let years = yearly_risk(&records).unwrap();

        assert_eq!(years[0].year, 1990);
        assert_eq!(years[0].death_rate_percent, 0.0);
        assert!(!years[0].death_rate_percent.is_nan());
        assert_eq!(years[1].death_rate_percent, 5.0);
    }

    #[test]
    fn test_risk_summary_uses_trailing_window() {
        let records: Vec<_> = (0..6)
            .map(|i| climb(2000 + i, "Everest", 100, i as u32))
            .collect();
        let years = yearly_risk(&records).unwrap();
        let summary = risk_summary(&years, 5).unwrap();

        assert_eq!(summary.first_year, 2000);
        assert_eq!(summary.last_year, 2005);
        assert_eq!(summary.total_climbers, 600);
        assert_eq!(summary.current_death_rate, 5.0);
        assert_eq!(summary.recent_death_rate, 3.0);
        assert!(risk_summary(&[], 5).is_err());
    }

    #[test]
    fn test_season_distribution_percentages() {
        let mut winter = climb(2010, "Everest", 10, 0);
        winter.season = Season::Winter;
        let records = vec![climb(2010, "Everest", 30, 0), winter];

        let dist = season_distribution(&records).unwrap();

        assert_eq!(dist.total_climbers, 40);
        assert_eq!(dist.shares.len(), 2);
        assert_eq!(dist.shares[0].season, Season::Spring);
        assert_eq!(dist.shares[0].percent, 75.0);
        assert_eq!(dist.shares[1].percent, 25.0);
        assert_eq!(dist.predominant, Some(Season::Spring));
    }

    #[test]
    fn test_season_distribution_without_climbers() {
        let records = vec![climb(2010, "Everest", 0, 0)];
        let dist = season_distribution(&records).unwrap();

        assert_eq!(dist.shares[0].percent, 0.0);
        assert_eq!(dist.predominant, None);
    }
}
