//! Agency leaderboard.
//!
//! Elite score = success rate × log10(expeditions + 1), which damps the
//! success rate of agencies with few expeditions. Agencies below the minimum
//! sample size are left out of the ranking entirely rather than scored.

use serde::Serialize;

use super::aggregate::{Dimension, GroupBy, GroupKey, Totals};
use super::error::AnalysisResult;
use crate::data::model::ExpeditionRecord;

pub const DEFAULT_MIN_EXPEDITIONS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencyScore {
    pub agency: String,
    pub expedition_count: u64,
    pub success_count: u64,
    pub success_rate: f64,
    pub elite_score: f64,
}

impl AgencyScore {
    fn new(agency: String, totals: &Totals) -> Self {
        let success_rate = totals.success_rate_percent();
        AgencyScore {
            agency,
            expedition_count: totals.expeditions,
            success_count: totals.successes,
            success_rate,
            elite_score: success_rate * (totals.expeditions as f64 + 1.0).log10(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencyRanking {
    /// The sample-size gate that was applied.
    pub min_expeditions: u64,
    /// Best first.
    pub agencies: Vec<AgencyScore>,
}

impl AgencyRanking {
    /// The first `n` agencies (fewer when fewer qualified).
    pub fn top(&self, n: usize) -> &[AgencyScore] {
        &self.agencies[..n.min(self.agencies.len())]
    }
}

/// Rank agencies in `records`. Records without an agency are skipped.
///
/// Order: elite score descending, then expedition count descending, then
/// name ascending.
pub fn rank_agencies(
    records: &[ExpeditionRecord],
    min_expeditions: u64,
) -> AnalysisResult<AgencyRanking> {
    let rows = GroupBy::new(&[Dimension::Agency]).run(records)?;

    let mut agencies: Vec<AgencyScore> = rows
        .into_iter()
        .filter(|row| row.totals.expeditions >= min_expeditions)
        .filter_map(|row| match row.key.into_iter().next() {
            Some(GroupKey::Name(agency)) if !agency.is_empty() => {
                Some(AgencyScore::new(agency, &row.totals))
            }
            _ => None,
        })
        .collect();

    agencies.sort_by(|a, b| {
        b.elite_score
            .total_cmp(&a.elite_score)
            .then_with(|| b.expedition_count.cmp(&a.expedition_count))
            .then_with(|| a.agency.cmp(&b.agency))
    });

    if agencies.is_empty() {
        log::warn!("No agency has at least {min_expeditions} expeditions in scope");
    }

    Ok(AgencyRanking {
        min_expeditions,
        agencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn runs(agency: &str, total: usize, successes: usize) -> Vec<ExpeditionRecord> {
        (0..total)
            .map(|i| ExpeditionRecord {
                agency_name: agency.to_string(),
                success: i < successes,
                ..record(2000, "Everest")
            })
            .collect()
    }

    #[test]
    fn test_elite_score_scenario() {
        let ranking = rank_agencies(&runs("A", 4, 3), 3).unwrap();
        let a = &ranking.agencies[0];

        assert_eq!(a.expedition_count, 4);
        assert_eq!(a.success_count, 3);
        assert_eq!(a.success_rate, 75.0);
        assert!((a.elite_score - 75.0 * 5f64.log10()).abs() < 1e-9);
        assert!((a.elite_score - 52.4).abs() < 0.05);
    }

    #[test]
    fn test_agency_without_successes_scores_zero() {
        let ranking = rank_agencies(&runs("Base Camp Tours", 3, 0), 3).unwrap();
        let agency = &ranking.agencies[0];

        assert_eq!(agency.success_rate, 0.0);
        assert_eq!(agency.elite_score, 0.0);
    }

    #[test]
    fn test_small_agencies_are_excluded() {
        let mut records = runs("Perfect Pair", 2, 2);
        records.extend(runs("Steady", 10, 5));
        let ranking = rank_agencies(&records, 3).unwrap();

        assert_eq!(ranking.min_expeditions, 3);
        assert_eq!(ranking.agencies.len(), 1);
        assert_eq!(ranking.agencies[0].agency, "Steady");
    }

    #[test]
    fn test_volume_beats_lucky_streak() {
        let mut records = runs("Lucky", 3, 3);
        records.extend(runs("Veteran", 40, 36));
        let ranking = rank_agencies(&records, 3).unwrap();

        // 100 × log10(4) ≈ 60.2 vs 90 × log10(41) ≈ 145.2
        assert_eq!(ranking.agencies[0].agency, "Veteran");
    }

    #[test]
    fn test_ties_break_by_count_then_name() {
        let mut records = runs("Zeta", 3, 0);
        records.extend(runs("Alpha", 3, 0));
        records.extend(runs("Mid", 5, 0));
        let ranking = rank_agencies(&records, 3).unwrap();
        let names: Vec<&str> = ranking.agencies.iter().map(|a| a.agency.as_str()).collect();

        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_blank_agency_is_not_ranked() {
        let ranking = rank_agencies(&runs("", 5, 5), 3).unwrap();
        assert!(ranking.agencies.is_empty());
        assert!(ranking.top(3).is_empty());
    }

    #[test]
    fn test_top_slices() {
        let mut records = runs("A", 3, 3);
        records.extend(runs("B", 3, 2));
        let ranking = rank_agencies(&records, 3).unwrap();

        assert_eq!(ranking.top(1).len(), 1);
        assert_eq!(ranking.top(10).len(), 2);
    }

    #[test]
    fn test_empty_scope_is_insufficient() {
        assert!(rank_agencies(&[], 3).is_err());
    }
}
