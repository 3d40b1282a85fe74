//! Everything the presentation layer needs, computed in one pass over the
//! current [`AppState`].

use serde::Serialize;

use crate::analysis::agency::{rank_agencies, AgencyScore};
use crate::analysis::aggregate::{
    peak_popularity, risk_summary, season_distribution, yearly_risk, PeakCount, RiskSummary,
    SeasonDistribution, YearRisk,
};
use crate::analysis::funnel::{ascent_funnel, AscentFunnel};
use crate::analysis::nationality::{expand_nationalities, spotlight, CountryCount, CountrySpotlight};
use crate::analysis::normalize::NormalizeReport;
use crate::analysis::{AnalysisError, AnalysisResult};
use crate::state::AppState;

/// A view's outcome. `Empty` is an explicit "no result", never a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum View<T> {
    Ready { data: T },
    Empty { reason: String },
}

impl<T> View<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            View::Ready { data } => Some(data),
            View::Empty { .. } => None,
        }
    }
}

impl<T> From<AnalysisResult<T>> for View<T> {
    fn from(result: AnalysisResult<T>) -> Self {
        match result {
            Ok(data) => View::Ready { data },
            Err(err) => {
                log::warn!("{err}");
                let reason = match err {
                    AnalysisError::InsufficientData { reason, .. } => reason,
                };
                View::Empty { reason }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeSummary {
    pub normalization: NormalizeReport,
    pub data_years: Option<(i32, i32)>,
    pub selected_years: Option<(i32, i32)>,
    /// Peak for the season and agency views; `None` is every peak.
    pub selected_peak: Option<String>,
    pub records_in_range: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskView {
    pub years: Vec<YearRisk>,
    pub summary: RiskSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalityView {
    pub countries: Vec<CountryCount>,
    pub spotlight_country: String,
    /// `None` when the spotlight country has no climbers in range.
    pub spotlight: Option<CountrySpotlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencyView {
    pub min_expeditions: u64,
    pub podium: Vec<AgencyScore>,
    pub leaderboard: Vec<AgencyScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub scope: ScopeSummary,
    /// Full history, independent of the selected years.
    pub risk: View<RiskView>,
    pub nationalities: View<NationalityView>,
    pub peaks: View<Vec<PeakCount>>,
    pub funnel: View<AscentFunnel>,
    pub seasons: View<SeasonDistribution>,
    pub agencies: View<AgencyView>,
}

impl Report {
    /// `None` until a dataset is loaded.
    pub fn build(state: &AppState) -> Option<Report> {
        let full = state.full_batch()?;
        let in_range = state.in_range()?;
        let in_context = state.in_context()?;
        let config = &state.config;

        let risk = yearly_risk(&full.records).and_then(|years| {
            let summary = risk_summary(&years, config.risk_window)?;
            Ok(RiskView { years, summary })
        });

        let aliases = config.aliases();
        let spotlight_country = aliases.canonical(config.spotlight_country.trim()).to_string();
        let nationalities = expand_nationalities(&in_range.records, &aliases).map(|counts| {
            NationalityView {
                spotlight: spotlight(&counts, &spotlight_country),
                spotlight_country: spotlight_country.clone(),
                countries: counts.ranking,
            }
        });

        let funnel = match &state.funnel_peak {
            Some(peak) => ascent_funnel(peak, &in_range.records),
            None => Err(AnalysisError::insufficient("ascent funnel", "no peak in scope")),
        };

        let agencies = rank_agencies(&in_context.records, config.agency_min_expeditions).map(
            |ranking| AgencyView {
                min_expeditions: ranking.min_expeditions,
                podium: ranking.top(config.podium_size).to_vec(),
                leaderboard: ranking.top(config.leaderboard_size).to_vec(),
            },
        );

        log::info!(
            "Built report over {} records ({} in range)",
            full.len(),
            in_range.len()
        );

        Some(Report {
            scope: ScopeSummary {
                normalization: state.normalize_report.unwrap_or_default(),
                data_years: full.year_span,
                selected_years: state.scope.years,
                selected_peak: state.scope.peak.clone(),
                records_in_range: in_range.len(),
            },
            risk: risk.into(),
            nationalities: nationalities.into(),
            peaks: peak_popularity(&in_range.records, Some(config.top_peaks)).into(),
            funnel: funnel.into(),
            seasons: season_distribution(&in_context.records).into(),
            agencies: agencies.into(),
        })
    }
}
