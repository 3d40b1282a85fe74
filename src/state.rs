use std::sync::Arc;

use crate::analysis::cache;
use crate::analysis::funnel::default_peak;
use crate::analysis::normalize::NormalizeReport;
use crate::config::Config;
use crate::data::filter::{filtered_indices, init_scope, Scope};
use crate::data::loader::RawSource;
use crate::data::model::ExpeditionBatch;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Normalized batch (None until a source is loaded).
    pub dataset: Option<Arc<ExpeditionBatch>>,

    /// Row counts from normalizing the current source.
    pub normalize_report: Option<NormalizeReport>,

    /// Year range plus the peak picked for seasons and agencies.
    pub scope: Scope,

    /// Indices of records inside the year range, any peak (cached).
    pub visible_indices: Vec<usize>,

    /// Peak shown in the ascent pyramid.
    pub funnel_peak: Option<String>,

    /// Status / warning message for the front end.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dataset: None,
            normalize_report: None,
            scope: Scope::default(),
            visible_indices: Vec::new(),
            funnel_peak: None,
            status_message: None,
        }
    }

    /// Normalize `source` through the shared memo table and make it current.
    pub fn load_source(&mut self, source: &RawSource) {
        let entry = cache::normalized(source, &self.config.normalizer());
        self.set_dataset(entry.batch, entry.report);
    }

    /// Ingest a normalized batch, initialise scope and funnel peak.
    pub fn set_dataset(&mut self, dataset: Arc<ExpeditionBatch>, report: NormalizeReport) {
        self.scope = init_scope(&dataset, self.config.default_start_year);
        self.dataset = Some(dataset);
        self.normalize_report = Some(report);
        self.refilter();
    }

    /// Recompute `visible_indices` and the funnel peak after a scope change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        self.visible_indices = filtered_indices(ds, &self.scope.all_peaks());

        let in_range = ds.select(&self.visible_indices);
        let still_valid = self
            .funnel_peak
            .as_ref()
            .is_some_and(|p| in_range.peak_names.contains(p));
        if !still_valid {
            self.funnel_peak = default_peak(&in_range.peak_names, &self.config.default_funnel_peak);
        }

        self.status_message = if self.visible_indices.is_empty() {
            log::warn!("No records in the selected period");
            Some("No data for the selected filters.".to_string())
        } else {
            None
        };
    }

    pub fn set_years(&mut self, from: i32, to: i32) {
        self.scope = Scope {
            peak: self.scope.peak.take(),
            ..Scope::all().with_years(from, to)
        };
        self.refilter();
    }

    /// Year range from optional bounds; a missing bound is taken from the
    /// data's span. Returns `false` when there is no data to take it from.
    pub fn set_year_bounds(&mut self, from: Option<i32>, to: Option<i32>) -> bool {
        let Some((first, last)) = self.dataset.as_ref().and_then(|ds| ds.year_span) else {
            return false;
        };
        self.set_years(from.unwrap_or(first), to.unwrap_or(last));
        true
    }

    /// Peak for the season and agency views; `None` means every peak.
    pub fn set_peak(&mut self, peak: Option<String>) {
        self.scope.peak = peak;
        self.refilter();
    }

    pub fn set_funnel_peak(&mut self, peak: &str) {
        self.funnel_peak = Some(peak.to_string());
    }

    /// Every normalized record, regardless of scope.
    pub fn full_batch(&self) -> Option<&ExpeditionBatch> {
        self.dataset.as_deref()
    }

    /// Records inside the year range, any peak.
    pub fn in_range(&self) -> Option<ExpeditionBatch> {
        let ds = self.dataset.as_ref()?;
        Some(ds.select(&self.visible_indices))
    }

    /// Records inside the year range and the selected peak.
    pub fn in_context(&self) -> Option<ExpeditionBatch> {
        let ds = self.dataset.as_ref()?;
        Some(ds.select(&filtered_indices(ds, &self.scope)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn state() -> AppState {
        let batch = ExpeditionBatch::from_records(vec![
            record(1985, "Everest"),
            record(1995, "Lhotse"),
            record(2005, "Everest"),
            record(2015, "Ama Dablam"),
        ]);
        let mut state = AppState::new(Config::default());
        state.set_dataset(Arc::new(batch), NormalizeReport::default());
        state
    }

    #[test]
    fn test_initial_scope_starts_at_default_year() {
        let state = state();
        assert_eq!(state.scope.years, Some((1990, 2015)));
        assert_eq!(state.visible_indices, vec![1, 2, 3]);
        assert_eq!(state.funnel_peak.as_deref(), Some("Everest"));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn test_funnel_peak_follows_range() {
        let mut state = state();
        state.set_years(2010, 2020);
        assert_eq!(state.funnel_peak.as_deref(), Some("Ama Dablam"));

        state.set_years(1980, 2020);
        state.set_funnel_peak("Lhotse");
        state.set_years(1990, 2000);
        assert_eq!(state.funnel_peak.as_deref(), Some("Lhotse"));
    }

    #[test]
    fn test_peak_selection_keeps_years() {
        let mut state = state();
        state.set_peak(Some("Everest".to_string()));
        state.set_years(1980, 2000);

        assert_eq!(state.scope.peak.as_deref(), Some("Everest"));
        assert_eq!(state.in_context().unwrap().len(), 1);
        assert_eq!(state.in_range().unwrap().len(), 2);
        assert_eq!(state.full_batch().unwrap().len(), 4);
    }

    #[test]
    fn test_open_bounds_come_from_data_span() {
        let mut state = state();

        assert!(state.set_year_bounds(None, Some(1990)));
        assert_eq!(state.scope.years, Some((1985, 1990)));
        assert_eq!(state.visible_indices, vec![0]);

        assert!(state.set_year_bounds(Some(2000), None));
        assert_eq!(state.scope.years, Some((2000, 2015)));
        assert_eq!(state.visible_indices, vec![2, 3]);
    }

    #[test]
    fn test_bounds_without_data() {
        let mut state = AppState::new(Config::default());
        assert!(!state.set_year_bounds(None, Some(1980)));
        assert_eq!(state.scope.years, None);
    }

    #[test]
    fn test_empty_range_sets_status() {
        let mut state = state();
        state.set_years(1900, 1920);
        assert!(state.visible_indices.is_empty());
        assert!(state.status_message.is_some());
    }
}
