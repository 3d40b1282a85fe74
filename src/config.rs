use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analysis::agency::DEFAULT_MIN_EXPEDITIONS;
use crate::analysis::nationality::CountryAliases;
use crate::analysis::normalize::{Normalizer, DEFAULT_MIN_YEAR};

// ---------------------------------------------------------------------------
// Config – tunable thresholds, optionally read from TOML
// ---------------------------------------------------------------------------

/// Every field has a default, so a config file only lists what it changes:
///
/// ```toml
/// agency_min_expeditions = 5
/// spotlight_country = "Japan"
///
/// [country_aliases]
/// "Czechoslovakia" = "Czechia"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Records before this year are dropped during normalization.
    pub min_year: i32,
    /// First year of the initial scope.
    pub default_start_year: i32,
    pub agency_min_expeditions: u64,
    /// Number of trailing years averaged for the recent death rate.
    pub risk_window: usize,
    pub top_peaks: usize,
    pub podium_size: usize,
    pub leaderboard_size: usize,
    pub spotlight_country: String,
    pub default_funnel_peak: String,
    /// Added to the built-in aliases ("USA" → "United States", ...).
    pub country_aliases: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            default_start_year: 1990,
            agency_min_expeditions: DEFAULT_MIN_EXPEDITIONS,
            risk_window: 5,
            top_peaks: 10,
            podium_size: 3,
            leaderboard_size: 10,
            spotlight_country: "Spain".to_string(),
            default_funnel_peak: "Everest".to_string(),
            country_aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads the config from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.min_year)
    }

    pub fn aliases(&self) -> CountryAliases {
        CountryAliases::with_extra(&self.country_aliases)
    }
}
