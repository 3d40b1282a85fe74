//! Ascent pyramid: how many climbers got how far up one peak.

use std::collections::BTreeSet;

use serde::Serialize;

use super::error::{AnalysisError, AnalysisResult};
use crate::data::model::ExpeditionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    Base,
    Height30,
    Height50,
    Height80,
    Summit,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Base,
        Stage::Height30,
        Stage::Height50,
        Stage::Height80,
        Stage::Summit,
    ];

    /// Share of the peak height a high point must reach, for the
    /// intermediate stages.
    pub fn fraction(self) -> Option<f64> {
        match self {
            Stage::Height30 => Some(0.30),
            Stage::Height50 => Some(0.50),
            Stage::Height80 => Some(0.80),
            Stage::Base | Stage::Summit => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Base => "Base camp",
            Stage::Height30 => ">30% height",
            Stage::Height50 => ">50% height",
            Stage::Height80 => ">80% height",
            Stage::Summit => "Summit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelLevel {
    pub stage: Stage,
    /// Altitude a high point must reach to count, for the intermediate stages.
    pub threshold_meters: Option<f64>,
    pub climbers: u64,
}

/// Where the summit count came from. Chosen once per peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SummitSource {
    /// Sum of the reported summit member counts.
    SummitMembers,
    /// Members of successful expeditions, when no summit counts are reported.
    SuccessfulExpeditions,
}

/// Summit / base. `defined` is false when the base is empty, so "0% success"
/// and "nobody tried" stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummitRate {
    pub ratio: f64,
    pub percent: f64,
    pub defined: bool,
}

impl SummitRate {
    fn of(summit: u64, base: u64) -> Self {
        if base == 0 {
            return SummitRate {
                ratio: 0.0,
                percent: 0.0,
                defined: false,
            };
        }
        let ratio = summit as f64 / base as f64;
        SummitRate {
            ratio,
            percent: ratio * 100.0,
            defined: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AscentFunnel {
    pub peak: String,
    pub peak_height_meters: f64,
    /// Base first, summit last; never increasing.
    pub levels: Vec<FunnelLevel>,
    pub summit_source: SummitSource,
    pub summit_rate: SummitRate,
}

impl AscentFunnel {
    pub fn climbers(&self, stage: Stage) -> u64 {
        self.levels
            .iter()
            .find(|l| l.stage == stage)
            .map_or(0, |l| l.climbers)
    }
}

/// Build the pyramid for `peak` out of `records` (other peaks are ignored).
///
/// The peak height is the largest height recorded for it; without one there
/// is nothing to measure progress against.
pub fn ascent_funnel(peak: &str, records: &[ExpeditionRecord]) -> AnalysisResult<AscentFunnel> {
    let on_peak: Vec<&ExpeditionRecord> =
        records.iter().filter(|r| r.peak_name == peak).collect();
    if on_peak.is_empty() {
        return Err(AnalysisError::insufficient(
            "ascent funnel",
            format!("no expeditions to {peak} in scope"),
        ));
    }

    let peak_height = on_peak
        .iter()
        .filter_map(|r| r.peak_height_meters)
        .fold(0.0_f64, f64::max);
    if peak_height <= 0.0 {
        return Err(AnalysisError::insufficient(
            "ascent funnel",
            format!("no height recorded for {peak}"),
        ));
    }

    let members_reaching = |fraction: f64| -> u64 {
        let threshold = peak_height * fraction;
        on_peak
            .iter()
            .filter(|r| r.high_point_meters >= threshold)
            .map(|r| u64::from(r.total_members))
            .sum()
    };

    let base: u64 = on_peak.iter().map(|r| u64::from(r.total_members)).sum();
    let stage30 = members_reaching(0.30);
    let mut stage50 = members_reaching(0.50);
    let mut stage80 = members_reaching(0.80);

    let summit_source = if on_peak.iter().any(|r| r.summit_members.is_some()) {
        SummitSource::SummitMembers
    } else {
        SummitSource::SuccessfulExpeditions
    };
    let mut summit: u64 = match summit_source {
        SummitSource::SummitMembers => on_peak
            .iter()
            .map(|r| u64::from(r.summit_members.unwrap_or(0)))
            .sum(),
        SummitSource::SuccessfulExpeditions => on_peak
            .iter()
            .filter(|r| r.success)
            .map(|r| u64::from(r.total_members))
            .sum(),
    };

    // High points and summit counts are reported independently and can
    // disagree. Clamp in this order: 50 against 30, 80 against 50, summit
    // against 80.
    stage50 = stage50.min(stage30);
    stage80 = stage80.min(stage50);
    summit = summit.min(stage80);

    let counts = [base, stage30, stage50, stage80, summit];
    let levels = Stage::ALL
        .iter()
        .zip(counts)
        .map(|(&stage, climbers)| FunnelLevel {
            stage,
            threshold_meters: stage.fraction().map(|f| peak_height * f),
            climbers,
        })
        .collect();

    log::debug!("Funnel for {peak}: {counts:?} ({summit_source:?})");

    Ok(AscentFunnel {
        peak: peak.to_string(),
        peak_height_meters: peak_height,
        levels,
        summit_source,
        summit_rate: SummitRate::of(summit, base),
    })
}

/// The peak to show first: `preferred` when it is in scope, otherwise the
/// alphabetically first peak.
pub fn default_peak(peaks: &BTreeSet<String>, preferred: &str) -> Option<String> {
    if peaks.contains(preferred) {
        return Some(preferred.to_string());
    }
    peaks.iter().next().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn expedition(members: u32, high_point: f64, summit: Option<u32>) -> ExpeditionRecord {
        ExpeditionRecord {
            peak_height_meters: Some(8849.0),
            total_members: members,
            high_point_meters: high_point,
            summit_members: summit,
            ..record(1996, "Everest")
        }
    }

    fn counts(funnel: &AscentFunnel) -> Vec<u64> {
        funnel.levels.iter().map(|l| l.climbers).collect()
    }

    #[test]
    fn test_everest_scenario() {
        let mut first = expedition(10, 8849.0, Some(1));
        first.year = 1953;
        let records = vec![first, expedition(20, 5000.0, Some(0))];

        let funnel = ascent_funnel("Everest", &records).unwrap();

        assert_eq!(counts(&funnel), vec![30, 30, 30, 10, 1]);
        assert_eq!(funnel.summit_source, SummitSource::SummitMembers);
        assert_eq!(funnel.levels[1].threshold_meters, Some(8849.0 * 0.30));
        assert_eq!(funnel.levels[0].threshold_meters, None);
        assert!(funnel.summit_rate.defined);
        assert!((funnel.summit_rate.ratio - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamping_keeps_sequence_non_increasing() {
        // Summit count larger than everyone who got above 80%.
        let records = vec![
            expedition(5, 8000.0, Some(40)),
            expedition(50, 1000.0, None),
        ];
        let funnel = ascent_funnel("Everest", &records).unwrap();
        let c = counts(&funnel);

        assert_eq!(c, vec![55, 5, 5, 5, 5]);
        assert!(c.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_summit_falls_back_to_successful_members() {
        let mut success = expedition(8, 8849.0, None);
        success.success = true;
        let records = vec![success, expedition(4, 8849.0, None)];

        let funnel = ascent_funnel("Everest", &records).unwrap();

        assert_eq!(funnel.summit_source, SummitSource::SuccessfulExpeditions);
        assert_eq!(funnel.climbers(Stage::Summit), 8);
    }

    #[test]
    fn test_missing_height_is_insufficient() {
        let records = vec![ExpeditionRecord {
            peak_height_meters: None,
            ..expedition(10, 5000.0, None)
        }];
        let err = ascent_funnel("Everest", &records).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn test_unknown_peak_is_insufficient() {
        let records = vec![expedition(10, 5000.0, None)];
        assert!(ascent_funnel("K2", &records).is_err());
    }

    #[test]
    fn test_empty_base_leaves_rate_undefined() {
        let records = vec![expedition(0, 8849.0, Some(0))];
        let funnel = ascent_funnel("Everest", &records).unwrap();

        assert_eq!(counts(&funnel), vec![0, 0, 0, 0, 0]);
        assert!(!funnel.summit_rate.defined);
        assert_eq!(funnel.summit_rate.ratio, 0.0);
    }

    #[test]
    fn test_default_peak() {
        let peaks: BTreeSet<String> = ["Lhotse", "Ama Dablam"].iter().map(|s| s.to_string()).collect();
        assert_eq!(default_peak(&peaks, "Everest").as_deref(), Some("Ama Dablam"));
        assert_eq!(default_peak(&peaks, "Lhotse").as_deref(), Some("Lhotse"));
        assert_eq!(default_peak(&BTreeSet::new(), "Everest"), None);
    }
}
