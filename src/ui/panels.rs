use std::fmt::Write;

use anyhow::Result;

use super::tables::{count_column, decimal_column, table, text_column, year_column};
use crate::analysis::agency::AgencyScore;
use crate::analysis::aggregate::{PeakCount, SeasonDistribution};
use crate::analysis::funnel::AscentFunnel;
use crate::report::{AgencyView, NationalityView, Report, RiskView, ScopeSummary, View};

/// Countries listed in the nationality table.
const COUNTRY_ROWS: usize = 15;

const PODIUM_MEDALS: [&str; 3] = ["Gold", "Silver", "Bronze"];

// ---------------------------------------------------------------------------
// Whole report
// ---------------------------------------------------------------------------

/// Render the report as plain-text sections with ASCII tables.
pub fn render_text(report: &Report) -> Result<String> {
    let mut out = String::new();
    scope_section(&mut out, &report.scope)?;
    section(&mut out, "1. Risk over time", &report.risk, risk_section)?;
    section(&mut out, "2. Who climbs", &report.nationalities, nationality_section)?;
    section(&mut out, "3. Most popular peaks", &report.peaks, peaks_section)?;
    section(&mut out, "4. Ascent pyramid", &report.funnel, funnel_section)?;
    section(&mut out, "5. Seasons", &report.seasons, seasons_section)?;
    section(&mut out, "6. Agencies", &report.agencies, agencies_section)?;
    Ok(out)
}

fn section<T>(
    out: &mut String,
    title: &str,
    view: &View<T>,
    body: fn(&mut String, &T) -> Result<()>,
) -> Result<()> {
    writeln!(out, "\n== {title} ==")?;
    match view {
        View::Ready { data } => body(out, data),
        View::Empty { reason } => {
            writeln!(out, "No data: {reason}")?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn scope_section(out: &mut String, scope: &ScopeSummary) -> Result<()> {
    let n = &scope.normalization;
    writeln!(
        out,
        "Rows read: {}, kept: {}, without year: {}, before cut-off: {}",
        n.rows_read, n.kept, n.malformed, n.before_cutoff
    )?;
    if let Some((from, to)) = scope.selected_years {
        writeln!(out, "Period: {from}-{to} ({} expeditions)", scope.records_in_range)?;
    }
    let peak = scope.selected_peak.as_deref().unwrap_or("all peaks");
    writeln!(out, "Season and agency scope: {peak}")?;
    Ok(())
}

fn risk_section(out: &mut String, risk: &RiskView) -> Result<()> {
    let s = &risk.summary;
    writeln!(
        out,
        "{} climbers {}-{}; death rate {:.2}% in {} (last {} years: {:.1}%)",
        s.total_climbers,
        s.first_year,
        s.last_year,
        s.current_death_rate,
        s.last_year,
        s.window,
        s.recent_death_rate
    )?;
    let years = &risk.years;
    let rendered = table(vec![
        ("year", year_column(years.iter().map(|y| y.year))),
        ("climbers", count_column(years.iter().map(|y| y.climbers))),
        ("deaths", count_column(years.iter().map(|y| y.deaths))),
        (
            "death rate %",
            decimal_column(years.iter().map(|y| y.death_rate_percent), 2),
        ),
    ])?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

fn nationality_section(out: &mut String, view: &NationalityView) -> Result<()> {
    let top = &view.countries[..COUNTRY_ROWS.min(view.countries.len())];
    let rendered = table(vec![
        ("country", text_column(top.iter().map(|c| c.country.as_str()))),
        ("climbers", count_column(top.iter().map(|c| c.climbers))),
    ])?;
    writeln!(out, "{rendered}")?;
    match &view.spotlight {
        Some(s) => writeln!(
            out,
            "{}: {} climbers, rank #{} of {} (top {}%)",
            s.country, s.climbers, s.rank, s.of, s.top_percent
        )?,
        None => writeln!(out, "{}: no climbers in this period", view.spotlight_country)?,
    }
    Ok(())
}

fn peaks_section(out: &mut String, peaks: &Vec<PeakCount>) -> Result<()> {
    let rendered = table(vec![
        ("peak", text_column(peaks.iter().map(|p| p.peak.as_str()))),
        ("expeditions", count_column(peaks.iter().map(|p| p.expeditions))),
    ])?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

fn funnel_section(out: &mut String, funnel: &AscentFunnel) -> Result<()> {
    writeln!(out, "{} ({:.0} m)", funnel.peak, funnel.peak_height_meters)?;
    let thresholds: Vec<String> = funnel
        .levels
        .iter()
        .map(|l| l.threshold_meters.map_or(String::new(), |m| format!("{m:.0} m")))
        .collect();
    let rendered = table(vec![
        ("stage", text_column(funnel.levels.iter().map(|l| l.stage.label()))),
        ("from", text_column(thresholds.iter().map(String::as_str))),
        ("climbers", count_column(funnel.levels.iter().map(|l| l.climbers))),
    ])?;
    writeln!(out, "{rendered}")?;
    if funnel.summit_rate.defined {
        writeln!(out, "Summit rate: {:.1}% of those who reach base camp", funnel.summit_rate.percent)?;
    } else {
        writeln!(out, "Summit rate: undefined (no climbers)")?;
    }
    Ok(())
}

fn seasons_section(out: &mut String, dist: &SeasonDistribution) -> Result<()> {
    let names: Vec<String> = dist.shares.iter().map(|s| s.season.to_string()).collect();
    let rendered = table(vec![
        ("season", text_column(names.iter().map(String::as_str))),
        ("climbers", count_column(dist.shares.iter().map(|s| s.climbers))),
        ("% of climbers", decimal_column(dist.shares.iter().map(|s| s.percent), 1)),
    ])?;
    writeln!(out, "{rendered}")?;
    if let Some(season) = dist.predominant {
        let share = dist
            .shares
            .iter()
            .find(|s| s.season == season)
            .map_or(0.0, |s| s.percent);
        writeln!(out, "Predominant season: {season} ({share:.1}% of climbers)")?;
    }
    Ok(())
}

fn agencies_section(out: &mut String, view: &AgencyView) -> Result<()> {
    if view.podium.is_empty() {
        writeln!(
            out,
            "Not enough data (min. {} expeditions) for a reliable ranking.",
            view.min_expeditions
        )?;
        return Ok(());
    }
    for (medal, agency) in PODIUM_MEDALS.iter().zip(&view.podium) {
        writeln!(
            out,
            "{medal}: {} - {:.1}% success ({} exp.), score {:.2}",
            agency.agency, agency.success_rate, agency.expedition_count, agency.elite_score
        )?;
    }
    writeln!(out, "{}", leaderboard(&view.leaderboard)?)?;
    Ok(())
}

fn leaderboard(agencies: &[AgencyScore]) -> Result<String> {
    table(vec![
        ("agency", text_column(agencies.iter().map(|a| a.agency.as_str()))),
        ("expeditions", count_column(agencies.iter().map(|a| a.expedition_count))),
        ("success %", decimal_column(agencies.iter().map(|a| a.success_rate), 1)),
        ("elite score", decimal_column(agencies.iter().map(|a| a.elite_score), 2)),
    ])
}
