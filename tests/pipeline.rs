use std::collections::BTreeMap;
use std::io::Write;

use himalaya_elite::analysis::agency::rank_agencies;
use himalaya_elite::analysis::aggregate::yearly_risk;
use himalaya_elite::analysis::cache::{MemoTable, SourceKey};
use himalaya_elite::analysis::funnel::{ascent_funnel, Stage};
use himalaya_elite::analysis::nationality::{expand_nationalities, CountryAliases};
use himalaya_elite::analysis::normalize::Normalizer;
use himalaya_elite::config::Config;
use himalaya_elite::data::loader::{load_file, RawSource};
use himalaya_elite::data::model::{fields, RawRow, RawValue};
use himalaya_elite::report::Report;
use himalaya_elite::state::AppState;

fn row(cells: &[(&str, RawValue)]) -> RawRow {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect::<BTreeMap<_, _>>()
}

fn text(s: &str) -> RawValue {
    RawValue::String(s.to_string())
}

fn source(rows: Vec<RawRow>) -> RawSource {
    RawSource {
        key: SourceKey::of_rows(&rows),
        rows,
    }
}

fn everest_rows() -> Vec<RawRow> {
    vec![
        row(&[
            (fields::EXPEDITION_ID, text("EVER53101")),
            (fields::YEAR, RawValue::Integer(1953)),
            (fields::PEAK_NAME, text("Everest")),
            (fields::PEAK_HEIGHT, RawValue::Integer(8849)),
            (fields::TOTAL_MEMBERS, RawValue::Integer(10)),
            (fields::HIGH_POINT, RawValue::Integer(8849)),
            (fields::SUMMIT_MEMBERS, RawValue::Integer(1)),
            (fields::NATION, text("UK")),
            (fields::SUCCESS, text("yes")),
        ]),
        row(&[
            (fields::EXPEDITION_ID, text("EVER96101")),
            (fields::YEAR, text("1996")),
            (fields::PEAK_NAME, text("Everest")),
            (fields::PEAK_HEIGHT, RawValue::Float(8849.0)),
            (fields::TOTAL_MEMBERS, RawValue::Integer(20)),
            (fields::MEMBER_DEATHS, RawValue::Integer(2)),
            (fields::HIGH_POINT, RawValue::Integer(5000)),
            (fields::SUMMIT_MEMBERS, RawValue::Integer(0)),
            (fields::NATION, text("W Germany, USA")),
            (fields::SUCCESS, RawValue::Null),
        ]),
        // no year: dropped
        row(&[
            (fields::PEAK_NAME, text("Everest")),
            (fields::TOTAL_MEMBERS, RawValue::Integer(99)),
        ]),
    ]
}

#[test]
fn test_everest_funnel_from_raw_rows() {
    let (batch, report) = Normalizer::default().normalize(&everest_rows());
    assert_eq!(report.rows_read, 3);
    assert_eq!(report.kept, 2);
    assert_eq!(report.malformed, 1);

    let funnel = ascent_funnel("Everest", &batch.records).unwrap();
    let counts: Vec<u64> = Stage::ALL.iter().map(|&s| funnel.climbers(s)).collect();
    assert_eq!(counts, vec![30, 30, 30, 10, 1]);
    assert!(funnel.summit_rate.defined);
    assert!((funnel.summit_rate.percent - 100.0 / 30.0).abs() < 1e-9);
}

#[test]
fn test_success_flag_and_nationalities() {
    let (batch, _) = Normalizer::default().normalize(&everest_rows());
    assert!(batch.records[0].success);
    assert!(!batch.records[1].success);

    let counts = expand_nationalities(&batch.records, &CountryAliases::default()).unwrap();
    assert_eq!(counts.count("Germany"), Some(1));
    assert_eq!(counts.count("United States"), Some(1));
    assert_eq!(counts.count("United Kingdom"), Some(1));
    assert_eq!(counts.count("W Germany"), None);
}

#[test]
fn test_yearly_risk_rates() {
    let (batch, _) = Normalizer::default().normalize(&everest_rows());
    let years = yearly_risk(&batch.records).unwrap();
    assert_eq!(years.len(), 2);
    assert_eq!(years[0].death_rate_percent, 0.0);
    assert!((years[1].death_rate_percent - 10.0).abs() < 1e-9);
}

#[test]
fn test_agency_elite_score() {
    let rows: Vec<RawRow> = (0..4)
        .map(|i| {
            row(&[
                (fields::YEAR, RawValue::Integer(2000 + i)),
                (fields::PEAK_NAME, text("Lhotse")),
                (fields::AGENCY, text("A")),
                (fields::SUCCESS, RawValue::Bool(i < 3)),
            ])
        })
        .collect();
    let (batch, _) = Normalizer::default().normalize(&rows);

    let ranking = rank_agencies(&batch.records, 3).unwrap();
    let a = &ranking.agencies[0];
    assert_eq!(a.agency, "A");
    assert_eq!(a.success_rate, 75.0);
    assert!((a.elite_score - 52.4).abs() < 0.05);

    let strict = rank_agencies(&batch.records, 5).unwrap();
    assert!(strict.agencies.is_empty());
}

#[test]
fn test_normalization_is_memoized_per_source() {
    let src = source(everest_rows());
    let mut memo = MemoTable::new();

    let first = memo.normalized(&src, &Normalizer::default());
    let second = memo.normalized(&src, &Normalizer::default());
    assert_eq!(memo.stats(), (1, 1));
    assert_eq!(first.batch.records, second.batch.records);

    // same rows, same batch
    let again = Normalizer::default().normalize(&everest_rows());
    assert_eq!(again.0.records, first.batch.records);

    memo.normalized(&src, &Normalizer::new(1990));
    assert_eq!(memo.stats(), (1, 2));
}

#[test]
fn test_report_from_csv_file() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "expid,year,pkname,heightm,season,nation,countries,agency,totmembers,mdeaths,smtmembers,highpoint,success1"
    )
    .unwrap();
    writeln!(file, "EVER00101,2000,Everest,8849,Spring,Spain,,Summit Co,6,0,2,8849,true").unwrap();
    writeln!(file, "EVER01101,2001,Everest,8849,Autumn,USA,Spain,Summit Co,4,1,0,7000,false").unwrap();
    writeln!(file, "LHOT02101,2002,Lhotse,8516,Spring,Japan,,Summit Co,3,0,3,8516,yes").unwrap();
    writeln!(file, ",1949,Everest,8849,Spring,UK,,,5,0,0,0,false").unwrap();
    file.flush().unwrap();

    let source = load_file(file.path()).unwrap();
    let mut state = AppState::new(Config::default());
    state.load_source(&source);
    let report = Report::build(&state).unwrap();

    assert_eq!(report.scope.normalization.kept, 3);
    assert_eq!(report.scope.normalization.before_cutoff, 1);

    let nations = report.nationalities.ready().unwrap();
    let spain = nations.spotlight.as_ref().unwrap();
    // once from a nation field, once from a countries field
    assert_eq!(spain.climbers, 2);
    assert_eq!(spain.rank, 1);

    let funnel = report.funnel.ready().unwrap();
    assert_eq!(funnel.peak, "Everest");
    assert_eq!(funnel.climbers(Stage::Base), 10);
    assert_eq!(funnel.climbers(Stage::Summit), 2);

    let agencies = report.agencies.ready().unwrap();
    assert_eq!(agencies.podium[0].agency, "Summit Co");
    assert_eq!(agencies.podium[0].success_count, 2);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"status\":\"ready\""));
}
