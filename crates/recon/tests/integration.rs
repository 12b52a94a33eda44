use std::path::PathBuf;

use carjoin_recon::config::JoinConfig;
use carjoin_recon::engine::run;
use carjoin_recon::merge::{write_enriched_csv, CsvOptions};
use carjoin_recon::table::{ReferenceTable, TargetTable};
use carjoin_recon::{CanonicalKey, JoinResult};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_and_run(config_toml: &str) -> (TargetTable, JoinResult) {
    let dir = fixtures_dir();
    let config = JoinConfig::from_toml(config_toml).unwrap();

    let tx = std::fs::read_to_string(dir.join(&config.target.file)).unwrap();
    let kbb = std::fs::read_to_string(dir.join(&config.reference.source)).unwrap();
    let targets = TargetTable::from_csv(&tx, &config.target).unwrap();
    let references = ReferenceTable::from_csv(&kbb, &config.reference).unwrap();

    let result = run(&config, &targets, &references).unwrap();
    (targets, result)
}

fn fixture_config() -> String {
    std::fs::read_to_string(fixtures_dir().join("tx-kbb.join.toml")).unwrap()
}

fn price(result: &JoinResult, key: &str) -> Option<f64> {
    result.index.get(&CanonicalKey::from(key))
}

// -------------------------------------------------------------------------
// Fixture pipeline
// -------------------------------------------------------------------------

#[test]
fn fixture_summary() {
    let (_, result) = load_and_run(&fixture_config());
    let s = &result.summary;

    assert_eq!(result.meta.config_name, "tx-kbb");
    assert_eq!(s.target_rows, 10);
    assert_eq!(s.filtered_target_rows, 2);
    assert_eq!(s.target_keys, 8);
    assert_eq!(s.reference_rows, 11);
    assert_eq!(s.reference_keys, 9);
    assert_eq!(s.matched_reference_keys, 8);
    assert_eq!(s.unmatched_reference_keys, 1);
    assert_eq!(s.indexed_target_keys, 7);
    assert_eq!(s.enriched_rows, 9);
    assert_eq!(s.dropped_target_rows, 1);
    assert_eq!(s.skipped_reference_rows, 0);
}

#[test]
fn fixture_prices_are_means_of_all_contributors() {
    let (_, result) = load_and_run(&fixture_config());

    assert_eq!(price(&result, "2022 TOYOTA CAMRY"), Some(24500.0));
    assert_eq!(price(&result, "2015 CHEV MALIBU"), Some(10500.0));
    // "2010 FOR F15" and "2010 FOR F-1" both resolve here.
    assert_eq!(price(&result, "2010 FORD F150"), Some(13000.0));
    assert_eq!(price(&result, "2021 RAM X"), Some(38000.0));
    assert_eq!(price(&result, "2017 TESL MODEL S"), None);
}

#[test]
fn fixture_output_keeps_target_order_and_drops_unpriced() {
    let (_, result) = load_and_run(&fixture_config());

    let ids: Vec<&str> = result.records.iter().map(|r| r.values[0].as_str()).collect();
    assert_eq!(ids, ["1001", "1002", "1003", "1004", "1005", "1008", "1009", "1010", "1012"]);
    for r in &result.records {
        assert_eq!(Some(r.price), result.index.get(&r.key));
    }
}

#[test]
fn fixture_unmatched_reference_is_reported() {
    let (_, result) = load_and_run(&fixture_config());
    let unmatched: Vec<&str> = result
        .matches
        .iter()
        .filter(|m| m.target_key.is_none())
        .map(|m| m.reference_key.as_str())
        .collect();
    assert_eq!(unmatched, ["1999 YUG SED"]);
}

#[test]
fn parallel_run_matches_sequential() {
    let (_, seq) = load_and_run(&fixture_config());
    let par_config = fixture_config().replace(
        "prefix_len = 3",
        "prefix_len = 3\nparallel = true\nchunk_size = 2",
    );
    let (_, par) = load_and_run(&par_config);

    assert_eq!(seq.index, par.index);
    assert_eq!(seq.records, par.records);
    assert_eq!(seq.matches, par.matches);
}

#[test]
fn higher_cutoff_only_removes_matches() {
    let (_, loose) = load_and_run(&fixture_config());
    let (_, strict) = load_and_run(&fixture_config().replace("cutoff = 0.6", "cutoff = 0.85"));

    assert!(strict.summary.matched_reference_keys < loose.summary.matched_reference_keys);
    for m in strict.matches.iter().filter(|m| m.target_key.is_some()) {
        let same = loose
            .matches
            .iter()
            .find(|l| l.reference_key == m.reference_key)
            .unwrap();
        assert_eq!(same.target_key, m.target_key);
    }
}

#[test]
fn enriched_csv_written_to_disk() {
    let (targets, result) = load_and_run(&fixture_config());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("enriched.csv");

    let file = std::fs::File::create(&path).unwrap();
    write_enriched_csv(&targets.headers, &result.records, file, CsvOptions::default()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("crash_id,vehicle_year,vehicle_make,vehicle_model,vehicle_color,price")
    );
    assert_eq!(lines.next(), Some("1001,2022,TOYOTA,CAMRY,WHI,24500"));
    assert_eq!(text.lines().count(), 10);
}

#[test]
fn jaro_winkler_metric_runs_end_to_end() {
    let (_, result) = load_and_run(&fixture_config().replace("\"sequence\"", "\"jaro_winkler\""));
    assert_eq!(price(&result, "2022 TOYOTA CAMRY"), Some(24500.0));
    assert!(result.records.iter().all(|r| result.index.contains(&r.key)));
}
