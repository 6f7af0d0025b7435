use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tradevol_application::aggregation::{aggregate, AggregationOptions};
use tradevol_application::config::{Config, ConfigOverrides, ReportFormat};
use tradevol_application::reporting::{render, render_text};
use tradevol_application::volatility_report::run_volatility_report;
use tradevol_domain::error::VolatilityError;
use tradevol_domain::repositories::trade_source::TradeSource;
use tradevol_infrastructure::trade_files::FilesystemTradeSource;

fn unique_tmp_dir(name: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!(
        "tradevol_{name}_{}_{}",
        std::process::id(),
        now
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_ticker(dir: &Path, ticker: &str, prices: &[f64]) {
    let mut contents = String::from("SECID,TRADETIME,PRICE,QUANTITY\n");
    for (idx, price) in prices.iter().enumerate() {
        contents.push_str(&format!("{ticker},10:{:02}:00,{price},{}\n", idx % 60, idx + 1));
    }
    fs::write(dir.join(format!("TICKER_{ticker}.csv")), contents).expect("write ticker file");
}

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.apply_overrides(ConfigOverrides {
        trades_dir: Some(dir.to_path_buf()),
        parallelism: Some(4),
        ..ConfigOverrides::default()
    });
    config
}

fn source() -> Arc<FilesystemTradeSource> {
    Arc::new(FilesystemTradeSource::new())
}

fn populate_market(dir: &Path) {
    write_ticker(dir, "AFH9", &[11.0, 11.0, 12.0, 11.0, 12.0, 11.0, 11.0, 11.0]);
    write_ticker(dir, "GRZ9", &[20.0, 15.0, 23.0, 56.0, 100.0, 50.0, 3.0, 10.0]);
    write_ticker(dir, "SRZ9", &[100.0, 150.0]);
    write_ticker(dir, "TXT9", &[10.0, 10.5]);
    write_ticker(dir, "KCH9", &[200.0, 201.0]);
    write_ticker(dir, "PDZ9", &[50.0, 60.0, 55.0]);
    write_ticker(dir, "ZZZ1", &[5.0, 5.0, 5.0]);
    write_ticker(dir, "AAA1", &[7.25]);
}

#[test]
fn full_run_ranks_named_tickers() {
    let dir = unique_tmp_dir("full_run");
    populate_market(&dir);

    let report = run_volatility_report(&config_for(&dir), source()).expect("report");
    assert_eq!(report.tickers, 8);

    let text = render_text(&report.ranking);
    let expected = [
        "Maximum volatility:",
        "    GRZ9 - 188.35 %",
        "    SRZ9 - 40.00 %",
        "    PDZ9 - 18.18 %",
        "Minimum volatility:",
        "    KCH9 - 0.50 %",
        "    TXT9 - 4.88 %",
        "    AFH9 - 8.70 %",
        "Zero volatility:",
        "    AAA1, ZZZ1",
        "",
    ]
    .join("\n");
    assert_eq!(text, expected);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn two_varying_tickers_are_insufficient_for_ranking() {
    let dir = unique_tmp_dir("insufficient");
    write_ticker(&dir, "CCC3", &[4.0, 4.0]);
    write_ticker(&dir, "AAA1", &[9.0]);
    write_ticker(&dir, "BBB2", &[1.5, 1.5, 1.5]);
    write_ticker(&dir, "VAR1", &[10.0, 12.0]);
    write_ticker(&dir, "VAR2", &[30.0, 20.0]);

    let err = run_volatility_report(&config_for(&dir), source()).expect_err("expected failure");
    assert!(err.is_insufficient_data(), "{err:?}");

    let fs_source = source();
    let files = fs_source.list_ticker_files(&dir).expect("list files");
    let mut aggregated = aggregate(fs_source, files, AggregationOptions::default()).expect("aggregate");
    aggregated.zero.sort();
    assert_eq!(aggregated.non_zero.len(), 2);
    assert_eq!(aggregated.zero, vec!["AAA1", "BBB2", "CCC3"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn repeated_runs_produce_identical_reports() {
    let dir = unique_tmp_dir("idempotent");
    populate_market(&dir);
    let config = config_for(&dir);

    let first = run_volatility_report(&config, source()).expect("first report");
    let second = run_volatility_report(&config, source()).expect("second report");
    assert_eq!(first, second);
    assert_eq!(
        render(&first, ReportFormat::Json).expect("json"),
        render(&second, ReportFormat::Json).expect("json")
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_file_aborts_without_report() {
    let dir = unique_tmp_dir("malformed");
    populate_market(&dir);
    fs::write(
        dir.join("TICKER_BAD1.csv"),
        "SECID,TRADETIME,PRICE,QUANTITY\nBAD1,10:00:00,not-a-price,1\n",
    )
    .expect("write bad file");

    let err = run_volatility_report(&config_for(&dir), source()).expect_err("expected failure");
    match err {
        VolatilityError::Parse { path, line, .. } => {
            assert!(path.ends_with("TICKER_BAD1.csv"));
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn header_only_file_is_insufficient_data() {
    let dir = unique_tmp_dir("header_only");
    populate_market(&dir);
    fs::write(dir.join("TICKER_NONE.csv"), "SECID,TRADETIME,PRICE,QUANTITY\n")
        .expect("write empty file");

    let err = run_volatility_report(&config_for(&dir), source()).expect_err("expected failure");
    assert!(err.is_insufficient_data());
    assert!(err.to_string().contains("TICKER_NONE.csv"), "{err}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn empty_directory_is_insufficient_data() {
    let dir = unique_tmp_dir("empty_dir");
    let err = run_volatility_report(&config_for(&dir), source()).expect_err("expected failure");
    assert!(err.is_insufficient_data());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_directory_is_io_error() {
    let dir = std::env::temp_dir().join("tradevol_definitely_missing_trades_dir");
    let err = run_volatility_report(&config_for(&dir), source()).expect_err("expected failure");
    assert!(matches!(err, VolatilityError::Io { .. }), "{err:?}");
}

#[test]
fn top_n_controls_section_length() {
    let dir = unique_tmp_dir("top_n");
    populate_market(&dir);
    let mut config = config_for(&dir);
    config.report.top_n = 2;

    let report = run_volatility_report(&config, source()).expect("report");
    let most: Vec<&str> = report
        .ranking
        .most_volatile
        .iter()
        .map(|v| v.ticker.as_str())
        .collect();
    let least: Vec<&str> = report
        .ranking
        .least_volatile
        .iter()
        .map(|v| v.ticker.as_str())
        .collect();
    assert_eq!(most, vec!["GRZ9", "SRZ9"]);
    assert_eq!(least, vec!["KCH9", "TXT9"]);

    let _ = fs::remove_dir_all(&dir);
}
