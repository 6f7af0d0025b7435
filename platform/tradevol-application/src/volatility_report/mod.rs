use crate::aggregation::{aggregate, AggregationOptions, SharedTradeSource};
use crate::config::Config;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tradevol_domain::error::VolatilityError;
use tradevol_domain::services::ranking::Ranking;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityReport {
    pub trades_dir: PathBuf,
    pub tickers: usize,
    pub ranking: Ranking,
}

/// Lists the trade files, scans them concurrently, then ranks the results.
pub fn run_volatility_report(
    config: &Config,
    source: SharedTradeSource,
) -> Result<VolatilityReport, VolatilityError> {
    config.validate()?;
    let started = Instant::now();
    let trades_dir = config.input.trades_dir.clone();

    let files = source.list_ticker_files(&trades_dir)?;
    if files.is_empty() {
        return Err(VolatilityError::InsufficientData(format!(
            "no trade files found in {}",
            trades_dir.display()
        )));
    }

    let options = AggregationOptions {
        parallelism: config.resolved_parallelism(),
        timeout: config.timeout(),
    };
    let aggregated = aggregate(source, files, options)?;
    let tickers = aggregated.ticker_count();
    let ranking = aggregated.rank(config.report.top_n)?;

    tracing::info!(
        trades_dir = %trades_dir.display(),
        tickers,
        zero = ranking.zero_volatility.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "volatility report ready"
    );

    Ok(VolatilityReport {
        trades_dir,
        tickers,
        ranking,
    })
}
