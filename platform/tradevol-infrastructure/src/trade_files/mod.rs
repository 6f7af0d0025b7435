use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tradevol_domain::error::VolatilityError;
use tradevol_domain::repositories::trade_source::{TickerFile, TradeSource};
use tradevol_domain::value_objects::trade_record::TradeRecord;

pub const REQUIRED_COLUMNS: [&str; 4] = ["SECID", "TRADETIME", "PRICE", "QUANTITY"];

#[derive(Debug, Deserialize)]
struct TradeRow {
    #[serde(rename = "SECID")]
    secid: String,
    #[serde(rename = "TRADETIME")]
    trade_time: String,
    #[serde(rename = "PRICE")]
    price: f64,
    #[serde(rename = "QUANTITY")]
    quantity: i64,
}

/// Reads one comma-separated trade log per ticker from a directory.
#[derive(Debug, Default, Clone)]
pub struct FilesystemTradeSource {
    extension: Option<String>,
}

impl FilesystemTradeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only list files with this extension (case-insensitive, without the dot).
    pub fn with_extension(extension: Option<String>) -> Self {
        Self {
            extension: extension
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty()),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with('.'));
        if hidden || !path.is_file() {
            return false;
        }
        match &self.extension {
            None => true,
            Some(wanted) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted)),
        }
    }
}

fn record_read_metrics<T>(start: Instant, result: &Result<T, VolatilityError>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "tradevol.infra.trade_files.read.calls_total",
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("tradevol.infra.trade_files.read_ms", "result" => result_label)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}

fn map_csv_error(path: &Path, err: csv::Error) -> VolatilityError {
    let line = err.position().map(|pos| pos.line()).unwrap_or(0);
    if err.is_io_error() {
        VolatilityError::io(path, err)
    } else {
        VolatilityError::parse(path, line, err.to_string())
    }
}

fn read_trade_csv(path: &Path) -> Result<Vec<TradeRecord>, VolatilityError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| VolatilityError::io(path, err))?;

    let headers = reader
        .headers()
        .map_err(|err| map_csv_error(path, err))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        return Err(VolatilityError::parse(
            path,
            1,
            format!("missing column(s) {}", missing.join(", ")),
        ));
    }

    let mut records = Vec::new();
    let mut raw = csv::StringRecord::new();
    while reader
        .read_record(&mut raw)
        .map_err(|err| map_csv_error(path, err))?
    {
        let line = raw.position().map(|pos| pos.line()).unwrap_or(0);
        let row: TradeRow = raw
            .deserialize(Some(&headers))
            .map_err(|err| VolatilityError::parse(path, line, err.to_string()))?;

        if !row.price.is_finite() || row.price < 0.0 {
            return Err(VolatilityError::parse(
                path,
                line,
                format!("invalid price {}", row.price),
            ));
        }
        if let Some(first) = records.first().map(|r: &TradeRecord| r.ticker.as_str()) {
            if first != row.secid {
                tracing::warn!(
                    file = %path.display(),
                    line,
                    expected = first,
                    found = %row.secid,
                    "trade row belongs to a different ticker"
                );
            }
        }

        records.push(TradeRecord {
            ticker: row.secid,
            time: row.trade_time,
            price: row.price,
            quantity: row.quantity,
        });
    }

    Ok(records)
}

impl TradeSource for FilesystemTradeSource {
    fn list_ticker_files(&self, dir: &Path) -> Result<Vec<TickerFile>, VolatilityError> {
        let entries = fs::read_dir(dir).map_err(|err| VolatilityError::io(dir, err))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| VolatilityError::io(dir, err))?;
            let path = entry.path();
            if self.accepts(&path) {
                files.push(TickerFile::new(path));
            }
        }
        files.sort();

        tracing::info!(dir = %dir.display(), files = files.len(), "listed trade files");
        Ok(files)
    }

    fn read_records(&self, file: &TickerFile) -> Result<Vec<TradeRecord>, VolatilityError> {
        let start = Instant::now();
        let result = read_trade_csv(&file.path);
        record_read_metrics(start, &result);
        if let Ok(records) = &result {
            tracing::debug!(file = %file.path.display(), rows = records.len(), "read trade file");
        }
        result
    }
}
