use crate::error::VolatilityError;
use crate::value_objects::trade_record::TradeRecord;
use std::path::{Path, PathBuf};

/// Handle to one per-ticker trade log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TickerFile {
    pub path: PathBuf,
}

impl TickerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name used in diagnostics; the ticker itself comes from the records.
    pub fn label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub trait TradeSource {
    fn list_ticker_files(&self, dir: &Path) -> Result<Vec<TickerFile>, VolatilityError>;

    /// Records in file order, header excluded.
    fn read_records(&self, file: &TickerFile) -> Result<Vec<TradeRecord>, VolatilityError>;
}
