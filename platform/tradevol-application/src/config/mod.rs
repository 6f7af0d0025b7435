use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tradevol_domain::error::VolatilityError;
use tradevol_domain::services::ranking::DEFAULT_TOP_N;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = VolatilityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(VolatilityError::Config(format!(
                "unknown report format `{other}` (expected text or json)"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub input: InputConfig,
    pub aggregation: AggregationConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct InputConfig {
    pub trades_dir: PathBuf,
    pub extension: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            trades_dir: PathBuf::from("trades"),
            extension: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct AggregationConfig {
    /// Worker threads; 0 means available parallelism.
    pub parallelism: usize,
    /// Upper bound on the wait for worker results; 0 means no bound.
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ReportConfig {
    pub top_n: usize,
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            format: ReportFormat::Text,
        }
    }
}

/// Values given on the command line; each one that is set wins over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub trades_dir: Option<PathBuf>,
    pub parallelism: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub top_n: Option<usize>,
    pub format: Option<ReportFormat>,
}

impl Config {
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.trades_dir {
            self.input.trades_dir = dir;
        }
        if let Some(parallelism) = overrides.parallelism {
            self.aggregation.parallelism = parallelism;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.aggregation.timeout_ms = timeout_ms;
        }
        if let Some(top_n) = overrides.top_n {
            self.report.top_n = top_n;
        }
        if let Some(format) = overrides.format {
            self.report.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), VolatilityError> {
        if self.report.top_n == 0 {
            return Err(VolatilityError::Config("report.top_n must be >= 1".to_string()));
        }
        if self.input.trades_dir.as_os_str().is_empty() {
            return Err(VolatilityError::Config(
                "input.trades_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolved_parallelism(&self) -> usize {
        match self.aggregation.parallelism {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.aggregation.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, VolatilityError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        VolatilityError::Config(format!("failed to read config {}: {err}", path.display()))
    })?;
    parse_config(&contents)
        .map_err(|err| VolatilityError::Config(format!("{} ({})", err, path.display())))
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    toml::from_str(contents).map_err(|err| format!("failed to parse TOML: {err}"))
}
