mod obs;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tradevol_application::config::{load_config, Config, ConfigOverrides, ReportFormat};
use tradevol_application::reporting::write_report;
use tradevol_application::volatility_report::run_volatility_report;
use tradevol_domain::error::VolatilityError;
use tradevol_infrastructure::trade_files::FilesystemTradeSource;

#[derive(Parser, Debug)]
#[command(name = "tradevol")]
#[command(about = "Ranks tickers by trade price volatility.", version)]
#[command(
    after_help = "Examples:\n  tradevol\n  tradevol --trades-dir data/trades --top-n 5\n  tradevol --config tradevol.toml --format json\n"
)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env TRADEVOL_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding one trade log per ticker (default: trades).
    #[arg(long)]
    trades_dir: Option<PathBuf>,

    /// Worker threads; 0 uses available parallelism.
    #[arg(long)]
    parallelism: Option<usize>,

    /// Give up waiting for results after this many milliseconds; 0 waits forever.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Tickers listed in the maximum and minimum sections (default: 3).
    #[arg(long)]
    top_n: Option<usize>,

    /// Report output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Log line format on stderr: text | json.
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Prometheus metrics listen addr (e.g. 127.0.0.1:9898). Falls back to env TRADEVOL_METRICS_ADDR.
    #[arg(long)]
    metrics_addr: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    let metrics_addr = obs::metrics_addr_from_env(cli.metrics_addr.clone());
    if let Err(err) = obs::init_metrics(metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(cli) {
        tracing::error!(error = %err, "run failed");
        eprintln!("error: {err}");
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<(), VolatilityError> {
    let config_path = cli.config.or_else(|| {
        std::env::var("TRADEVOL_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    let mut config = match config_path {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };

    config.apply_overrides(ConfigOverrides {
        trades_dir: cli.trades_dir,
        parallelism: cli.parallelism,
        timeout_ms: cli.timeout_ms,
        top_n: cli.top_n,
        format: cli.format.map(|format| match format {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }),
    });

    let source = Arc::new(FilesystemTradeSource::with_extension(
        config.input.extension.clone(),
    ));
    let report = run_volatility_report(&config, source)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &report, config.report.format)
}

fn exit_code(err: &VolatilityError) -> i32 {
    if err.is_insufficient_data() {
        2
    } else {
        1
    }
}
