use crate::config::ReportFormat;
use crate::volatility_report::VolatilityReport;
use std::fmt::Write as _;
use std::io::Write;
use tradevol_domain::error::VolatilityError;
use tradevol_domain::services::ranking::Ranking;
use tradevol_domain::value_objects::ticker_volatility::TickerVolatility;

const INDENT: &str = "    ";

fn push_entries(out: &mut String, entries: &[TickerVolatility]) {
    for entry in entries {
        let _ = writeln!(out, "{INDENT}{} - {:.2} %", entry.ticker, entry.volatility);
    }
}

pub fn render_text(ranking: &Ranking) -> String {
    let mut out = String::new();
    out.push_str("Maximum volatility:\n");
    push_entries(&mut out, &ranking.most_volatile);
    out.push_str("Minimum volatility:\n");
    push_entries(&mut out, &ranking.least_volatile);
    out.push_str("Zero volatility:\n");
    if ranking.zero_volatility.is_empty() {
        let _ = writeln!(out, "{INDENT}none");
    } else {
        let _ = writeln!(out, "{INDENT}{}", ranking.zero_volatility.join(", "));
    }
    out
}

pub fn render_json(report: &VolatilityReport) -> Result<String, VolatilityError> {
    serde_json::to_string_pretty(report)
        .map(|mut json| {
            json.push('\n');
            json
        })
        .map_err(|err| VolatilityError::Render(err.to_string()))
}

pub fn render(report: &VolatilityReport, format: ReportFormat) -> Result<String, VolatilityError> {
    match format {
        ReportFormat::Text => Ok(render_text(&report.ranking)),
        ReportFormat::Json => render_json(report),
    }
}

/// Renders fully before the first byte is written.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &VolatilityReport,
    format: ReportFormat,
) -> Result<(), VolatilityError> {
    let rendered = render(report, format)?;
    out.write_all(rendered.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|err| VolatilityError::io("<stdout>", err))
}
