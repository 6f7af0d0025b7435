pub mod aggregation;
pub mod config;
pub mod reporting;
pub mod volatility_report;
