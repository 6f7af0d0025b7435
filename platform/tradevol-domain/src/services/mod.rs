pub mod ranking;
pub mod volatility;
