pub mod ticker_volatility;
pub mod trade_record;
