use serde::Serialize;

/// Result of scanning one ticker's full trade stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerVolatility {
    pub ticker: String,
    /// Percent, rounded to 3 decimals. Exactly `0.0` when every trade had the same price.
    pub volatility: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub trades: usize,
}

impl TickerVolatility {
    /// True when every observed price was identical.
    ///
    /// Decided on the raw price range rather than on the rounded percentage, so a
    /// tiny spread that rounds to `0.000` still counts as non-zero.
    pub fn is_zero(&self) -> bool {
        self.max_price == self.min_price
    }
}
