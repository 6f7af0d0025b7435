/// One executed trade as it appears in a per-ticker trade log.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub ticker: String,
    /// Trade time, kept exactly as written in the source file.
    pub time: String,
    pub price: f64,
    pub quantity: i64,
}

impl TradeRecord {
    pub fn new(ticker: impl Into<String>, time: impl Into<String>, price: f64, quantity: i64) -> Self {
        Self {
            ticker: ticker.into(),
            time: time.into(),
            price,
            quantity,
        }
    }
}
