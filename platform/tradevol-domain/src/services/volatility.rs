use crate::error::VolatilityError;
use crate::value_objects::ticker_volatility::TickerVolatility;
use crate::value_objects::trade_record::TradeRecord;

pub const VOLATILITY_DECIMALS: i32 = 3;

/// Running price range of a single ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub observations: usize,
}

impl PriceRange {
    pub fn new(first_price: f64) -> Self {
        Self {
            min: first_price,
            max: first_price,
            observations: 1,
        }
    }

    pub fn update(&mut self, price: f64) {
        if price > self.max {
            self.max = price;
        }
        if price < self.min {
            self.min = price;
        }
        self.observations += 1;
    }

    pub fn average(&self) -> f64 {
        (self.max + self.min) / 2.0
    }

    /// `(max - min) / average * 100`, rounded. Zero for a flat range.
    pub fn volatility_pct(&self) -> f64 {
        if self.max == self.min {
            return 0.0;
        }
        round_to(
            (self.max - self.min) / self.average() * 100.0,
            VOLATILITY_DECIMALS,
        )
    }
}

/// Consumes one ticker's trades in order and yields its volatility once the
/// stream is exhausted.
#[derive(Debug, Default)]
pub struct VolatilityComputer {
    ticker: Option<String>,
    range: Option<PriceRange>,
}

impl VolatilityComputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &TradeRecord) {
        match self.range.as_mut() {
            Some(range) => range.update(record.price),
            None => {
                self.ticker = Some(record.ticker.clone());
                self.range = Some(PriceRange::new(record.price));
            }
        }
    }

    /// `source` names the trade file in the error raised for an empty stream.
    pub fn finish(self, source: &str) -> Result<TickerVolatility, VolatilityError> {
        let (Some(ticker), Some(range)) = (self.ticker, self.range) else {
            return Err(VolatilityError::InsufficientData(format!(
                "{source} has no trade rows"
            )));
        };

        Ok(TickerVolatility {
            ticker,
            volatility: range.volatility_pct(),
            min_price: range.min,
            max_price: range.max,
            trades: range.observations,
        })
    }
}

pub fn compute_volatility(
    source: &str,
    records: &[TradeRecord],
) -> Result<TickerVolatility, VolatilityError> {
    let mut computer = VolatilityComputer::new();
    for record in records {
        computer.observe(record);
    }
    computer.finish(source)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
