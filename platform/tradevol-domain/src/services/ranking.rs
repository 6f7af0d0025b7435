use crate::error::VolatilityError;
use crate::value_objects::ticker_volatility::TickerVolatility;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    /// Largest first.
    pub most_volatile: Vec<TickerVolatility>,
    /// Smallest first.
    pub least_volatile: Vec<TickerVolatility>,
    /// Sorted by name.
    pub zero_volatility: Vec<String>,
}

/// Ascending by volatility, ties broken by ticker name.
pub fn compare_volatility(a: &TickerVolatility, b: &TickerVolatility) -> Ordering {
    a.volatility
        .total_cmp(&b.volatility)
        .then_with(|| a.ticker.cmp(&b.ticker))
}

pub fn rank(
    mut non_zero: Vec<TickerVolatility>,
    mut zero: Vec<String>,
    top_n: usize,
) -> Result<Ranking, VolatilityError> {
    if top_n == 0 {
        return Err(VolatilityError::Config("top_n must be >= 1".to_string()));
    }
    if non_zero.len() < top_n {
        return Err(VolatilityError::InsufficientData(format!(
            "need at least {top_n} tickers with non-zero volatility, found {} ({} with zero volatility)",
            non_zero.len(),
            zero.len()
        )));
    }

    non_zero.sort_by(compare_volatility);
    zero.sort();

    let least_volatile = non_zero[..top_n].to_vec();
    let most_volatile = non_zero[non_zero.len() - top_n..]
        .iter()
        .rev()
        .cloned()
        .collect();

    Ok(Ranking {
        most_volatile,
        least_volatile,
        zero_volatility: zero,
    })
}
