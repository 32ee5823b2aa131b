/// Calculate Simple Moving Average (SMA) over the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// SMA at every index of `prices`, `None` until `period` samples exist
pub fn calculate_sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| calculate_sma(&prices[..=i], period))
        .collect()
}

/// Exponential moving average at every index, unmasked.
///
/// Uses `alpha = 2 / (period + 1)` and seeds the recursion with the first
/// sample (no SMA seed), so `ema[0] == values[0]`. Callers decide from which
/// index the value counts as warmed up.
pub fn calculate_ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());

    let mut ema = match values.first() {
        Some(&first) => first,
        None => return out,
    };
    out.push(ema);

    for value in &values[1..] {
        ema = alpha * value + (1.0 - alpha) * ema;
        out.push(ema);
    }

    out
}
