use super::moving_average::calculate_ema_series;

/// MACD line and its signal line at a single index
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MacdValue {
    pub line: Option<f64>,
    pub signal: Option<f64>,
}

/// Calculate MACD (fast EMA - slow EMA) and its signal EMA for every index
///
/// Both EMAs run from the first close; the line is defined from index
/// `slow - 1`. The signal EMA is seeded with the first defined line value
/// and is defined once `signal_period` line values exist.
pub fn calculate_macd_series(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<MacdValue> {
    let n = prices.len();
    let mut out = vec![MacdValue::default(); n];

    let line_start = slow.max(fast).saturating_sub(1);
    if fast == 0 || slow == 0 || signal_period == 0 || n <= line_start {
        return out;
    }

    let ema_fast = calculate_ema_series(prices, fast);
    let ema_slow = calculate_ema_series(prices, slow);

    let line: Vec<f64> = (line_start..n).map(|i| ema_fast[i] - ema_slow[i]).collect();
    let signal = calculate_ema_series(&line, signal_period);

    for (offset, (value, sig)) in line.iter().zip(signal.iter()).enumerate() {
        let slot = &mut out[line_start + offset];
        slot.line = Some(*value);
        if offset + 1 >= signal_period {
            slot.signal = Some(*sig);
        }
    }

    out
}
