use crate::models::Candle;

/// Calculate the stochastic oscillator %K for every index
///
/// `100 * (close - lowest_low) / (highest_high - lowest_low)` over the last
/// `period` candles. Undefined during warm-up and when the window has no
/// range at all.
pub fn calculate_stochastic_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    (0..candles.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }

            let window = &candles[i + 1 - period..=i];
            let highest = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let range = highest - lowest;

            if range <= 0.0 {
                return None;
            }

            Some(100.0 * (candles[i].close - lowest) / range)
        })
        .collect()
}
