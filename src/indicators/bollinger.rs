/// Bollinger Bands at a single index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands for every index
///
/// Middle band is the SMA over `period` closes, upper/lower are
/// `middle ± multiplier * stddev` with the population standard deviation
/// (divides by N). The first `period - 1` indices are `None`.
pub fn calculate_bollinger_series(
    prices: &[f64],
    period: usize,
    multiplier: f64,
) -> Vec<Option<BollingerBands>> {
    let mut out = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        if period == 0 || i + 1 < period {
            out.push(None);
            continue;
        }

        let window = &prices[i + 1 - period..=i];
        let middle = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|p| {
                let diff = p - middle;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        out.push(Some(BollingerBands {
            upper: middle + multiplier * stddev,
            middle,
            lower: middle - multiplier * stddev,
        }));
    }

    out
}
