use crate::models::Candle;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 2024-01-01T00:00:00Z; generated series start here so a seed fully
/// determines the output
const SERIES_START_SECS: i64 = 1_704_067_200;

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+2% daily average)
    Uptrend,
    /// Steady downtrend with noise (-2% daily average)
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
    /// Slow grind up, then a 40% collapse
    Crash,
    /// Climb broken by repeated sell-offs that end in a stop-out or a squeeze
    DipRecovery,
}

/// Generates synthetic price data for backtesting
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 0.10,
            base_volume: 1_000_000.0,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Generate candles for a specific market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_candles` - Number of candles to generate (the strategy needs 200+ to act)
    /// * `interval_minutes` - Minutes between candles
    ///
    /// # Returns
    /// Vec of candles with timestamps, prices, and volume
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> Vec<Candle> {
        let start_time = DateTime::<Utc>::from_timestamp(SERIES_START_SECS, 0).unwrap_or_default();

        let closes = match scenario {
            MarketScenario::Uptrend => self.trend_path(num_candles, interval_minutes, 0.02),
            MarketScenario::Downtrend => self.trend_path(num_candles, interval_minutes, -0.02),
            MarketScenario::Sideways => self.sideways_path(num_candles),
            MarketScenario::Volatile => self.volatile_path(num_candles),
            MarketScenario::Crash => self.crash_path(num_candles),
            MarketScenario::DipRecovery => self.dip_recovery_path(num_candles),
        };

        closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| {
                let timestamp = start_time + Duration::minutes(i as i64 * interval_minutes);
                self.create_candle(close, timestamp)
            })
            .collect()
    }

    /// Drift of `daily_drift` per day plus ±0.1% noise
    fn trend_path(
        &mut self,
        num_candles: usize,
        interval_minutes: i64,
        daily_drift: f64,
    ) -> Vec<f64> {
        let mut current_price = self.base_price;
        let drift_per_interval = daily_drift / (24.0 * 60.0 / interval_minutes.max(1) as f64);

        (0..num_candles)
            .map(|_| {
                // Reduced noise so trend is dominant
                let drift = current_price * drift_per_interval;
                let noise = current_price * self.rng.gen_range(-0.001..0.001);
                current_price += drift + noise;
                current_price
            })
            .collect()
    }

    /// Mean-reverting random walk
    fn sideways_path(&mut self, num_candles: usize) -> Vec<f64> {
        let mut current_price = self.base_price;
        let mean_price = self.base_price;

        (0..num_candles)
            .map(|_| {
                let reversion = (mean_price - current_price) * 0.1; // 10% pull to mean
                let noise = current_price * self.rng.gen_range(-0.01..0.01);
                current_price += reversion + noise;
                current_price
            })
            .collect()
    }

    fn volatile_path(&mut self, num_candles: usize) -> Vec<f64> {
        let mut current_price = self.base_price;
        let floor = self.base_price * 0.5;

        (0..num_candles)
            .map(|_| {
                let change = current_price * self.rng.gen_range(-0.05..0.05);
                current_price = (current_price + change).max(floor);
                current_price
            })
            .collect()
    }

    /// First 70%: slight uptrend. Remainder: -40% with noise
    fn crash_path(&mut self, num_candles: usize) -> Vec<f64> {
        let mut current_price = self.base_price;
        let crash_start = num_candles * 7 / 10;
        let crash_len = (num_candles - crash_start).max(1) as f64;
        let drop_rate = 1.0 - 0.6_f64.powf(1.0 / crash_len);

        (0..num_candles)
            .map(|i| {
                if i < crash_start {
                    current_price += current_price * self.rng.gen_range(-0.004..0.005);
                } else {
                    let noise = current_price * self.rng.gen_range(-0.003..0.003);
                    current_price += noise - current_price * drop_rate;
                }
                current_price
            })
            .collect()
    }

    /// Scripted sell-offs on a +0.5% per candle climb; only intrabar noise
    /// and volume depend on the seed.
    ///
    /// After 240 climbing candles, every 182-candle cycle slides 2% a candle
    /// for 10 candles, bleeds 0.05% a candle for 20 more and capitulates
    /// with one last 2% candle. The next candle either loses 15% (even
    /// cycles) or squeezes 110% (odd cycles), then the climb resumes.
    fn dip_recovery_path(&self, num_candles: usize) -> Vec<f64> {
        const CLIMB: usize = 240;
        const CYCLE: usize = 182;

        let mut current_price = self.base_price;

        (0..num_candles)
            .map(|i| {
                let factor = if i == 0 {
                    1.0
                } else if i < CLIMB {
                    1.005
                } else {
                    let cycle = (i - CLIMB) / CYCLE;
                    match (i - CLIMB) % CYCLE {
                        0..=9 => 0.98,
                        10..=29 => 0.9995,
                        30 => 0.98,
                        31 if cycle % 2 == 0 => 0.85,
                        31 => 2.1,
                        _ => 1.005,
                    }
                };
                current_price *= factor;
                current_price
            })
            .collect()
    }

    /// Build a realistic OHLC bar around `price`
    fn create_candle(&mut self, price: f64, timestamp: DateTime<Utc>) -> Candle {
        let noise_pct = 0.002; // ±0.2% intrabar movement

        let high = price * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = price * (1.0 - self.rng.gen_range(0.0..noise_pct));

        let open_raw = price * (1.0 + self.rng.gen_range(-noise_pct..noise_pct));
        let open = open_raw.clamp(low, high);

        // Vary volume ±30%
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Candle {
            timestamp,
            open,
            high,
            low,
            close: price,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 500, 5);

        assert_eq!(candles.len(), 500);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;

        assert!(
            last_price > first_price,
            "Uptrend should end higher: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Downtrend, 500, 5);

        assert_eq!(candles.len(), 500);

        let first_price = candles.first().unwrap().close;
        let last_price = candles.last().unwrap().close;

        assert!(
            last_price < first_price,
            "Downtrend should end lower: {} -> {}",
            first_price,
            last_price
        );
    }

    #[test]
    fn test_generate_sideways() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Sideways, 500, 5);

        assert_eq!(candles.len(), 500);

        // Should stay roughly around base price (±10%)
        let base = gen.base_price;
        for candle in &candles {
            assert!(
                candle.close > base * 0.9 && candle.close < base * 1.1,
                "Sideways should stay near base: {} vs {}",
                candle.close,
                base
            );
        }
    }

    #[test]
    fn test_generate_crash() {
        let mut gen = SyntheticDataGenerator::new(7);
        let candles = gen.generate(MarketScenario::Crash, 400, 5);

        let peak = candles.iter().map(|c| c.close).fold(f64::MIN, f64::max);
        let last = candles.last().unwrap().close;

        assert!(
            last < peak * 0.7,
            "Crash should lose >30% from peak: {} -> {}",
            peak,
            last
        );
    }

    #[test]
    fn test_generate_dip_recovery_has_dips() {
        let a = SyntheticDataGenerator::new(7).generate(MarketScenario::DipRecovery, 500, 5);
        let b = SyntheticDataGenerator::new(8).generate(MarketScenario::DipRecovery, 500, 5);

        // Closes are scripted, only the intrabar noise differs
        let closes = |c: &[Candle]| c.iter().map(|c| c.close).collect::<Vec<_>>();
        assert_eq!(closes(&a), closes(&b));
        assert_ne!(a, b);

        // First sell-off bottoms at 270 and breaks down, the second squeezes
        assert!(a[270].close < a[239].close * 0.8);
        assert!((a[271].close / a[270].close - 0.85).abs() < 1e-9);
        assert!((a[453].close / a[452].close - 2.1).abs() < 1e-9);
        assert!(a[451].close > a[452].close);
    }

    #[test]
    fn test_same_seed_same_series() {
        let a = SyntheticDataGenerator::new(11).generate(MarketScenario::Volatile, 50, 5);
        let b = SyntheticDataGenerator::new(11).generate(MarketScenario::Volatile, 50, 5);
        let c = SyntheticDataGenerator::new(12).generate(MarketScenario::Volatile, 50, 5);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_timestamps_are_sequential() {
        let mut gen = SyntheticDataGenerator::new(42);
        let candles = gen.generate(MarketScenario::Uptrend, 100, 5);

        for i in 1..candles.len() {
            assert_eq!(
                (candles[i].timestamp - candles[i - 1].timestamp).num_minutes(),
                5,
                "Timestamps should be evenly spaced"
            );
        }
    }

    #[test]
    fn test_ohlc_consistency() {
        let mut gen = SyntheticDataGenerator::new(42);

        let scenarios = [
            MarketScenario::Uptrend,
            MarketScenario::Volatile,
            MarketScenario::DipRecovery,
        ];
        for scenario in scenarios {
            for candle in gen.generate(scenario, 100, 5) {
                assert!(candle.high >= candle.close, "High should be >= close");
                assert!(candle.high >= candle.open, "High should be >= open");
                assert!(candle.low <= candle.close, "Low should be <= close");
                assert!(candle.low <= candle.open, "Low should be <= open");
            }
        }
    }
}
