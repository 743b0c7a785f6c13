//! Historical volatility estimation from intraday closes.
//!
//! Annualized sample standard deviation of log returns over a trailing
//! window. The scale factor is sqrt(periods per year) for the bar
//! granularity of the input series, e.g. 15m bars on a 6.5h session:
//! 26 bars/day * 252 trading days = 6552 periods/year.

/// Rolling log-return volatility estimator.
#[derive(Debug, Clone)]
pub struct VolatilityEstimator {
    /// Number of log returns in the trailing window.
    pub window: usize,
    /// Bar periods per trading year, for annualization.
    pub periods_per_year: f64,
    /// Estimate used when the window is short or the result is undefined.
    pub fallback: f64,
}

impl VolatilityEstimator {
    pub fn new(window: usize, periods_per_year: f64, fallback: f64) -> Self {
        Self {
            window,
            periods_per_year,
            fallback,
        }
    }

    /// Annualized volatility over the trailing window of `closes`.
    ///
    /// Needs `window + 1` prices for `window` returns; with less history,
    /// or when the computation degenerates (non-positive prices produce
    /// non-finite log returns), the configured fallback is returned.
    pub fn estimate(&self, closes: &[f64]) -> f64 {
        if self.window < 2 || closes.len() < self.window + 1 {
            return self.fallback;
        }

        let tail = &closes[closes.len() - (self.window + 1)..];
        let returns: Vec<f64> = tail.windows(2).map(|w| (w[1] / w[0]).ln()).collect();

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let vol = variance.sqrt() * self.periods_per_year.sqrt();

        if vol.is_finite() {
            vol
        } else {
            self.fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fallback_on_short_history() {
        let est = VolatilityEstimator::new(20, 6552.0, 0.20);
        assert_eq!(est.estimate(&[]), 0.20);
        assert_eq!(est.estimate(&vec![100.0; 20]), 0.20); // 20 prices = 19 returns
    }

    #[test]
    fn test_known_sample_std() {
        // Two returns of 0.01 and 0.03: sample std = sqrt(2e-4) = 0.0141421...
        let est = VolatilityEstimator::new(2, 1.0, 0.20);
        let closes = [100.0, 100.0 * 0.01f64.exp(), 100.0 * 0.04f64.exp()];
        assert_relative_eq!(est.estimate(&closes), 0.014142135623, epsilon = 1e-9);
    }

    #[test]
    fn test_annualization_scale() {
        let base = VolatilityEstimator::new(2, 1.0, 0.20);
        let scaled = VolatilityEstimator::new(2, 6552.0, 0.20);
        let closes = [100.0, 101.0, 100.2, 101.5];
        assert_relative_eq!(
            scaled.estimate(&closes),
            base.estimate(&closes) * 6552.0f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_constant_prices_give_zero() {
        // Zero variance is a defined (if degenerate) estimate; the engine
        // clamps it to its volatility floor.
        let est = VolatilityEstimator::new(3, 6552.0, 0.20);
        assert_eq!(est.estimate(&[50.0, 50.0, 50.0, 50.0]), 0.0);
    }

    #[test]
    fn test_fallback_on_non_positive_prices() {
        let est = VolatilityEstimator::new(2, 6552.0, 0.20);
        assert_eq!(est.estimate(&[100.0, 0.0, 100.0]), 0.20);
    }
}
