//! Black-Scholes pricing and Greeks for single options.
//!
//! A deliberately simple closed-form model: flat risk-free rate, no
//! dividend yield, volatility supplied by the caller. At or past expiry
//! (`time <= 0`) prices collapse to intrinsic value and Greeks to zero,
//! which is the settlement path for same-day expiries.

use std::f64::consts::PI;

use statrs::distribution::{ContinuousCDF, Normal};

use crate::data::{Greeks, OptionType};

/// Black-Scholes calculator for options pricing and Greeks.
#[derive(Debug, Clone)]
pub struct BlackScholes {
    /// Risk-free interest rate (annualized).
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self { rate: 0.045 }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Calculate d1 parameter.
    fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time;
        numerator / (vol * time.sqrt())
    }

    /// Calculate d2 parameter.
    fn d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        self.d1(spot, strike, time, vol) - vol * time.sqrt()
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        let normal = Normal::new(0.0, 1.0).unwrap();
        normal.cdf(x)
    }

    /// Standard normal PDF.
    fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// Calculate call option price.
    pub fn call_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= 0.0 {
            return (spot - strike).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        spot * Self::norm_cdf(d1) - strike * (-self.rate * time).exp() * Self::norm_cdf(d2)
    }

    /// Calculate put option price.
    pub fn put_price(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= 0.0 {
            return (strike - spot).max(0.0);
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);

        strike * (-self.rate * time).exp() * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1)
    }

    /// Calculate option price based on type.
    ///
    /// Callers must guarantee `spot > 0` and `vol > 0` when `time > 0`,
    /// or rely on the `time <= 0` intrinsic-value fallback.
    pub fn price(&self, spot: f64, strike: f64, time: f64, vol: f64, opt_type: OptionType) -> f64 {
        match opt_type {
            OptionType::Call => self.call_price(spot, strike, time, vol),
            OptionType::Put => self.put_price(spot, strike, time, vol),
        }
    }

    /// Calculate delta, gamma, daily theta and vega in one pass.
    ///
    /// Returns all zeros at or past expiry.
    pub fn greeks(&self, spot: f64, strike: f64, time: f64, vol: f64, opt_type: OptionType) -> Greeks {
        if time <= 0.0 {
            return Greeks::default();
        }

        let d1 = self.d1(spot, strike, time, vol);
        let d2 = self.d2(spot, strike, time, vol);
        let pdf_d1 = Self::norm_pdf(d1);
        let discount = (-self.rate * time).exp();

        let decay = -spot * pdf_d1 * vol / (2.0 * time.sqrt());

        let (delta, theta_annual) = match opt_type {
            OptionType::Call => (
                Self::norm_cdf(d1),
                decay - self.rate * strike * discount * Self::norm_cdf(d2),
            ),
            OptionType::Put => (
                Self::norm_cdf(d1) - 1.0,
                decay + self.rate * strike * discount * Self::norm_cdf(-d2),
            ),
        };

        Greeks {
            delta,
            gamma: pdf_d1 / (spot * vol * time.sqrt()),
            // Daily theta
            theta: theta_annual / 365.0,
            // Vega per 1% move in vol
            vega: spot * time.sqrt() * pdf_d1 / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intrinsic_value_at_expiry() {
        let bs = BlackScholes::default();
        assert_eq!(bs.price(105.0, 100.0, 0.0, 0.2, OptionType::Call), 5.0);
        assert_eq!(bs.price(95.0, 100.0, 0.0, 0.2, OptionType::Call), 0.0);
        assert_eq!(bs.price(95.0, 100.0, 0.0, 0.2, OptionType::Put), 5.0);
        assert_eq!(bs.price(105.0, 100.0, -0.01, 0.2, OptionType::Put), 0.0);
    }

    #[test]
    fn test_atm_call_price_range() {
        let bs = BlackScholes::new(0.05);
        // S=100, K=100, T=1, vol=0.20 -> ~10.45 for ATM call
        let price = bs.call_price(100.0, 100.0, 1.0, 0.20);
        assert!(price > 9.0 && price < 12.0);
    }

    #[test]
    fn test_put_call_parity() {
        let bs = BlackScholes::new(0.05);
        let (spot, strike, time, vol) = (100.0, 100.0, 1.0, 0.20);

        let call = bs.call_price(spot, strike, time, vol);
        let put = bs.put_price(spot, strike, time, vol);

        // C - P = S - K*e^(-rT)
        let parity_rhs = spot - strike * (-bs.rate * time).exp();
        assert_relative_eq!(call - put, parity_rhs, epsilon = 0.01);
    }

    #[test]
    fn test_greeks_bounds() {
        let bs = BlackScholes::default();
        let call = bs.greeks(100.0, 100.0, 0.5, 0.25, OptionType::Call);
        let put = bs.greeks(100.0, 100.0, 0.5, 0.25, OptionType::Put);

        assert!(call.delta > 0.0 && call.delta < 1.0);
        assert!(put.delta > -1.0 && put.delta < 0.0);
        assert!(call.gamma > 0.0);
        assert!(call.vega > 0.0);
        // ATM call loses value as time passes
        assert!(call.theta < 0.0);
        // Delta parity for no dividend: call - put = 1
        assert_relative_eq!(call.delta - put.delta, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_greeks_zero_at_expiry() {
        let bs = BlackScholes::default();
        let g = bs.greeks(100.0, 100.0, 0.0, 0.25, OptionType::Call);
        assert_eq!(g.delta, 0.0);
        assert_eq!(g.gamma, 0.0);
        assert_eq!(g.theta, 0.0);
        assert_eq!(g.vega, 0.0);
    }
}
