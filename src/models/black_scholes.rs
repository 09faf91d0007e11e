use crate::models::{ModelParams, PricingModel};
use crate::state::OptionType;
use statrs::distribution::{ContinuousCDF, Normal};

/// Black-Scholes European option pricing (no dividends).
///
/// C = S*Phi(d1) - K*e^{-rT}*Phi(d2)
/// P = K*e^{-rT}*Phi(-d2) - S*Phi(-d1)
///
/// where d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// and   d2 = d1 - sigma * sqrt(T).
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        Self {
            normal: Normal::standard(),
        }
    }

    /// Returns (d1, d2). Caller guarantees sigma_sqrt_t > 0.
    #[inline]
    fn d1_d2(params: &ModelParams) -> (f64, f64) {
        let d1 = (params.ln_s_k + (params.rate + params.half_sigma_sq) * params.ttl_years)
            / params.sigma_sqrt_t;
        (d1, d1 - params.sigma_sqrt_t)
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn intrinsic(option_type: OptionType, spot: f64, strike: f64) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

impl PricingModel for BlackScholes {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn price(&self, params: &ModelParams, option_type: OptionType) -> f64 {
        // Expired: intrinsic only
        if params.ttl_years <= 0.0 {
            return intrinsic(option_type, params.spot, params.strike);
        }

        // Zero vol: deterministic forward, discounted intrinsic
        if params.sigma_sqrt_t < 1e-12 {
            let discounted_strike = params.strike * params.discount;
            return intrinsic(option_type, params.spot, discounted_strike);
        }

        let (d1, d2) = Self::d1_d2(params);
        let k_df = params.strike * params.discount;

        let price = match option_type {
            OptionType::Call => params.spot * self.normal.cdf(d1) - k_df * self.normal.cdf(d2),
            OptionType::Put => k_df * self.normal.cdf(-d2) - params.spot * self.normal.cdf(-d1),
        };

        // Guard tiny negative values from CDF rounding deep OTM
        price.max(0.0)
    }
}
