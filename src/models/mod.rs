pub mod black_scholes;

use crate::state::OptionType;

/// All theoretical pricing models implement this trait.
/// price() must be a pure function: deterministic output from inputs only.
/// Send + Sync required so a model can live in shared handler state.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Theoretical value of one unit of the option. Never panics.
    fn price(&self, params: &ModelParams, option_type: OptionType) -> f64;
}

// ── Precomputed model parameters (stack, no alloc) ──

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ModelParams {
    pub spot: f64,
    pub strike: f64,
    pub ttl_years: f64,
    pub rate: f64,
    // Precomputed
    pub ln_s_k: f64,
    pub sigma_sqrt_t: f64,
    pub half_sigma_sq: f64,
    pub discount: f64,
}

impl ModelParams {
    #[inline]
    pub fn new(spot: f64, strike: f64, ttl_years: f64, sigma: f64, rate: f64) -> Self {
        let ttl = ttl_years.max(0.0);
        let ln_s_k = (spot / strike).ln();
        let sigma_sqrt_t = sigma * ttl.sqrt();
        let half_sigma_sq = 0.5 * sigma * sigma;
        let discount = (-rate * ttl).exp();
        Self {
            spot,
            strike,
            ttl_years: ttl,
            rate,
            ln_s_k,
            sigma_sqrt_t,
            half_sigma_sq,
            discount,
        }
    }
}
