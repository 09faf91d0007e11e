//! T0 -> T1 repricing P&L for a single naked option.
//!
//! The option is bought (or sold) at its model price under the entry
//! scenario and closed at its model price under the exit scenario:
//!
//!   long  P&L = (exit - entry) * multiplier
//!   short P&L = (entry - exit) * multiplier
//!
//! Both prices are rounded to cents before differencing, as quoted prices are.

use crate::config::AppConfig;
use crate::errors::{PayoffError, PayoffResult};
use crate::models::{ModelParams, PricingModel};
use crate::payoff::grid::linspace;
use crate::state::{MarketScenario, OptionLeg, OptionType, Position};

/// Market inputs as entered on the dashboard, with time in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScenarioInput {
    pub spot: f64,
    pub rate: f64,
    pub volatility: f64,
    pub days_to_expiry: f64,
}

impl ScenarioInput {
    pub fn scenario(&self) -> MarketScenario {
        MarketScenario::from_days(self.spot, self.volatility, self.rate, self.days_to_expiry)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HeatmapRequest {
    pub option_type: OptionType,
    pub position: Position,
    pub strike: f64,
    pub entry: ScenarioInput,
    pub exit: ScenarioInput,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HeatmapResponse {
    pub spot_axis: Vec<f64>,
    pub strike_axis: Vec<f64>,
    /// cells[i][j]: P&L with the underlying at spot_axis[i] and strike strike_axis[j].
    pub cells: Vec<Vec<f64>>,
    pub min: f64,
    pub max: f64,
    /// P&L at the requested exit spot and strike.
    pub net_return: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub multiplier: f64,
    pub computed_at: String,
}

/// Axis layout and contract size.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapSettings {
    pub half_width: u32,
    pub steps: usize,
    pub multiplier: f64,
}

impl From<&AppConfig> for HeatmapSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            half_width: cfg.heatmap_half_width,
            steps: cfg.heatmap_steps,
            multiplier: cfg.contract_multiplier,
        }
    }
}

#[inline]
pub fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Integer axis around `center`: evenly spaced, truncated toward zero,
/// duplicates collapsed. Every point must be positive.
pub fn integer_axis(center: f64, half_width: u32, steps: usize) -> PayoffResult<Vec<f64>> {
    let hw = half_width as f64;
    let grid = linspace(center - hw, center + hw, steps)?;
    let mut axis: Vec<f64> = grid.points().iter().map(|p| p.trunc()).collect();
    axis.dedup();

    if axis.first().is_some_and(|&p| p <= 0.0) {
        return Err(PayoffError::InvalidRange(format!(
            "axis around {center} reaches non-positive prices"
        )));
    }
    Ok(axis)
}

/// Model price rounded to cents.
fn quoted_price<M: PricingModel + ?Sized>(
    model: &M,
    option_type: OptionType,
    spot: f64,
    strike: f64,
    scenario: &MarketScenario,
) -> f64 {
    let params = ModelParams::new(
        spot,
        strike,
        scenario.time_to_expiry,
        scenario.volatility,
        scenario.rate,
    );
    round_cents(model.price(&params, option_type))
}

/// P&L of opening at T0 and closing at T1 for one (spot, strike) pair.
pub fn scenario_pnl<M: PricingModel + ?Sized>(
    model: &M,
    request: &HeatmapRequest,
    exit_spot: f64,
    strike: f64,
    multiplier: f64,
) -> f64 {
    let entry = request.entry.scenario();
    let exit = request.exit.scenario();
    let entry_price = quoted_price(model, request.option_type, entry.spot, strike, &entry);
    let exit_price = quoted_price(model, request.option_type, exit_spot, strike, &exit);
    round_cents((exit_price - entry_price) * request.position.sign() * multiplier)
}

pub fn run_heatmap<M: PricingModel + ?Sized>(
    model: &M,
    settings: HeatmapSettings,
    request: &HeatmapRequest,
) -> PayoffResult<HeatmapResponse> {
    // Premium and quantity play no part here; the leg check covers the strike.
    OptionLeg::new(request.option_type, request.position, request.strike, 0.0, 1)?;
    let entry = request.entry.scenario();
    let exit = request.exit.scenario();
    entry.validate()?;
    exit.validate()?;

    let spot_axis = integer_axis(exit.spot, settings.half_width, settings.steps)?;
    let strike_axis = integer_axis(request.strike, settings.half_width, settings.steps)?;

    let cells: Vec<Vec<f64>> = spot_axis
        .iter()
        .map(|&s| {
            strike_axis
                .iter()
                .map(|&k| scenario_pnl(model, request, s, k, settings.multiplier))
                .collect()
        })
        .collect();

    let (min, max) = cells
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let net_return = scenario_pnl(model, request, exit.spot, request.strike, settings.multiplier);
    let entry_price = quoted_price(model, request.option_type, entry.spot, request.strike, &entry);
    let exit_price = quoted_price(model, request.option_type, exit.spot, request.strike, &exit);

    tracing::debug!(
        option = %request.option_type,
        position = %request.position,
        strike = request.strike,
        net_return,
        "heatmap computed"
    );

    Ok(HeatmapResponse {
        spot_axis,
        strike_axis,
        cells,
        min,
        max,
        net_return,
        entry_price,
        exit_price,
        multiplier: settings.multiplier,
        computed_at: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes::BlackScholes;

    fn settings() -> HeatmapSettings {
        HeatmapSettings { half_width: 4, steps: 9, multiplier: 100.0 }
    }

    fn dashboard_request(position: Position) -> HeatmapRequest {
        HeatmapRequest {
            option_type: OptionType::Call,
            position,
            strike: 95.0,
            entry: ScenarioInput { spot: 100.0, rate: 0.03, volatility: 0.2, days_to_expiry: 60.0 },
            exit: ScenarioInput { spot: 101.0, rate: 0.03, volatility: 0.2, days_to_expiry: 40.0 },
        }
    }

    #[test]
    fn test_axes_match_dashboard_layout() {
        let resp = run_heatmap(&BlackScholes::new(), settings(), &dashboard_request(Position::Long)).unwrap();
        assert_eq!(resp.spot_axis, (97..=105).map(f64::from).collect::<Vec<_>>());
        assert_eq!(resp.strike_axis, (91..=99).map(f64::from).collect::<Vec<_>>());
        assert_eq!(resp.cells.len(), 9);
        assert!(resp.cells.iter().all(|row| row.len() == 9));
    }

    #[test]
    fn test_long_and_short_are_opposite() {
        let model = BlackScholes::new();
        let long = run_heatmap(&model, settings(), &dashboard_request(Position::Long)).unwrap();
        let short = run_heatmap(&model, settings(), &dashboard_request(Position::Short)).unwrap();
        assert!((long.net_return + short.net_return).abs() < 1e-9);
        for (a, b) in long.cells.iter().flatten().zip(short.cells.iter().flatten()) {
            assert!((a + b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_net_return_from_quoted_prices() {
        let resp = run_heatmap(&BlackScholes::new(), settings(), &dashboard_request(Position::Long)).unwrap();
        let expected = round_cents((resp.exit_price - resp.entry_price) * 100.0);
        assert!((resp.net_return - expected).abs() < 1e-9);
        // In-the-money call gaining on spot: exit worth more despite decay
        assert!(resp.entry_price > 5.0 && resp.exit_price > 5.0);
        assert!(resp.min <= resp.net_return && resp.net_return <= resp.max);
    }

    #[test]
    fn test_call_pnl_rises_with_spot() {
        let resp = run_heatmap(&BlackScholes::new(), settings(), &dashboard_request(Position::Long)).unwrap();
        for j in 0..resp.strike_axis.len() {
            for i in 1..resp.spot_axis.len() {
                assert!(resp.cells[i][j] >= resp.cells[i - 1][j]);
            }
        }
    }

    #[test]
    fn test_unchanged_market_is_flat() {
        let mut req = dashboard_request(Position::Long);
        req.exit = req.entry;
        let pnl = scenario_pnl(&BlackScholes::new(), &req, req.entry.spot, req.strike, 100.0);
        assert_eq!(pnl, 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let model = BlackScholes::new();
        let mut bad_strike = dashboard_request(Position::Long);
        bad_strike.strike = 0.0;
        assert!(matches!(run_heatmap(&model, settings(), &bad_strike), Err(PayoffError::InvalidLeg(_))));

        let mut bad_exit = dashboard_request(Position::Short);
        bad_exit.exit.volatility = -0.1;
        assert!(matches!(run_heatmap(&model, settings(), &bad_exit), Err(PayoffError::InvalidScenario(_))));

        let mut near_zero = dashboard_request(Position::Long);
        near_zero.strike = 3.0;
        assert!(matches!(run_heatmap(&model, settings(), &near_zero), Err(PayoffError::InvalidRange(_))));
    }

    #[test]
    fn test_integer_axis_truncates() {
        assert_eq!(integer_axis(101.5, 4, 9).unwrap(), vec![97.0, 98.0, 99.0, 100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        // More steps than integers collapses duplicates
        let dense = integer_axis(50.0, 1, 5).unwrap();
        assert_eq!(dense, vec![49.0, 50.0, 51.0]);
    }
}
