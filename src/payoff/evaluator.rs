use crate::errors::PayoffResult;
use crate::models::black_scholes::BlackScholes;
use crate::models::{ModelParams, PricingModel};
use crate::state::{
    MarketScenario, OptionLeg, OptionType, PayoffCurve, Position, PriceGrid, TheoreticalPricing,
};

/// Signed intrinsic value at expiry for one unit: f(price, strike).
type IntrinsicFn = fn(f64, f64) -> f64;

fn long_call(price: f64, strike: f64) -> f64 {
    (price - strike).max(0.0)
}

fn short_call(price: f64, strike: f64) -> f64 {
    -(price - strike).max(0.0)
}

fn long_put(price: f64, strike: f64) -> f64 {
    (strike - price).max(0.0)
}

fn short_put(price: f64, strike: f64) -> f64 {
    -(strike - price).max(0.0)
}

/// Indexed by [option type][position].
const PAYOFF_TABLE: [[IntrinsicFn; 2]; 2] = [[long_call, short_call], [long_put, short_put]];

#[inline]
fn intrinsic_fn(option_type: OptionType, position: Position) -> IntrinsicFn {
    let t = match option_type {
        OptionType::Call => 0,
        OptionType::Put => 1,
    };
    let p = match position {
        Position::Long => 0,
        Position::Short => 1,
    };
    PAYOFF_TABLE[t][p]
}

/// Net payoff of one leg at expiry, after the premium paid (long) or
/// received (short).
#[inline]
pub fn leg_payoff(leg: &OptionLeg, price: f64) -> f64 {
    let signed_intrinsic = intrinsic_fn(leg.option_type, leg.position)(price, leg.strike);
    leg.quantity as f64 * (signed_intrinsic - leg.position.sign() * leg.premium)
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub curve: PayoffCurve,
    pub theoretical: Option<TheoreticalPricing>,
}

/// Stateless payoff evaluator. Holds only the pricing model, created once.
pub struct PayoffEvaluator<M: PricingModel = BlackScholes> {
    model: M,
}

impl PayoffEvaluator<BlackScholes> {
    pub fn new() -> Self {
        Self {
            model: BlackScholes::new(),
        }
    }
}

impl Default for PayoffEvaluator<BlackScholes> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: PricingModel> PayoffEvaluator<M> {
    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Payoff-at-expiry curve for every leg and the strategy total.
    /// An empty leg list yields an all-zero aggregate.
    pub fn payoff_curve(&self, legs: &[OptionLeg], grid: &PriceGrid) -> PayoffResult<PayoffCurve> {
        for leg in legs {
            leg.validate()?;
        }

        let leg_curves: Vec<Vec<f64>> = legs
            .iter()
            .map(|leg| grid.points().iter().map(|&s| leg_payoff(leg, s)).collect())
            .collect();

        let mut aggregate = vec![0.0; grid.len()];
        for curve in &leg_curves {
            for (total, v) in aggregate.iter_mut().zip(curve) {
                *total += v;
            }
        }

        Ok(PayoffCurve {
            grid: grid.clone(),
            legs: leg_curves,
            aggregate,
        })
    }

    /// Theoretical prices for display. `None` when the scenario carries no
    /// time value (zero volatility or expired).
    pub fn theoretical(
        &self,
        legs: &[OptionLeg],
        grid: &PriceGrid,
        scenario: &MarketScenario,
    ) -> PayoffResult<Option<TheoreticalPricing>> {
        scenario.validate()?;
        if !scenario.supports_pricing() {
            return Ok(None);
        }

        let unit_price = |leg: &OptionLeg, spot: f64| {
            let params = ModelParams::new(
                spot,
                leg.strike,
                scenario.time_to_expiry,
                scenario.volatility,
                scenario.rate,
            );
            self.model.price(&params, leg.option_type)
        };

        let leg_prices: Vec<f64> = legs.iter().map(|leg| unit_price(leg, scenario.spot)).collect();

        let curve: Vec<f64> = grid
            .points()
            .iter()
            .map(|&s| {
                legs.iter()
                    .map(|leg| leg.signed_quantity() * (unit_price(leg, s) - leg.premium))
                    .sum::<f64>()
            })
            .collect();

        Ok(Some(TheoreticalPricing {
            model: self.model.name(),
            leg_prices,
            curve,
        }))
    }

    /// Full pass: payoff curve plus, when a scenario is given, theoretical pricing.
    pub fn evaluate(
        &self,
        legs: &[OptionLeg],
        grid: &PriceGrid,
        scenario: Option<&MarketScenario>,
    ) -> PayoffResult<Evaluation> {
        let curve = self.payoff_curve(legs, grid)?;
        let theoretical = match scenario {
            Some(s) => self.theoretical(legs, grid, s)?,
            None => None,
        };
        Ok(Evaluation { curve, theoretical })
    }
}
