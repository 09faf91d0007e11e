pub mod evaluator;
pub mod grid;
pub mod summary;

use crate::config::AppConfig;
use crate::errors::{PayoffError, PayoffResult};
use crate::payoff::evaluator::PayoffEvaluator;
use crate::payoff::grid::GridSpec;
use crate::state::{OptionLeg, PayoffRequest, PayoffResponse};

/// Price axis used when the request carries no explicit grid.
///
/// Preference order: std-dev band around the scenario spot, a band of half
/// the spot either side, then half the lowest strike to 1.5x the highest.
pub fn default_grid(request: &PayoffRequest, config: &AppConfig) -> PayoffResult<GridSpec> {
    let points = config.default_grid_points;

    if let Some(scenario) = &request.scenario {
        scenario.validate()?;
        if scenario.price_std_dev() > 0.0 {
            return Ok(GridSpec::from_scenario(scenario, config.std_dev_multiple, points));
        }
        return Ok(GridSpec::Around {
            center: scenario.spot,
            half_width: scenario.spot * 0.5,
            points,
        });
    }

    let (lo, hi) = request
        .legs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), l| {
            (lo.min(l.strike), hi.max(l.strike))
        });
    if lo.is_finite() && hi.is_finite() {
        return Ok(GridSpec::Range {
            min: lo * 0.5,
            max: hi * 1.5,
            points,
        });
    }

    Err(PayoffError::InvalidRange(
        "no grid, scenario or legs to derive a price axis from".into(),
    ))
}

/// One full recompute: grid, payoff curves, optional theoretical pricing and
/// summary. Pure apart from the timestamp.
pub fn run_payoff(
    evaluator: &PayoffEvaluator,
    config: &AppConfig,
    request: &PayoffRequest,
) -> PayoffResult<PayoffResponse> {
    if request.legs.len() > config.max_legs {
        return Err(PayoffError::InvalidLeg(format!(
            "{} legs exceeds limit of {}",
            request.legs.len(),
            config.max_legs
        )));
    }
    for leg in &request.legs {
        leg.validate()?;
    }

    let spec = match request.grid {
        Some(spec) => spec,
        None => default_grid(request, config)?,
    };
    if spec.points() > config.max_grid_points {
        return Err(PayoffError::InvalidRange(format!(
            "{} sample points exceeds limit of {}",
            spec.points(),
            config.max_grid_points
        )));
    }

    let grid = spec.build()?;
    let legs: &[OptionLeg] = &request.legs;
    let evaluation = evaluator.evaluate(legs, &grid, request.scenario.as_ref())?;
    let summary = summary::summarize(legs, &evaluation.curve);

    tracing::debug!(
        legs = legs.len(),
        points = grid.len(),
        priced = evaluation.theoretical.is_some(),
        "payoff computed"
    );

    Ok(PayoffResponse {
        curve: evaluation.curve,
        theoretical: evaluation.theoretical,
        summary,
        computed_at: chrono::Utc::now().to_rfc3339(),
    })
}
