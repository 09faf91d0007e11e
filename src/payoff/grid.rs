use crate::errors::{PayoffError, PayoffResult};
use crate::state::{MarketScenario, PriceGrid};

/// How the price axis is laid out.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridSpec {
    /// Explicit bounds.
    Range { min: f64, max: f64, points: usize },
    /// `center ± half_width`.
    Around { center: f64, half_width: f64, points: usize },
    /// `mean ± multiple * std_dev`.
    StdDev {
        mean: f64,
        std_dev: f64,
        multiple: f64,
        points: usize,
    },
}

impl GridSpec {
    /// Std-dev grid centred on spot using the one-sigma price move over the
    /// scenario's remaining life.
    pub fn from_scenario(scenario: &MarketScenario, multiple: f64, points: usize) -> Self {
        GridSpec::StdDev {
            mean: scenario.spot,
            std_dev: scenario.price_std_dev(),
            multiple,
            points,
        }
    }

    #[inline]
    pub fn points(&self) -> usize {
        match *self {
            GridSpec::Range { points, .. }
            | GridSpec::Around { points, .. }
            | GridSpec::StdDev { points, .. } => points,
        }
    }

    /// Resolved (min, max) bounds. Not validated.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            GridSpec::Range { min, max, .. } => (min, max),
            GridSpec::Around {
                center, half_width, ..
            } => (center - half_width, center + half_width),
            GridSpec::StdDev {
                mean,
                std_dev,
                multiple,
                ..
            } => {
                let spread = multiple * std_dev;
                (mean - spread, mean + spread)
            }
        }
    }

    pub fn build(&self) -> PayoffResult<PriceGrid> {
        let (min, max) = self.bounds();
        linspace(min, max, self.points())
    }
}

/// `n` evenly spaced points from `min` to `max`, both endpoints included exactly.
pub fn linspace(min: f64, max: f64, n: usize) -> PayoffResult<PriceGrid> {
    if !min.is_finite() || !max.is_finite() {
        return Err(PayoffError::InvalidRange(format!(
            "bounds must be finite, got [{min}, {max}]"
        )));
    }
    if min >= max {
        return Err(PayoffError::InvalidRange(format!(
            "min must be below max, got [{min}, {max}]"
        )));
    }
    if n < 2 {
        return Err(PayoffError::InvalidRange(format!(
            "need at least 2 sample points, got {n}"
        )));
    }

    let span = max - min;
    let last = (n - 1) as f64;
    let mut points: Vec<f64> = if span.is_finite() {
        (0..n).map(|i| min + span * (i as f64) / last).collect()
    } else {
        // Bounds near f64::MAX overflow the span; weight the endpoints instead.
        (0..n)
            .map(|i| {
                let t = i as f64 / last;
                min * (1.0 - t) + max * t
            })
            .collect()
    };
    // Interior rounding can drift the endpoints; pin them.
    points[0] = min;
    points[n - 1] = max;

    if points
        .windows(2)
        .any(|w| w[1].partial_cmp(&w[0]) != Some(std::cmp::Ordering::Greater))
    {
        return Err(PayoffError::InvalidRange(format!(
            "range [{min}, {max}] too narrow for {n} distinct points"
        )));
    }

    Ok(PriceGrid::from_sorted(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints_and_count() {
        for &(min, max, n) in &[(80.0, 120.0, 5), (0.1, 0.3, 7), (-3.0, 17.5, 101), (1.0, 2.0, 2)] {
            let grid = linspace(min, max, n).unwrap();
            assert_eq!(grid.len(), n);
            assert_eq!(grid.first(), Some(min));
            assert_eq!(grid.last(), Some(max));
            assert!(grid.points().windows(2).all(|w| w[1] > w[0]), "not strictly increasing");
        }
    }

    #[test]
    fn test_linspace_exact_values() {
        let grid = linspace(80.0, 120.0, 5).unwrap();
        assert_eq!(grid.points(), &[80.0, 90.0, 100.0, 110.0, 120.0]);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(linspace(10.0, 10.0, 5), Err(PayoffError::InvalidRange(_))));
        assert!(matches!(linspace(20.0, 10.0, 5), Err(PayoffError::InvalidRange(_))));
        assert!(matches!(linspace(10.0, 20.0, 1), Err(PayoffError::InvalidRange(_))));
        assert!(matches!(linspace(10.0, 20.0, 0), Err(PayoffError::InvalidRange(_))));
        assert!(matches!(linspace(f64::NAN, 20.0, 5), Err(PayoffError::InvalidRange(_))));
    }

    #[test]
    fn test_linspace_extreme_bounds() {
        let grid = linspace(-1e308, 1e308, 2).unwrap();
        assert_eq!(grid.points(), &[-1e308, 1e308]);

        let grid = linspace(-f64::MAX, f64::MAX, 5).unwrap();
        assert_eq!(grid.first(), Some(-f64::MAX));
        assert_eq!(grid.last(), Some(f64::MAX));
        assert!(grid.points().iter().all(|p| p.is_finite()));
        assert!(grid.points().windows(2).all(|w| w[1] > w[0]));
        assert_eq!(grid.points()[2], 0.0);
    }

    #[test]
    fn test_around_spec() {
        let grid = GridSpec::Around { center: 100.0, half_width: 4.0, points: 9 }.build().unwrap();
        assert_eq!(grid.points(), &[96.0, 97.0, 98.0, 99.0, 100.0, 101.0, 102.0, 103.0, 104.0]);
    }

    #[test]
    fn test_std_dev_spec() {
        let spec = GridSpec::StdDev { mean: 100.0, std_dev: 10.0, multiple: 2.0, points: 3 };
        assert_eq!(spec.build().unwrap().points(), &[80.0, 100.0, 120.0]);

        let zero = GridSpec::StdDev { mean: 100.0, std_dev: 0.0, multiple: 3.0, points: 11 };
        assert!(matches!(zero.build(), Err(PayoffError::InvalidRange(_))));
    }

    #[test]
    fn test_from_scenario_uses_price_std_dev() {
        let scenario = MarketScenario { spot: 100.0, volatility: 0.2, rate: 0.0, time_to_expiry: 0.25 };
        let spec = GridSpec::from_scenario(&scenario, 3.0, 31);
        let (min, max) = spec.bounds();
        assert!((min - 70.0).abs() < 1e-9);
        assert!((max - 130.0).abs() < 1e-9);
        assert_eq!(spec.points(), 31);
    }

    #[test]
    fn test_spec_json_shape() {
        let spec: GridSpec =
            serde_json::from_str(r#"{"kind":"around","center":50.0,"half_width":5.0,"points":11}"#).unwrap();
        assert_eq!(spec, GridSpec::Around { center: 50.0, half_width: 5.0, points: 11 });
    }
}
