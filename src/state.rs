use crate::config::AppConfig;
use crate::errors::{PayoffError, PayoffResult};
use crate::payoff::evaluator::PayoffEvaluator;
use crate::payoff::grid::GridSpec;
use crate::payoff::summary::StrategySummary;
use crate::pnl::heatmap::{HeatmapRequest, HeatmapResponse};
use portable_atomic::{AtomicU64, Ordering};
use smallvec::SmallVec;
use std::sync::Arc;

/// Calendar days per year used to convert slider days into model time.
pub const DAYS_PER_YEAR: f64 = 365.0;

// ── Option Leg ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Long,
    Short,
}

impl Position {
    /// +1 for long, -1 for short.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// A single naked option position within a strategy.
/// `premium` is per unit; it is paid on long legs and received on short legs.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptionLeg {
    pub option_type: OptionType,
    pub position: Position,
    pub strike: f64,
    pub premium: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl OptionLeg {
    pub fn new(
        option_type: OptionType,
        position: Position,
        strike: f64,
        premium: f64,
        quantity: u32,
    ) -> PayoffResult<Self> {
        let leg = Self {
            option_type,
            position,
            strike,
            premium,
            quantity,
        };
        leg.validate()?;
        Ok(leg)
    }

    pub fn validate(&self) -> PayoffResult<()> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PayoffError::InvalidLeg(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if !self.premium.is_finite() || self.premium < 0.0 {
            return Err(PayoffError::InvalidLeg(format!(
                "premium must be non-negative, got {}",
                self.premium
            )));
        }
        if self.quantity == 0 {
            return Err(PayoffError::InvalidLeg("quantity must be non-zero".into()));
        }
        Ok(())
    }

    /// Signed quantity: positive for long, negative for short.
    #[inline]
    pub fn signed_quantity(&self) -> f64 {
        self.position.sign() * self.quantity as f64
    }
}

/// Legs of a strategy. Dashboards rarely carry more than a handful.
pub type Legs = SmallVec<[OptionLeg; 4]>;

// ── Market Scenario ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarketScenario {
    pub spot: f64,
    pub volatility: f64,
    pub rate: f64,
    /// Years.
    pub time_to_expiry: f64,
}

impl MarketScenario {
    pub fn from_days(spot: f64, volatility: f64, rate: f64, days_to_expiry: f64) -> Self {
        Self {
            spot,
            volatility,
            rate,
            time_to_expiry: days_to_expiry / DAYS_PER_YEAR,
        }
    }

    pub fn validate(&self) -> PayoffResult<()> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(PayoffError::InvalidScenario(format!(
                "spot must be positive, got {}",
                self.spot
            )));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(PayoffError::InvalidScenario(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if !self.time_to_expiry.is_finite() || self.time_to_expiry < 0.0 {
            return Err(PayoffError::InvalidScenario(format!(
                "time to expiry must be non-negative, got {}",
                self.time_to_expiry
            )));
        }
        if !self.rate.is_finite() {
            return Err(PayoffError::InvalidScenario("rate must be finite".into()));
        }
        Ok(())
    }

    /// True when a pre-expiry theoretical price carries information.
    #[inline]
    pub fn supports_pricing(&self) -> bool {
        self.volatility > 0.0 && self.time_to_expiry > 0.0
    }

    /// One-sigma move of the underlying over the remaining life.
    #[inline]
    pub fn price_std_dev(&self) -> f64 {
        self.spot * self.volatility * self.time_to_expiry.sqrt()
    }
}

// ── Price Grid & Curves ──

/// Ordered, strictly increasing sample points. Only the grid builder
/// constructs one.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct PriceGrid(Vec<f64>);

impl PriceGrid {
    pub(crate) fn from_sorted(points: Vec<f64>) -> Self {
        Self(points)
    }

    #[inline]
    pub fn points(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

/// Payoff at expiry per grid point: one row per leg plus the strategy total.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PayoffCurve {
    pub grid: PriceGrid,
    pub legs: Vec<Vec<f64>>,
    pub aggregate: Vec<f64>,
}

/// Pre-expiry model values shown next to the payoff curve.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TheoreticalPricing {
    pub model: &'static str,
    /// Per leg, at the scenario spot.
    pub leg_prices: Vec<f64>,
    /// Strategy value net of premiums at each grid point.
    pub curve: Vec<f64>,
}

// ── API Messages ──

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PayoffRequest {
    #[serde(default)]
    pub legs: Legs,
    #[serde(default)]
    pub grid: Option<GridSpec>,
    #[serde(default)]
    pub scenario: Option<MarketScenario>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PayoffResponse {
    #[serde(flatten)]
    pub curve: PayoffCurve,
    pub theoretical: Option<TheoreticalPricing>,
    pub summary: StrategySummary,
    pub computed_at: String,
}

/// Messages INTO the server over the WebSocket.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsRequest {
    Payoff(PayoffRequest),
    Heatmap(HeatmapRequest),
}

/// Messages OUT of the server over the WebSocket.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    PayoffResult(PayoffResponse),
    HeatmapResult(HeatmapResponse),
    Error { error: String, message: String },
}

impl From<&PayoffError> for WsMessage {
    fn from(e: &PayoffError) -> Self {
        WsMessage::Error {
            error: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

// ── Request Counters (lock-free) ──

pub struct RequestCounters {
    pub payoff_requests: AtomicU64,
    pub heatmap_requests: AtomicU64,
    pub validation_errors: AtomicU64,
    pub ws_connections: AtomicU64,
    pub ws_messages_sent: AtomicU64,
}

impl RequestCounters {
    pub fn new() -> Self {
        Self {
            payoff_requests: AtomicU64::new(0),
            heatmap_requests: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            ws_connections: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Application shared state (immutable config + counters) ──

pub struct AppState {
    pub config: AppConfig,

    // Pricing model instance (created once, reused by every request)
    pub evaluator: PayoffEvaluator,

    // Lock-free request counters
    pub counters: RequestCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            evaluator: PayoffEvaluator::new(),
            counters: RequestCounters::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_rejects_non_positive_strike() {
        let err = OptionLeg::new(OptionType::Call, Position::Long, 0.0, 1.0, 1).unwrap_err();
        assert!(matches!(err, PayoffError::InvalidLeg(_)));
        let err = OptionLeg::new(OptionType::Put, Position::Short, -5.0, 1.0, 1).unwrap_err();
        assert!(matches!(err, PayoffError::InvalidLeg(_)));
    }

    #[test]
    fn test_leg_rejects_zero_quantity_and_negative_premium() {
        assert!(OptionLeg::new(OptionType::Call, Position::Long, 100.0, 1.0, 0).is_err());
        assert!(OptionLeg::new(OptionType::Call, Position::Long, 100.0, -0.5, 1).is_err());
    }

    #[test]
    fn test_leg_rejects_non_finite_values() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = OptionLeg::new(OptionType::Call, Position::Long, bad, 1.0, 1).unwrap_err();
            assert!(matches!(err, PayoffError::InvalidLeg(_)), "strike {bad}");
            let err = OptionLeg::new(OptionType::Put, Position::Short, 100.0, bad, 1).unwrap_err();
            assert!(matches!(err, PayoffError::InvalidLeg(_)), "premium {bad}");
        }
    }

    #[test]
    fn test_leg_quantity_defaults_to_one() {
        let leg: OptionLeg = serde_json::from_str(
            r#"{"option_type":"put","position":"short","strike":95.0,"premium":2.5}"#,
        )
        .unwrap();
        assert_eq!(leg.quantity, 1);
        assert_eq!(leg.option_type, OptionType::Put);
        assert!((leg.signed_quantity() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_from_days() {
        let s = MarketScenario::from_days(100.0, 0.2, 0.03, 73.0);
        assert!((s.time_to_expiry - 0.2).abs() < 1e-12);
        assert!(s.supports_pricing());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_scenario_validation() {
        let bad_spot = MarketScenario { spot: 0.0, volatility: 0.2, rate: 0.0, time_to_expiry: 1.0 };
        assert!(matches!(bad_spot.validate(), Err(PayoffError::InvalidScenario(_))));
        let flat = MarketScenario { spot: 100.0, volatility: 0.0, rate: 0.0, time_to_expiry: 1.0 };
        assert!(flat.validate().is_ok());
        assert!(!flat.supports_pricing());
    }

    #[test]
    fn test_ws_request_tagging() {
        let req: WsRequest = serde_json::from_str(
            r#"{"type":"payoff","legs":[],"grid":{"kind":"range","min":80.0,"max":120.0,"points":5}}"#,
        )
        .unwrap();
        assert!(matches!(req, WsRequest::Payoff(_)));
    }
}
