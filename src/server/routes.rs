use crate::errors::{PayoffError, PayoffResult};
use crate::models::{ModelParams, PricingModel};
use crate::payoff;
use crate::pnl::heatmap::{self, HeatmapRequest, HeatmapResponse, HeatmapSettings, ScenarioInput};
use crate::state::{
    AppState, Legs, OptionLeg, OptionType, PayoffRequest, PayoffResponse, Position, RequestCounters,
};
use axum::extract::State;
use axum::response::Json;
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;

/// Runs one payoff pass and records the outcome in the counters.
pub fn compute_payoff(state: &AppState, request: &PayoffRequest) -> PayoffResult<PayoffResponse> {
    RequestCounters::bump(&state.counters.payoff_requests);
    let result = payoff::run_payoff(&state.evaluator, &state.config, request);
    record_failure(state, "payoff", result)
}

/// Runs one heatmap pass and records the outcome in the counters.
pub fn compute_heatmap(state: &AppState, request: &HeatmapRequest) -> PayoffResult<HeatmapResponse> {
    RequestCounters::bump(&state.counters.heatmap_requests);
    let settings = HeatmapSettings::from(&state.config);
    let result = heatmap::run_heatmap(state.evaluator.model(), settings, request);
    record_failure(state, "heatmap", result)
}

fn record_failure<T>(state: &AppState, what: &'static str, result: PayoffResult<T>) -> PayoffResult<T> {
    if let Err(e) = &result {
        RequestCounters::bump(&state.counters.validation_errors);
        tracing::warn!(request = what, error = %e, "request rejected");
    }
    result
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Defaults {
    pub payoff: PayoffRequest,
    pub heatmap: HeatmapRequest,
}

/// Starting inputs shown when the page first loads: a long 95 call opened at
/// T0 (spot 100, 60 days) and revisited at T1 (spot 101, 40 days).
pub fn defaults(state: &AppState) -> Defaults {
    let entry = ScenarioInput {
        spot: 100.0,
        rate: 0.03,
        volatility: 0.20,
        days_to_expiry: 60.0,
    };
    let exit = ScenarioInput {
        spot: 101.0,
        rate: 0.03,
        volatility: 0.20,
        days_to_expiry: 40.0,
    };
    let strike = 95.0;

    let scenario = entry.scenario();
    let params = ModelParams::new(
        scenario.spot,
        strike,
        scenario.time_to_expiry,
        scenario.volatility,
        scenario.rate,
    );
    let premium = heatmap::round_cents(state.evaluator.model().price(&params, OptionType::Call));

    let mut legs = Legs::new();
    legs.push(OptionLeg {
        option_type: OptionType::Call,
        position: Position::Long,
        strike,
        premium,
        quantity: 1,
    });

    Defaults {
        payoff: PayoffRequest {
            legs,
            grid: None,
            scenario: Some(scenario),
        },
        heatmap: HeatmapRequest {
            option_type: OptionType::Call,
            position: Position::Long,
            strike,
            entry,
            exit,
        },
    }
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/defaults -- initial dashboard inputs
pub async fn get_defaults(State(state): State<Arc<AppState>>) -> Json<Defaults> {
    Json(defaults(&state))
}

/// POST /api/payoff -- full recompute of grid, curves and summary
pub async fn post_payoff(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PayoffRequest>,
) -> Result<Json<PayoffResponse>, PayoffError> {
    compute_payoff(&state, &request).map(Json)
}

/// POST /api/heatmap -- T0 -> T1 P&L grid
pub async fn post_heatmap(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HeatmapRequest>,
) -> Result<Json<HeatmapResponse>, PayoffError> {
    compute_heatmap(&state, &request).map(Json)
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "payoff_requests": state.counters.payoff_requests.load(Relaxed),
        "heatmap_requests": state.counters.heatmap_requests.load(Relaxed),
        "validation_errors": state.counters.validation_errors.load(Relaxed),
        "ws_connections": state.counters.ws_connections.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
    }))
}
