//! Flat demand projection.

use jobmatch_common::{ForecastDemandRequest, ForecastDemandResponse};

/// Upper bound on forecast periods.
pub const MAX_HORIZON: usize = 60;

/// Project the current posting count unchanged over the horizon.
pub fn forecast_demand(request: &ForecastDemandRequest) -> ForecastDemandResponse {
    let current = request
        .current_open_postings
        .unwrap_or(request.historical_postings.len() as u64);
    let horizon = request.forecast_horizon.min(MAX_HORIZON);
    let bounds = [scale(current, 8), scale(current, 12)];

    ForecastDemandResponse {
        forecast_periods: (1..=horizon).map(|i| format!("month_{}", i)).collect(),
        predicted_demand: vec![current; horizon],
        confidence_bounds: vec![bounds; horizon],
        method: Some("flat_projection".to_string()),
    }
}

/// `value * tenths / 10`, saturating at `u64::MAX`.
fn scale(value: u64, tenths: u64) -> u64 {
    let scaled = u128::from(value) * u128::from(tenths) / 10;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
