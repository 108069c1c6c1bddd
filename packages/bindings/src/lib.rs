use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use wacc_core::fx::{self, FxGrowth};
use wacc_core::types::Rate;
use wacc_core::wacc::{self, DebtSource, EquityInput, WaccInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct ComputeRequest {
    equity: EquityInput,
    #[serde(default)]
    debt_sources: Vec<DebtSource>,
    tax_rate: Rate,
}

/// Engine output; `result` is null when the firm value is zero.
#[derive(Serialize)]
struct ComputeResponse {
    defined: bool,
    result: Option<wacc::WaccResult>,
}

#[derive(Deserialize)]
struct FxProjectionRequest {
    rate: Rate,
    growth: FxGrowth,
}

// ---------------------------------------------------------------------------
// WACC
// ---------------------------------------------------------------------------

/// Recompute on every input change; cheap and side-effect free.
#[napi]
pub fn compute_wacc(input_json: String) -> NapiResult<String> {
    let request: ComputeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = wacc::compute_wacc(&request.equity, &request.debt_sources, request.tax_rate);
    let response = ComputeResponse {
        defined: result.is_some(),
        result,
    };
    serde_json::to_string(&response).map_err(to_napi_error)
}

#[napi]
pub fn calculate_wacc(input_json: String) -> NapiResult<String> {
    let input: WaccInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = wacc::calculate_wacc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn wacc_summary(input_json: String) -> NapiResult<String> {
    let input: WaccInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = wacc::calculate_wacc(&input).map_err(to_napi_error)?;
    let rows = wacc::summary_rows(&output.result);
    serde_json::to_string(&rows).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// FX
// ---------------------------------------------------------------------------

#[napi]
pub fn project_fx_rate(input_json: String) -> NapiResult<String> {
    let request: FxProjectionRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let projected = fx::project_rate(request.rate, &request.growth).map_err(to_napi_error)?;
    serde_json::to_string(&projected).map_err(to_napi_error)
}
