use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use loan_sim_core::rates::{self, Capitalization, RateMode};
use loan_sim_core::simulation::parameters::{LoanInput, LoanParameters};
use loan_sim_core::simulation::summary::{run_simulation, simulate};
use loan_sim_core::time_value;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Full simulation wrapped in the computation envelope.
#[napi]
pub fn simulate_loan(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = run_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Schedule rows only, for PDF/Excel exporters on the JavaScript side.
#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let params = LoanParameters::new(input).map_err(to_napi_error)?;
    let summary = simulate(&params);
    serde_json::to_string(&summary.schedule).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rates and cash flows
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateQuote {
    annual_rate: Decimal,
    #[serde(default)]
    rate_mode: RateMode,
    #[serde(default)]
    capitalization: Capitalization,
}

/// Effective monthly rate (decimal string) for a `{ annualRate, rateMode, capitalization }` quote.
#[napi]
pub fn monthly_rate(input_json: String) -> NapiResult<String> {
    let quote: RateQuote = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    if quote.annual_rate < Decimal::ZERO {
        return Err(to_napi_error("annualRate cannot be negative"));
    }
    let tem = rates::monthly_rate(quote.annual_rate, quote.rate_mode, quote.capitalization);
    Ok(tem.to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashFlows {
    #[serde(default)]
    rate: Decimal,
    cash_flows: Vec<Decimal>,
}

/// NPV of `{ rate, cashFlows }` at a periodic rate.
#[napi]
pub fn loan_npv(input_json: String) -> NapiResult<String> {
    let input: CashFlows = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = time_value::npv(input.rate, &input.cash_flows).map_err(to_napi_error)?;
    Ok(value.to_string())
}

/// Periodic IRR of `{ cashFlows }`, or `null` when undefined.
#[napi]
pub fn loan_irr(input_json: String) -> NapiResult<String> {
    let input: CashFlows = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let solution = time_value::irr_with_diagnostics(&input.cash_flows);
    serde_json::to_string(&solution).map_err(to_napi_error)
}
