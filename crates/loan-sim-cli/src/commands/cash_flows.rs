use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::{json, Value};

use loan_sim_core::rates::{annual_effective_to_monthly, monthly_to_annual_effective};
use loan_sim_core::time_value::{irr_with_diagnostics, npv};

use crate::input;

#[derive(Deserialize)]
struct CashFlowInput {
    #[serde(default)]
    rate: Option<Decimal>,
    #[serde(default, alias = "annualRate")]
    annual_rate: Option<Decimal>,
    #[serde(alias = "cashFlows")]
    cash_flows: Vec<Decimal>,
}

/// Arguments for NPV of a periodic cash-flow vector
#[derive(Args)]
pub struct NpvArgs {
    /// Path to JSON or YAML input (`rate` or `annual_rate`, `cash_flows`)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic (monthly) discount rate as a decimal (0.01 = 1%)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "annual_rate")]
    pub rate: Option<Decimal>,

    /// Effective annual discount rate in percent, converted to monthly
    #[arg(long, allow_hyphen_values = true)]
    pub annual_rate: Option<Decimal>,

    /// Cash flows starting at period 0 (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parsed: CashFlowInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CashFlowInput {
            rate: args.rate,
            annual_rate: args.annual_rate,
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
        }
    };

    let rate = match (parsed.rate, parsed.annual_rate) {
        (Some(r), _) => r,
        (None, Some(annual)) => {
            if annual <= dec!(-100) {
                return Err("--annual-rate must be greater than -100".into());
            }
            annual_effective_to_monthly(annual / dec!(100))
        }
        (None, None) => return Err("--rate or --annual-rate is required".into()),
    };

    let value = npv(rate, &parsed.cash_flows)?;
    Ok(json!({
        "result": {
            "npv": value.to_string(),
            "periodic_rate": rate.to_string(),
            "periods": parsed.cash_flows.len(),
        }
    }))
}

/// Arguments for IRR of a periodic cash-flow vector
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON or YAML input (`cash_flows`)
    #[arg(long)]
    pub input: Option<String>,

    /// Cash flows starting at period 0 (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cash_flows: Vec<Decimal> = if let Some(ref path) = args.input {
        input::file::read_input::<CashFlowInput>(path)?.cash_flows
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value::<CashFlowInput>(data)?.cash_flows
    } else {
        args.cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?
    };

    let solution = irr_with_diagnostics(&cash_flows)
        .ok_or("IRR undefined: cash flows do not change sign over the search range")?;

    let mut warnings = Vec::new();
    if !solution.converged {
        warnings.push(format!(
            "Bisection stopped after {} iterations; IRR is a best-effort estimate",
            solution.iterations
        ));
    }

    Ok(json!({
        "result": {
            "irr": solution.monthly_rate.to_string(),
            "effective_annual_rate_percent":
                (monthly_to_annual_effective(solution.monthly_rate) * dec!(100)).to_string(),
            "iterations": solution.iterations,
            "converged": solution.converged,
        },
        "warnings": warnings,
    }))
}
