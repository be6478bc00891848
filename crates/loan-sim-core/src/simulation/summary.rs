//! Loan simulation: schedule, fees, TCEA, VAN and TIR in one pass.
//!
//! Control flow is strictly linear: rate conversion → French schedule →
//! cash-flow vector → IRR / NPV → summary. Every call is a pure function of
//! its `LoanParameters`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::{build_schedule, AmortizationRow, GraceMode};
use crate::rates::{annual_effective_to_monthly, monthly_to_annual_effective};
use crate::simulation::cash_flows::FeeBreakdown;
use crate::simulation::parameters::{LoanInput, LoanParameters};
use crate::time_value::{
    discounted_sum, irr_with_diagnostics, IrrSolution, IRR_LOWER_BOUND, IRR_UPPER_BOUND,
};
use crate::types::*;
use crate::LoanSimResult;

/// Result of a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub currency: Currency,
    pub amount: Money,
    pub term_years: Years,
    pub total_months: u32,
    pub grace_months: u32,
    /// Effective monthly rate (TEM) as a decimal
    pub monthly_rate: Rate,
    /// Effective annual rate (TEA) in percent
    pub effective_annual_rate_percent: Rate,
    /// Post-grace constant installment, excluding insurance
    pub monthly_payment: Money,
    pub upfront_fees: Money,
    pub net_disbursement: Money,
    pub monthly_life_insurance: Money,
    pub total_life_insurance: Money,
    pub total_interests: Money,
    /// Installments + life insurance + upfront fees
    pub total_payable: Money,
    /// Annualized IRR of the borrower's cash flows, in percent
    pub tcea_percent: Option<Rate>,
    /// Net present value at the caller's discount rate
    pub van_amount: Option<Money>,
    /// Same annualized IRR as TCEA, reported separately
    pub tir_percent: Option<Rate>,
    pub schedule: Vec<AmortizationRow>,
}

/// Solver details that are not part of the summary proper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationDiagnostics {
    /// `None` when IRR was skipped or undefined
    pub irr: Option<IrrSolution>,
    /// True when IRR was requested but the cash flows never change sign
    pub irr_unsolvable: bool,
}

/// Run the engine over validated parameters.
pub fn simulate(params: &LoanParameters) -> SimulationSummary {
    simulate_with_diagnostics(params).0
}

/// [`simulate`] plus the IRR solver outcome.
pub fn simulate_with_diagnostics(
    params: &LoanParameters,
) -> (SimulationSummary, SimulationDiagnostics) {
    let monthly_rate = params.monthly_rate();
    let amount = params.amount();

    let mut schedule = build_schedule(
        amount,
        monthly_rate,
        params.total_months(),
        params.grace_months(),
        params.grace_mode(),
    );
    if let Some(start) = params.start_date() {
        schedule = schedule.with_start_date(start);
    }

    let fees = FeeBreakdown::new(
        amount,
        params.admin_fees_percent(),
        params.evaluation_fee_percent(),
        params.life_insurance_percent(),
    );
    let cash_flows = fees.cash_flows(&schedule.rows);

    let van_amount = params.include_van().then(|| {
        let discount_monthly =
            annual_effective_to_monthly(params.discount_rate_annual_percent() / dec!(100));
        discounted_sum(discount_monthly, &cash_flows)
    });

    let mut diagnostics = SimulationDiagnostics::default();
    let annualized_irr = if params.include_tir() {
        diagnostics.irr = irr_with_diagnostics(&cash_flows);
        diagnostics.irr_unsolvable = diagnostics.irr.is_none();
        diagnostics
            .irr
            .map(|sol| monthly_to_annual_effective(sol.monthly_rate) * dec!(100))
    } else {
        None
    };

    let total_life_insurance = fees.total_life_insurance(params.total_months());
    let total_interests = schedule.total_interest();
    let total_payable = schedule.total_paid() + total_life_insurance + fees.upfront_fees;

    tracing::debug!(
        months = params.total_months(),
        monthly_payment = %schedule.monthly_payment,
        tcea = ?annualized_irr,
        "simulation complete"
    );

    let summary = SimulationSummary {
        currency: params.currency(),
        amount,
        term_years: params.term_years(),
        total_months: params.total_months(),
        grace_months: params.grace_months(),
        monthly_rate,
        effective_annual_rate_percent: monthly_to_annual_effective(monthly_rate) * dec!(100),
        monthly_payment: schedule.monthly_payment,
        upfront_fees: fees.upfront_fees,
        net_disbursement: fees.net_disbursement,
        monthly_life_insurance: fees.monthly_life_insurance,
        total_life_insurance,
        total_interests,
        total_payable,
        tcea_percent: annualized_irr,
        van_amount,
        tir_percent: annualized_irr,
        schedule: schedule.rows,
    };

    (summary, diagnostics)
}

/// Validate a raw request, simulate it and wrap the result in the standard
/// computation envelope with warnings for degenerate outcomes.
pub fn run_simulation(input: &LoanInput) -> LoanSimResult<ComputationOutput<SimulationSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let params = LoanParameters::new(input.clone())?;
    let (summary, diagnostics) = simulate_with_diagnostics(&params);

    if params.grace_months() == params.total_months() {
        warnings.push(format!(
            "Grace period covers the full {}-month term; no amortizing installments",
            params.total_months()
        ));
    }
    if summary
        .schedule
        .last()
        .is_some_and(|row| row.balance != Decimal::ZERO)
    {
        warnings.push("Schedule does not fully amortize the principal".into());
    }
    warnings.extend(solver_warnings(&diagnostics));

    let methodology = match params.grace_mode() {
        GraceMode::None => "French amortization (constant installment)",
        GraceMode::Total => "French amortization with total grace (capitalized interest)",
        GraceMode::Partial => "French amortization with partial grace (interest only)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "rate_quote": format!("{}% {}", params.annual_rate(), params.rate_mode()),
            "capitalization": params.capitalization(),
            "monthly_rate": params.monthly_rate().to_string(),
            "total_months": params.total_months(),
            "grace_months": params.grace_months(),
            "discount_rate_annual_percent": params.discount_rate_annual_percent().to_string(),
            "irr_bracket": [IRR_LOWER_BOUND.to_string(), IRR_UPPER_BOUND.to_string()],
            "tcea_equals_tir": true,
        }),
        warnings,
        elapsed,
        summary,
    ))
}

fn solver_warnings(diagnostics: &SimulationDiagnostics) -> Vec<String> {
    let mut warnings = Vec::new();
    if diagnostics.irr_unsolvable {
        warnings.push(
            "TCEA/TIR undefined: cash flows do not change sign over the IRR search range".into(),
        );
    }
    if let Some(sol) = diagnostics.irr {
        if !sol.converged {
            warnings.push(format!(
                "IRR bisection reached {} iterations; TCEA/TIR are best-effort estimates",
                sol.iterations
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> LoanInput {
        LoanInput {
            amount: dec!(150000),
            annual_rate: dec!(12.5),
            term_years: dec!(5),
            admin_fees_percent: dec!(1),
            life_insurance_percent: dec!(0.96),
            discount_rate_annual_percent: dec!(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_simulation_envelope() {
        let out = run_simulation(&input()).unwrap();
        assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);
        assert_eq!(out.methodology, "French amortization (constant installment)");
        assert_eq!(out.result.schedule.len(), 60);
        assert_eq!(out.assumptions["total_months"], 60);
    }

    #[test]
    fn test_flags_skip_van_and_tir() {
        let params = LoanParameters::new(LoanInput {
            include_van: false,
            include_tir: false,
            ..input()
        })
        .unwrap();
        let (summary, diag) = simulate_with_diagnostics(&params);
        assert!(summary.van_amount.is_none());
        assert!(summary.tcea_percent.is_none());
        assert!(summary.tir_percent.is_none());
        assert!(diag.irr.is_none());
        assert!(!diag.irr_unsolvable);
    }

    #[test]
    fn test_full_term_grace_warns() {
        let out = run_simulation(&LoanInput {
            term_years: dec!(1),
            grace_months: 12,
            grace_mode: GraceMode::Partial,
            ..input()
        })
        .unwrap();
        assert_eq!(out.result.monthly_payment, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("full 12-month term")));
        assert!(out.warnings.iter().any(|w| w.contains("does not fully amortize")));
    }

    #[test]
    fn test_iteration_cap_warning() {
        let diag = SimulationDiagnostics {
            irr: Some(IrrSolution {
                monthly_rate: dec!(0.01),
                iterations: 200,
                converged: false,
            }),
            irr_unsolvable: false,
        };
        let warnings = solver_warnings(&diag);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("reached 200 iterations"));
        assert!(solver_warnings(&SimulationDiagnostics::default()).is_empty());
    }

    #[test]
    fn test_all_zero_cash_flows_leave_tcea_undefined() {
        // Zero rate, interest-only grace over the whole term and fees equal to
        // the principal: every cash flow is zero
        let out = run_simulation(&LoanInput {
            annual_rate: Decimal::ZERO,
            term_years: dec!(1),
            grace_months: 12,
            grace_mode: GraceMode::Partial,
            admin_fees_percent: dec!(100),
            life_insurance_percent: Decimal::ZERO,
            ..input()
        })
        .unwrap();
        assert!(out.result.schedule.iter().all(|r| r.payment.is_zero()));
        assert!(out.result.tcea_percent.is_none());
        assert!(out.result.tir_percent.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("TCEA/TIR undefined")));
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let err = run_simulation(&LoanInput {
            amount: dec!(-5),
            ..input()
        });
        assert!(err.is_err());
    }
}
