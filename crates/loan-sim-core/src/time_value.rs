use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanSimError;
use crate::types::{Money, Rate};
use crate::LoanSimResult;

/// Lower edge of the IRR search bracket (monthly rate).
pub const IRR_LOWER_BOUND: Rate = dec!(-0.9999);

/// Upper edge of the IRR search bracket (monthly rate).
pub const IRR_UPPER_BOUND: Rate = dec!(5.0);

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.000000001);
const MAX_IRR_ITERATIONS: u32 = 200;

/// Outcome of the IRR bisection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Periodic (monthly) rate that zeroes the NPV
    pub monthly_rate: Rate,
    /// Bisection steps taken
    pub iterations: u32,
    /// False when the iteration cap was hit and the bracket midpoint was returned
    pub converged: bool,
}

/// Net Present Value of a series of periodic cash flows.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> LoanSimResult<Money> {
    if rate <= dec!(-1) {
        return Err(LoanSimError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    Ok(discounted_sum(rate, cash_flows))
}

/// `Σ cf[t] / (1+rate)^t` for `rate > -1`.
///
/// Saturates at `Decimal::MAX` / `Decimal::MIN` when the discount factor
/// grows past the Decimal range; the sign is that of the latest non-zero
/// flow, which dominates the sum at such rates.
pub(crate) fn discounted_sum(rate: Rate, cash_flows: &[Money]) -> Money {
    let factor = Decimal::ONE / (Decimal::ONE + rate);
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(factor) {
                Some(d) => d,
                None => return saturate(result, &cash_flows[t..]),
            };
        }
        match cf.checked_mul(discount).and_then(|pv| result.checked_add(pv)) {
            Some(v) => result = v,
            None => return saturate(result, &cash_flows[t..]),
        }
    }

    result
}

fn saturate(partial: Money, remaining: &[Money]) -> Money {
    match remaining.iter().rev().find(|cf| !cf.is_zero()) {
        Some(cf) if *cf > Decimal::ZERO => Decimal::MAX,
        Some(_) => Decimal::MIN,
        None => partial,
    }
}

/// Internal Rate of Return (monthly) by bisection over
/// [`IRR_LOWER_BOUND`, `IRR_UPPER_BOUND`].
///
/// Returns `None` when the NPV does not change sign across the bracket.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    irr_with_diagnostics(cash_flows).map(|s| s.monthly_rate)
}

/// Bisection IRR that also reports how the search ended.
///
/// All-zero flows are undefined rather than solved: every rate zeroes them.
pub fn irr_with_diagnostics(cash_flows: &[Money]) -> Option<IrrSolution> {
    bisect(cash_flows, MAX_IRR_ITERATIONS)
}

fn bisect(cash_flows: &[Money], max_iterations: u32) -> Option<IrrSolution> {
    if cash_flows.iter().all(|cf| cf.is_zero()) {
        tracing::debug!(flows = cash_flows.len(), "IRR undefined: all cash flows are zero");
        return None;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;
    let mut f_low = discounted_sum(low, cash_flows);
    let f_high = discounted_sum(high, cash_flows);

    if same_sign(f_low, f_high) {
        tracing::debug!(
            npv_low = %f_low,
            npv_high = %f_high,
            "IRR undefined: NPV does not change sign over the bracket"
        );
        return None;
    }

    for i in 0..max_iterations {
        let mid = (low + high) / dec!(2);
        let f_mid = discounted_sum(mid, cash_flows);

        if f_mid.abs() < CONVERGENCE_THRESHOLD {
            tracing::debug!(iterations = i + 1, monthly_rate = %mid, "IRR converged");
            return Some(IrrSolution {
                monthly_rate: mid,
                iterations: i + 1,
                converged: true,
            });
        }

        if opposite_sign(f_low, f_mid) {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }

    let estimate = (low + high) / dec!(2);
    tracing::warn!(
        iterations = max_iterations,
        monthly_rate = %estimate,
        "IRR bisection hit the iteration cap; returning bracket midpoint"
    );
    Some(IrrSolution {
        monthly_rate: estimate,
        iterations: max_iterations,
        converged: false,
    })
}

// Sign tests instead of products: saturated NPVs would overflow a multiply.
fn same_sign(a: Decimal, b: Decimal) -> bool {
    (a > Decimal::ZERO && b > Decimal::ZERO) || (a < Decimal::ZERO && b < Decimal::ZERO)
}

fn opposite_sign(a: Decimal, b: Decimal) -> bool {
    (a > Decimal::ZERO && b < Decimal::ZERO) || (a < Decimal::ZERO && b > Decimal::ZERO)
}
