use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::schedule::AmortizationRow;
use crate::types::{Money, Rate};

/// Fee amounts derived from the percentage quotes on the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Admin + evaluation fees, withheld at disbursement
    pub upfront_fees: Money,
    /// Flat life-insurance charge added to every installment
    pub monthly_life_insurance: Money,
    /// Cash the borrower actually receives: `amount - upfront_fees`
    pub net_disbursement: Money,
}

impl FeeBreakdown {
    pub fn new(
        amount: Money,
        admin_fees_percent: Rate,
        evaluation_fee_percent: Rate,
        life_insurance_percent: Rate,
    ) -> Self {
        let upfront_fees = amount * (admin_fees_percent + evaluation_fee_percent) / dec!(100);
        // Prorated on the original principal, not the outstanding balance
        let monthly_life_insurance = amount * life_insurance_percent / dec!(100) / dec!(12);
        FeeBreakdown {
            upfront_fees,
            monthly_life_insurance,
            net_disbursement: amount - upfront_fees,
        }
    }

    /// Cash-flow vector for NPV and IRR, indexed `0..=schedule.len()`.
    ///
    /// Index 0 is the net disbursement (negative); index `k` is the
    /// installment of period `k` plus life insurance.
    pub fn cash_flows(&self, schedule: &[AmortizationRow]) -> Vec<Money> {
        let mut flows = Vec::with_capacity(schedule.len() + 1);
        flows.push(-self.net_disbursement);
        flows.extend(
            schedule
                .iter()
                .map(|row| row.payment + self.monthly_life_insurance),
        );
        flows
    }

    pub fn total_life_insurance(&self, months: u32) -> Money {
        self.monthly_life_insurance * Decimal::from(months)
    }
}

/// Assemble the IRR/NPV cash-flow vector from a schedule and the fee quotes.
pub fn build_cash_flows(
    schedule: &[AmortizationRow],
    amount: Money,
    admin_fees_percent: Rate,
    evaluation_fee_percent: Rate,
    life_insurance_percent: Rate,
) -> Vec<Money> {
    FeeBreakdown::new(
        amount,
        admin_fees_percent,
        evaluation_fee_percent,
        life_insurance_percent,
    )
    .cash_flows(schedule)
}
