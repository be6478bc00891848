use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::rates::{checked_pow, iterative_pow};
use crate::types::{Money, Rate};

/// Balances whose magnitude falls below this are treated as fully repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.000001);

/// Treatment of the months at the start of the loan flagged as grace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraceMode {
    /// No grace: every month amortizes
    #[default]
    #[serde(alias = "none")]
    None,
    /// Nothing is paid; interest capitalizes into the balance
    #[serde(alias = "total")]
    Total,
    /// Only interest is paid; the balance stays flat
    #[serde(alias = "partial")]
    Partial,
}

impl FromStr for GraceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(GraceMode::None),
            "total" => Ok(GraceMode::Total),
            "partial" => Ok(GraceMode::Partial),
            other => Err(format!("unknown grace mode '{other}' (expected none|total|partial)")),
        }
    }
}

/// One month of the repayment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

/// Full schedule plus the installment that applies once grace has ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<AmortizationRow>,
    /// Constant post-grace installment (0 when grace covers the whole term)
    pub monthly_payment: Money,
    /// Principal the installment formula runs on (capitalized under total grace)
    pub principal_for_amortization: Money,
    pub amortization_months: u32,
}

impl Schedule {
    /// Stamp each row with its due date: `start + period` months.
    pub fn with_start_date(mut self, start: NaiveDate) -> Self {
        for row in &mut self.rows {
            row.due_date = start.checked_add_months(Months::new(row.period));
        }
        self
    }

    pub fn final_balance(&self) -> Money {
        self.rows.last().map(|r| r.balance).unwrap_or(Decimal::ZERO)
    }

    pub fn total_interest(&self) -> Money {
        self.rows.iter().map(|r| r.interest).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.rows.iter().map(|r| r.payment).sum()
    }
}

/// Constant French installment: `P * i / (1 - (1+i)^-n)`, `P / n` at `i = 0`,
/// and 0 when there is nothing left to amortize.
///
/// Algebraically the usual `P·i·(1+i)^n / ((1+i)^n - 1)`; the discount
/// form underflows harmlessly instead of overflowing for long, dear loans.
pub fn french_installment(principal: Money, monthly_rate: Rate, months: u32) -> Money {
    if months == 0 {
        return Decimal::ZERO;
    }
    if monthly_rate.is_zero() {
        return principal / Decimal::from(months);
    }

    let v_n = iterative_pow(Decimal::ONE / (Decimal::ONE + monthly_rate), months);
    let denom = Decimal::ONE - v_n;
    if denom.is_zero() {
        return principal / Decimal::from(months);
    }
    principal * monthly_rate / denom
}

/// Build the month-by-month French schedule with an optional grace period.
///
/// Never fails: zero rate, zero grace and grace spanning the full term all
/// produce a defined schedule. `grace_months` beyond `total_months` is
/// truncated to the term.
pub fn build_schedule(
    amount: Money,
    monthly_rate: Rate,
    total_months: u32,
    grace_months: u32,
    grace_mode: GraceMode,
) -> Schedule {
    let grace_months = grace_months.min(total_months);
    let amortization_months = total_months - grace_months;

    let principal_for_amortization = if grace_mode == GraceMode::Total && grace_months > 0 {
        checked_pow(Decimal::ONE + monthly_rate, grace_months)
            .and_then(|growth| amount.checked_mul(growth))
            .unwrap_or(Decimal::MAX)
    } else {
        amount
    };

    let monthly_payment =
        french_installment(principal_for_amortization, monthly_rate, amortization_months);

    let mut rows = Vec::with_capacity(total_months as usize);
    let mut balance = amount;

    for period in 1..=total_months {
        let opening_balance = balance;
        let interest = balance * monthly_rate;
        let in_grace = period <= grace_months;

        let (payment, principal) = match grace_mode {
            GraceMode::Total if in_grace => {
                balance += interest;
                (Decimal::ZERO, Decimal::ZERO)
            }
            GraceMode::Partial if in_grace => (interest, Decimal::ZERO),
            _ => {
                let principal = monthly_payment - interest;
                balance -= principal;
                (monthly_payment, principal)
            }
        };

        if balance.abs() < BALANCE_EPSILON {
            balance = Decimal::ZERO;
        }

        rows.push(AmortizationRow {
            period,
            due_date: None,
            opening_balance,
            payment,
            interest,
            principal,
            balance,
        });
    }

    Schedule {
        rows,
        monthly_payment,
        principal_for_amortization,
        amortization_months,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
