use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::schedule::GraceMode;
use crate::error::LoanSimError;
use crate::rates::{self, checked_pow, Capitalization, RateMode};
use crate::types::{Currency, Money, Rate, Years};
use crate::LoanSimResult;

/// Highest annual rate (percent) accepted for the loan or the discount rate.
pub const MAX_ANNUAL_RATE_PERCENT: Rate = dec!(1000);

/// Longest loan horizon accepted, in years.
pub const MAX_TERM_YEARS: Years = dec!(100);

/// Largest principal accepted.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

/// Ceiling on the balance reached after capitalizing total-grace interest.
/// Keeps every installment, total and fee product inside the Decimal range.
pub const MAX_CAPITALIZED_BALANCE: Money = dec!(100000000000000000000);

/// Upfront fees (admin + evaluation) cannot withhold more than the principal.
pub const MAX_UPFRONT_FEES_PERCENT: Rate = dec!(100);

/// Highest annual life-insurance charge, percent of principal.
pub const MAX_LIFE_INSURANCE_PERCENT: Rate = dec!(100);

fn default_true() -> bool {
    true
}

/// Raw loan request as supplied by a caller. Percentages are quoted in
/// percent (12 = 12%). Validate with [`LoanParameters::new`].
///
/// Field aliases accept the camelCase names used by the CRM's HTTP payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    /// Principal to finance
    pub amount: Money,
    /// Annual rate in percent, read as TEA or TNA per `rate_mode`
    #[serde(alias = "annualRate", alias = "interestRate")]
    pub annual_rate: Rate,
    #[serde(default, alias = "rateMode")]
    pub rate_mode: RateMode,
    /// Only meaningful for nominal rates
    #[serde(default)]
    pub capitalization: Capitalization,
    /// Loan horizon in years; rounded to whole months
    #[serde(alias = "termYears", alias = "term")]
    pub term_years: Years,
    #[serde(default, alias = "graceMonths", alias = "gracePeriod")]
    pub grace_months: u32,
    #[serde(default, alias = "graceMode")]
    pub grace_mode: GraceMode,
    /// One-time upfront fee, percent of principal
    #[serde(default, alias = "adminFees", alias = "adminFeesPercent")]
    pub admin_fees_percent: Rate,
    /// One-time appraisal fee, percent of principal
    #[serde(default, alias = "evaluationFee", alias = "evaluationFeePercent")]
    pub evaluation_fee_percent: Rate,
    /// Annual life insurance, percent of principal, charged monthly
    #[serde(default, alias = "lifeInsurance", alias = "lifeInsurancePercent")]
    pub life_insurance_percent: Rate,
    /// Effective annual rate (percent) used only to discount the VAN
    #[serde(default, alias = "discountRate", alias = "discountRateAnnualPercent")]
    pub discount_rate_annual_percent: Rate,
    #[serde(default = "default_true", alias = "includeVan")]
    pub include_van: bool,
    #[serde(default = "default_true", alias = "includeTir")]
    pub include_tir: bool,
    #[serde(default)]
    pub currency: Currency,
    /// First disbursement date; row `k` falls due `k` months later
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "startDate")]
    pub start_date: Option<NaiveDate>,
}

impl Default for LoanInput {
    fn default() -> Self {
        LoanInput {
            amount: Decimal::ZERO,
            annual_rate: Decimal::ZERO,
            rate_mode: RateMode::default(),
            capitalization: Capitalization::default(),
            term_years: Decimal::ZERO,
            grace_months: 0,
            grace_mode: GraceMode::default(),
            admin_fees_percent: Decimal::ZERO,
            evaluation_fee_percent: Decimal::ZERO,
            life_insurance_percent: Decimal::ZERO,
            discount_rate_annual_percent: Decimal::ZERO,
            include_van: true,
            include_tir: true,
            currency: Currency::default(),
            start_date: None,
        }
    }
}

/// Validated, immutable loan parameters. The only way in is
/// [`LoanParameters::new`] (or deserializing, which runs the same checks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LoanInput", into = "LoanInput")]
pub struct LoanParameters {
    input: LoanInput,
    total_months: u32,
    monthly_rate: Rate,
}

impl LoanParameters {
    pub fn new(input: LoanInput) -> LoanSimResult<Self> {
        validate(&input)?;

        let total_months = months_in_term(input.term_years)?;
        if input.grace_months > total_months {
            return Err(LoanSimError::invalid(
                "grace_months",
                format!(
                    "Grace of {} months exceeds the {total_months}-month term",
                    input.grace_months
                ),
            ));
        }

        let monthly_rate =
            rates::monthly_rate(input.annual_rate, input.rate_mode, input.capitalization);

        if input.grace_mode == GraceMode::Total && input.grace_months > 0 {
            // The capitalized balance plus one more month of interest
            let fits = checked_pow(Decimal::ONE + monthly_rate, input.grace_months + 1)
                .and_then(|growth| input.amount.checked_mul(growth))
                .is_some_and(|balance| balance <= MAX_CAPITALIZED_BALANCE);
            if !fits {
                return Err(LoanSimError::invalid(
                    "grace_months",
                    format!(
                        "Capitalized balance during total grace would exceed {MAX_CAPITALIZED_BALANCE}"
                    ),
                ));
            }
        }

        Ok(LoanParameters {
            input,
            total_months,
            monthly_rate,
        })
    }

    pub fn amount(&self) -> Money {
        self.input.amount
    }

    pub fn annual_rate(&self) -> Rate {
        self.input.annual_rate
    }

    pub fn rate_mode(&self) -> RateMode {
        self.input.rate_mode
    }

    pub fn capitalization(&self) -> Capitalization {
        self.input.capitalization
    }

    pub fn term_years(&self) -> Years {
        self.input.term_years
    }

    /// `round(term_years * 12)`
    pub fn total_months(&self) -> u32 {
        self.total_months
    }

    pub fn grace_months(&self) -> u32 {
        self.input.grace_months
    }

    pub fn grace_mode(&self) -> GraceMode {
        self.input.grace_mode
    }

    pub fn admin_fees_percent(&self) -> Rate {
        self.input.admin_fees_percent
    }

    pub fn evaluation_fee_percent(&self) -> Rate {
        self.input.evaluation_fee_percent
    }

    pub fn life_insurance_percent(&self) -> Rate {
        self.input.life_insurance_percent
    }

    pub fn discount_rate_annual_percent(&self) -> Rate {
        self.input.discount_rate_annual_percent
    }

    pub fn include_van(&self) -> bool {
        self.input.include_van
    }

    pub fn include_tir(&self) -> bool {
        self.input.include_tir
    }

    pub fn currency(&self) -> Currency {
        self.input.currency
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.input.start_date
    }

    /// Effective monthly rate (TEM) as a decimal.
    pub fn monthly_rate(&self) -> Rate {
        self.monthly_rate
    }

    pub fn input(&self) -> &LoanInput {
        &self.input
    }
}

impl TryFrom<LoanInput> for LoanParameters {
    type Error = LoanSimError;

    fn try_from(input: LoanInput) -> Result<Self, Self::Error> {
        LoanParameters::new(input)
    }
}

impl From<LoanParameters> for LoanInput {
    fn from(params: LoanParameters) -> Self {
        params.input
    }
}

fn months_in_term(term_years: Years) -> LoanSimResult<u32> {
    let months = (term_years * dec!(12))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0);
    if months == 0 {
        return Err(LoanSimError::invalid(
            "term_years",
            "Term must cover at least one month",
        ));
    }
    Ok(months)
}

fn validate(input: &LoanInput) -> LoanSimResult<()> {
    if input.amount <= Decimal::ZERO {
        return Err(LoanSimError::invalid("amount", "Loan amount must be positive"));
    }
    if input.amount > MAX_AMOUNT {
        return Err(LoanSimError::invalid(
            "amount",
            format!("Loan amount cannot exceed {MAX_AMOUNT}"),
        ));
    }
    if input.term_years <= Decimal::ZERO {
        return Err(LoanSimError::invalid("term_years", "Term must be positive"));
    }
    if input.term_years > MAX_TERM_YEARS {
        return Err(LoanSimError::invalid(
            "term_years",
            format!("Term cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(LoanSimError::invalid("annual_rate", "Annual rate cannot be negative"));
    }
    if input.annual_rate > MAX_ANNUAL_RATE_PERCENT {
        return Err(LoanSimError::invalid(
            "annual_rate",
            format!("Annual rate cannot exceed {MAX_ANNUAL_RATE_PERCENT}%"),
        ));
    }
    if input.grace_months > 0 && input.grace_mode == GraceMode::None {
        return Err(LoanSimError::invalid(
            "grace_mode",
            "Grace months were requested without a grace mode; choose Total or Partial",
        ));
    }

    for (field, value) in [
        ("admin_fees_percent", input.admin_fees_percent),
        ("evaluation_fee_percent", input.evaluation_fee_percent),
        ("life_insurance_percent", input.life_insurance_percent),
    ] {
        if value < Decimal::ZERO {
            return Err(LoanSimError::invalid(field, "Fee percentages cannot be negative"));
        }
    }
    if input.admin_fees_percent + input.evaluation_fee_percent > MAX_UPFRONT_FEES_PERCENT {
        return Err(LoanSimError::invalid(
            "admin_fees_percent",
            format!(
                "Admin and evaluation fees together cannot exceed {MAX_UPFRONT_FEES_PERCENT}% of the principal"
            ),
        ));
    }
    if input.life_insurance_percent > MAX_LIFE_INSURANCE_PERCENT {
        return Err(LoanSimError::invalid(
            "life_insurance_percent",
            format!("Life insurance cannot exceed {MAX_LIFE_INSURANCE_PERCENT}% per year"),
        ));
    }

    if input.discount_rate_annual_percent <= dec!(-100) {
        return Err(LoanSimError::invalid(
            "discount_rate_annual_percent",
            "Discount rate must be greater than -100%",
        ));
    }
    if input.discount_rate_annual_percent > MAX_ANNUAL_RATE_PERCENT {
        return Err(LoanSimError::invalid(
            "discount_rate_annual_percent",
            format!("Discount rate cannot exceed {MAX_ANNUAL_RATE_PERCENT}%"),
        ));
    }

    Ok(())
}
