//! Default loan terms published by a bank.
//!
//! A bank record carries the quoted rate (TEA and/or TEM), the terms it
//! offers, its default grace period and its fee schedule. The engine uses
//! these only as defaults for a [`LoanInput`]; callers may override any field.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::schedule::GraceMode;
use crate::error::LoanSimError;
use crate::rates::{monthly_to_annual_effective, Capitalization, RateMode};
use crate::simulation::parameters::LoanInput;
use crate::types::{Money, Rate, Years};
use crate::LoanSimResult;

/// One bank's published terms. Percentages are quoted in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTerms {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Effective annual rate
    #[serde(default)]
    pub tea: Option<Rate>,
    /// Effective monthly rate, used when no TEA is published
    #[serde(default)]
    pub tem: Option<Rate>,
    /// Loan terms on offer, in years. Empty means unrestricted.
    #[serde(default, alias = "availableTerms")]
    pub available_terms: Vec<u32>,
    #[serde(default, alias = "gracePeriod")]
    pub grace_period: Option<u32>,
    #[serde(default, alias = "graceMode")]
    pub grace_mode: GraceMode,
    #[serde(default, alias = "adminFees")]
    pub admin_fees: Option<Rate>,
    #[serde(default, alias = "evaluationFee")]
    pub evaluation_fee: Option<Rate>,
    #[serde(default, alias = "lifeInsurance")]
    pub life_insurance: Option<Rate>,
}

impl BankTerms {
    /// Effective annual rate in percent: TEA when published, otherwise
    /// `(1 + TEM)^12 - 1`.
    pub fn annual_rate_percent(&self) -> Option<Rate> {
        self.tea.or_else(|| {
            self.tem
                .map(|tem| monthly_to_annual_effective(tem / dec!(100)) * dec!(100))
        })
    }

    /// Whether the bank offers `term_years`. Fractional terms never match a
    /// restricted list.
    pub fn offers_term(&self, term_years: Years) -> bool {
        if self.available_terms.is_empty() {
            return true;
        }
        self.available_terms
            .iter()
            .any(|t| Decimal::from(*t) == term_years)
    }

    /// Loan request pre-filled with this bank's defaults.
    pub fn loan_input(&self, amount: Money, term_years: Years) -> LoanSimResult<LoanInput> {
        let annual_rate = self.annual_rate_percent().ok_or_else(|| {
            LoanSimError::InsufficientData(format!(
                "Bank '{}' publishes neither a TEA nor a TEM",
                self.id
            ))
        })?;

        let grace_months = self.grace_period.unwrap_or(0);
        if grace_months > 0 && self.grace_mode == GraceMode::None {
            return Err(LoanSimError::InsufficientData(format!(
                "Bank '{}' publishes a {grace_months}-month grace period without a grace mode",
                self.id
            )));
        }

        Ok(LoanInput {
            amount,
            annual_rate,
            rate_mode: RateMode::Effective,
            capitalization: Capitalization::Monthly,
            term_years,
            grace_months,
            grace_mode: self.grace_mode,
            admin_fees_percent: self.admin_fees.unwrap_or(Decimal::ZERO),
            evaluation_fee_percent: self.evaluation_fee.unwrap_or(Decimal::ZERO),
            life_insurance_percent: self.life_insurance.unwrap_or(Decimal::ZERO),
            ..LoanInput::default()
        })
    }
}

/// Source of bank terms, keyed by bank id.
pub trait BankTermsProvider {
    fn bank_terms(&self, id: &str) -> Option<BankTerms>;
}

/// In-memory catalog, typically loaded from a JSON array of bank records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankCatalog {
    banks: Vec<BankTerms>,
}

impl BankCatalog {
    pub fn new(banks: Vec<BankTerms>) -> Self {
        BankCatalog { banks }
    }

    pub fn from_json(json: &str) -> LoanSimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn banks(&self) -> &[BankTerms] {
        &self.banks
    }
}

impl BankTermsProvider for BankCatalog {
    fn bank_terms(&self, id: &str) -> Option<BankTerms> {
        self.banks.iter().find(|b| b.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CATALOG: &str = r#"[
        {
            "id": "bcp",
            "name": "Banco de Crédito",
            "tea": "12.5",
            "availableTerms": [5, 10, 20],
            "gracePeriod": 3,
            "graceMode": "Partial",
            "adminFees": "1",
            "evaluationFee": "0.5",
            "lifeInsurance": "0.96"
        },
        {
            "id": "monthly-only",
            "name": "Caja Municipal",
            "tem": "1"
        },
        {
            "id": "no-rate",
            "name": "Sin tasa"
        },
        {
            "id": "grace-no-mode",
            "name": "Financiera",
            "tea": "10",
            "gracePeriod": 6
        }
    ]"#;

    fn catalog() -> BankCatalog {
        BankCatalog::from_json(CATALOG).unwrap()
    }

    #[test]
    fn test_lookup_by_id() {
        let c = catalog();
        assert_eq!(c.banks().len(), 4);
        assert_eq!(c.bank_terms("bcp").unwrap().name, "Banco de Crédito");
        assert!(c.bank_terms("missing").is_none());
    }

    #[test]
    fn test_loan_input_from_bank_defaults() {
        let bank = catalog().bank_terms("bcp").unwrap();
        let input = bank.loan_input(dec!(150000), dec!(5)).unwrap();
        assert_eq!(input.annual_rate, dec!(12.5));
        assert_eq!(input.grace_months, 3);
        assert_eq!(input.grace_mode, GraceMode::Partial);
        assert_eq!(input.admin_fees_percent, dec!(1));
        assert_eq!(input.evaluation_fee_percent, dec!(0.5));
        assert_eq!(input.life_insurance_percent, dec!(0.96));
        assert!(input.include_van && input.include_tir);
    }

    #[test]
    fn test_tem_only_bank_derives_tea() {
        let bank = catalog().bank_terms("monthly-only").unwrap();
        // 1.01^12 - 1 = 12.6825030131969720661201%
        let tea = bank.annual_rate_percent().unwrap();
        assert!((tea - dec!(12.682503013196972)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_bank_without_rate() {
        let bank = catalog().bank_terms("no-rate").unwrap();
        assert!(matches!(
            bank.loan_input(dec!(1000), dec!(1)),
            Err(LoanSimError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_grace_period_without_mode() {
        let bank = catalog().bank_terms("grace-no-mode").unwrap();
        match bank.loan_input(dec!(100000), dec!(10)) {
            Err(LoanSimError::InsufficientData(msg)) => {
                assert!(msg.contains("grace-no-mode"));
                assert!(msg.contains("without a grace mode"));
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn test_offers_term() {
        let c = catalog();
        let bcp = c.bank_terms("bcp").unwrap();
        assert!(bcp.offers_term(dec!(10)));
        assert!(!bcp.offers_term(dec!(15)));
        assert!(!bcp.offers_term(dec!(10.5)));
        assert!(c.bank_terms("monthly-only").unwrap().offers_term(dec!(7)));
    }
}
