//! Rate-basis conversion: TEA / TNA quotes to the effective monthly rate (TEM).
//!
//! Banks quote either an effective annual rate (TEA) or a nominal annual rate
//! (TNA) with a capitalization frequency. Every downstream calculation runs on
//! the effective monthly rate. All math in `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Rate;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: u32 = 12;

/// Newton step size below which a root is considered exact.
const ROOT_TOL: Decimal = dec!(0.00000000000000000001);

const ROOT_MAX_ITER: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the quoted annual rate should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateMode {
    /// Tasa Efectiva Anual (TEA)
    #[default]
    #[serde(alias = "TEA", alias = "effective")]
    Effective,
    /// Tasa Nominal Anual (TNA), compounded per `Capitalization`
    #[serde(alias = "TNA", alias = "nominal")]
    Nominal,
}

/// Capitalization frequency of a nominal rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capitalization {
    #[default]
    #[serde(alias = "monthly")]
    Monthly,
    #[serde(alias = "bimonthly")]
    Bimonthly,
    #[serde(alias = "quarterly")]
    Quarterly,
    #[serde(alias = "semiannual")]
    Semiannual,
    #[serde(alias = "annual")]
    Annual,
}

impl Capitalization {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Capitalization::Monthly => 12,
            Capitalization::Bimonthly => 6,
            Capitalization::Quarterly => 4,
            Capitalization::Semiannual => 2,
            Capitalization::Annual => 1,
        }
    }
}

impl FromStr for RateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "effective" | "tea" => Ok(RateMode::Effective),
            "nominal" | "tna" => Ok(RateMode::Nominal),
            other => Err(format!("unknown rate mode '{other}' (expected effective|nominal)")),
        }
    }
}

impl fmt::Display for RateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateMode::Effective => write!(f, "TEA"),
            RateMode::Nominal => write!(f, "TNA"),
        }
    }
}

impl FromStr for Capitalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(Capitalization::Monthly),
            "bimonthly" => Ok(Capitalization::Bimonthly),
            "quarterly" => Ok(Capitalization::Quarterly),
            "semiannual" => Ok(Capitalization::Semiannual),
            "annual" => Ok(Capitalization::Annual),
            other => Err(format!(
                "unknown capitalization '{other}' (expected monthly|bimonthly|quarterly|semiannual|annual)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Effective monthly rate (decimal) for an annual rate quoted in percent.
///
/// Non-positive quotes map to a zero rate; a 0% loan is valid.
pub fn monthly_rate(
    annual_rate_percent: Rate,
    rate_mode: RateMode,
    capitalization: Capitalization,
) -> Rate {
    if annual_rate_percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let annual = annual_rate_percent / dec!(100);
    let effective_annual = match rate_mode {
        RateMode::Effective => annual,
        RateMode::Nominal => nominal_to_effective(annual, capitalization),
    };

    annual_effective_to_monthly(effective_annual)
}

/// Nominal annual rate (decimal) to effective annual rate (decimal):
/// `(1 + r/m)^m - 1`.
pub fn nominal_to_effective(nominal: Rate, capitalization: Capitalization) -> Rate {
    let m = capitalization.periods_per_year();
    iterative_pow(Decimal::ONE + nominal / Decimal::from(m), m) - Decimal::ONE
}

/// Effective annual rate to effective monthly rate: `(1 + r)^(1/12) - 1`.
///
/// `rate` must be greater than -1.
pub fn annual_effective_to_monthly(rate: Rate) -> Rate {
    if rate.is_zero() {
        return Decimal::ZERO;
    }
    twelfth_root(Decimal::ONE + rate) - Decimal::ONE
}

/// Effective monthly rate to effective annual rate: `(1 + m)^12 - 1`.
pub fn monthly_to_annual_effective(rate: Rate) -> Rate {
    iterative_pow(Decimal::ONE + rate, MONTHS_PER_YEAR) - Decimal::ONE
}

// ---------------------------------------------------------------------------
// Decimal math helpers (no f64, no powd)
// ---------------------------------------------------------------------------

/// Compute base^n for a non-negative integer exponent via iterative multiplication.
pub(crate) fn iterative_pow(base: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result *= base;
    }
    result
}

/// Overflow-aware base^n. `None` once the power leaves the Decimal range.
pub(crate) fn checked_pow(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

/// x^(1/12) as the cube root of the fourth root. Keeps every intermediate
/// power small enough that Newton cannot overflow.
fn twelfth_root(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let fourth = x.sqrt().and_then(|s| s.sqrt()).unwrap_or(Decimal::ONE);
    cube_root(fourth)
}

/// Cube root of a positive value by Newton's method.
///
/// Starts at `1 + (y - 1)/3`, which Bernoulli's inequality puts above the
/// root, so the iteration descends monotonically.
fn cube_root(y: Decimal) -> Decimal {
    if y == Decimal::ONE {
        return Decimal::ONE;
    }

    let three = dec!(3);
    let mut guess = Decimal::ONE + (y - Decimal::ONE) / three;

    for _ in 0..ROOT_MAX_ITER {
        let square = guess * guess;
        if square.is_zero() {
            break;
        }
        let delta = (square * guess - y) / (three * square);
        guess -= delta;
        if delta.abs() < ROOT_TOL {
            break;
        }
    }

    guess
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
