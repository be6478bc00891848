use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use loan_sim_core::rates::{monthly_rate, monthly_to_annual_effective, Capitalization, RateMode};

/// Arguments for rate conversion
#[derive(Args)]
pub struct RateArgs {
    /// Annual rate in percent (e.g. 12 for 12%)
    #[arg(long)]
    pub rate: Decimal,

    /// How the annual rate is quoted: TEA (effective) or TNA (nominal)
    #[arg(long, default_value = "TEA")]
    pub rate_mode: RateMode,

    /// Compounding frequency for TNA quotes
    #[arg(long, default_value = "monthly")]
    pub capitalization: Capitalization,
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.rate < Decimal::ZERO {
        return Err("--rate cannot be negative".into());
    }

    let tem = monthly_rate(args.rate, args.rate_mode, args.capitalization);
    let tea = monthly_to_annual_effective(tem);

    Ok(json!({
        "result": {
            "monthly_rate": tem.to_string(),
            "monthly_rate_percent": (tem * dec!(100)).to_string(),
            "effective_annual_rate_percent": (tea * dec!(100)).to_string(),
        },
        "assumptions": {
            "annual_rate_percent": args.rate.to_string(),
            "rate_mode": args.rate_mode.to_string(),
            "capitalization": args.capitalization,
        },
    }))
}
