use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::amortization::schedule::GraceMode;
use loan_sim_core::rates::{Capitalization, RateMode};
use loan_sim_core::simulation::bank_terms::{BankCatalog, BankTermsProvider};
use loan_sim_core::simulation::parameters::LoanInput;
use loan_sim_core::simulation::summary::run_simulation;
use loan_sim_core::Currency;

use crate::input;

/// Arguments shared by `simulate` and `schedule`
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a JSON or YAML loan request (flags below override its fields)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON or YAML bank catalog
    #[arg(long, requires = "bank")]
    pub bank_file: Option<String>,

    /// Bank id in the catalog whose terms seed the request
    #[arg(long, requires = "bank_file")]
    pub bank: Option<String>,

    /// Principal to finance
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual rate in percent (e.g. 12 for 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// How the annual rate is quoted: TEA (effective) or TNA (nominal)
    #[arg(long)]
    pub rate_mode: Option<RateMode>,

    /// Compounding frequency for TNA quotes
    #[arg(long)]
    pub capitalization: Option<Capitalization>,

    /// Loan term in years
    #[arg(long)]
    pub term_years: Option<Decimal>,

    /// Grace months at the start of the loan
    #[arg(long)]
    pub grace_months: Option<u32>,

    /// Grace regime: none, total (capitalize interest) or partial (interest only)
    #[arg(long)]
    pub grace_mode: Option<GraceMode>,

    /// Admin fees, percent of principal
    #[arg(long)]
    pub admin_fees: Option<Decimal>,

    /// Evaluation fee, percent of principal
    #[arg(long)]
    pub evaluation_fee: Option<Decimal>,

    /// Annual life insurance, percent of principal
    #[arg(long)]
    pub life_insurance: Option<Decimal>,

    /// Effective annual discount rate for the VAN, in percent
    #[arg(long, allow_hyphen_values = true)]
    pub discount_rate: Option<Decimal>,

    /// Skip the VAN
    #[arg(long)]
    pub no_van: bool,

    /// Skip TCEA and TIR
    #[arg(long)]
    pub no_tir: bool,

    /// Display currency (PEN or USD)
    #[arg(long)]
    pub currency: Option<Currency>,

    /// Disbursement date (YYYY-MM-DD); stamps a due date on each row
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (loan, mut warnings) = resolve_input(&args)?;
    let mut output = run_simulation(&loan)?;
    output.warnings.append(&mut warnings);
    Ok(serde_json::to_value(output)?)
}

pub fn run_schedule(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (loan, warnings) = resolve_input(&args)?;
    for w in &warnings {
        tracing::warn!("{w}");
    }
    let output = run_simulation(&loan)?;
    Ok(serde_json::to_value(output.result.schedule)?)
}

/// Build the loan request from file, stdin, bank catalog or flags, then
/// apply flag overrides. Returns CLI-level warnings alongside.
fn resolve_input(args: &SimulateArgs) -> Result<(LoanInput, Vec<String>), Box<dyn std::error::Error>> {
    let mut warnings = Vec::new();

    let mut loan: LoanInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else if let (Some(path), Some(bank_id)) = (&args.bank_file, &args.bank) {
        let catalog: BankCatalog = input::file::read_input(path)?;
        let bank = catalog
            .bank_terms(bank_id)
            .ok_or_else(|| format!("Bank '{bank_id}' not found in {path}"))?;
        let amount = args.amount.ok_or("--amount is required with --bank")?;
        let term_years = args.term_years.ok_or("--term-years is required with --bank")?;
        if !bank.offers_term(term_years) {
            warnings.push(format!(
                "{} does not offer a {}-year term (available: {:?})",
                bank.name, term_years, bank.available_terms
            ));
        }
        tracing::debug!(bank = %bank.id, "seeding request from bank terms");
        bank.loan_input(amount, term_years)?
    } else {
        LoanInput {
            amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args
                .term_years
                .ok_or("--term-years is required (or provide --input)")?,
            ..LoanInput::default()
        }
    };

    apply_overrides(&mut loan, args);
    tracing::debug!(?loan, "resolved loan request");
    Ok((loan, warnings))
}

fn apply_overrides(loan: &mut LoanInput, args: &SimulateArgs) {
    if let Some(v) = args.amount {
        loan.amount = v;
    }
    if let Some(v) = args.rate {
        loan.annual_rate = v;
    }
    if let Some(v) = args.rate_mode {
        loan.rate_mode = v;
    }
    if let Some(v) = args.capitalization {
        loan.capitalization = v;
    }
    if let Some(v) = args.term_years {
        loan.term_years = v;
    }
    if let Some(v) = args.grace_months {
        loan.grace_months = v;
    }
    if let Some(v) = args.grace_mode {
        loan.grace_mode = v;
    }
    if let Some(v) = args.admin_fees {
        loan.admin_fees_percent = v;
    }
    if let Some(v) = args.evaluation_fee {
        loan.evaluation_fee_percent = v;
    }
    if let Some(v) = args.life_insurance {
        loan.life_insurance_percent = v;
    }
    if let Some(v) = args.discount_rate {
        loan.discount_rate_annual_percent = v;
    }
    if args.no_van {
        loan.include_van = false;
    }
    if args.no_tir {
        loan.include_tir = false;
    }
    if let Some(v) = args.currency {
        loan.currency = v;
    }
    if let Some(v) = args.start_date {
        loan.start_date = Some(v);
    }
}
