use loan_sim_core::amortization::schedule::{build_schedule, french_installment, GraceMode};
use loan_sim_core::rates::{monthly_rate, Capitalization, RateMode};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOL: Decimal = dec!(0.000001);

fn tem_12_percent() -> Decimal {
    monthly_rate(dec!(12), RateMode::Effective, Capitalization::Monthly)
}

// ===========================================================================
// Installment formula
// ===========================================================================

#[test]
fn test_standard_french_case() {
    // 200,000 over 20 years at 12% TEA
    // i = 1.12^(1/12) - 1 = 0.00948879293458297...
    // PMT = P·i·(1+i)^240 / ((1+i)^240 - 1) = 2117.2467035515336...
    let i = tem_12_percent();
    assert!((i - dec!(0.009489)).abs() < dec!(0.000001));

    let schedule = build_schedule(dec!(200000), i, 240, 0, GraceMode::None);
    assert_eq!(schedule.rows.len(), 240);
    assert!(
        (schedule.monthly_payment - dec!(2117.2467035515336)).abs() < dec!(0.0000001),
        "Expected PMT ~2117.2467, got {}",
        schedule.monthly_payment
    );
    assert_eq!(schedule.final_balance(), Decimal::ZERO);
}

#[test]
fn test_installment_matches_textbook_form() {
    let i = dec!(0.0075);
    let n = 180u32;
    let mut growth = Decimal::ONE;
    for _ in 0..n {
        growth *= Decimal::ONE + i;
    }
    let textbook = dec!(85000) * i * growth / (growth - Decimal::ONE);
    let ours = french_installment(dec!(85000), i, n);
    assert!((ours - textbook).abs() < dec!(0.0000000001));
}

// ===========================================================================
// Zero rate
// ===========================================================================

#[test]
fn test_zero_rate_straight_line() {
    let schedule = build_schedule(dec!(120000), Decimal::ZERO, 120, 0, GraceMode::None);
    assert_eq!(schedule.monthly_payment, dec!(1000));
    for row in &schedule.rows {
        assert_eq!(row.principal, dec!(1000));
        assert_eq!(row.interest, Decimal::ZERO);
        assert_eq!(row.payment, dec!(1000));
    }
    assert_eq!(schedule.final_balance(), Decimal::ZERO);
}

// ===========================================================================
// Invariants
// ===========================================================================

#[test]
fn test_amortization_closure() {
    for (amount, rate, months) in [
        (dec!(200000), tem_12_percent(), 240u32),
        (dec!(35000), dec!(0.015), 36),
        (dec!(1000000), dec!(0.004), 360),
        (dec!(999.99), dec!(0.02), 7),
    ] {
        let schedule = build_schedule(amount, rate, months, 0, GraceMode::None);
        let repaid: Decimal = schedule.rows.iter().map(|r| r.principal).sum();
        assert!(
            (repaid - amount).abs() < TOL,
            "principal repaid {repaid} != amount {amount}"
        );
        assert_eq!(schedule.final_balance(), Decimal::ZERO);
    }
}

#[test]
fn test_payment_identity_all_grace_modes() {
    for mode in [GraceMode::None, GraceMode::Partial, GraceMode::Total] {
        let grace = if mode == GraceMode::None { 0 } else { 12 };
        let schedule = build_schedule(dec!(180000), dec!(0.0085), 180, grace, mode);
        for row in &schedule.rows {
            if mode == GraceMode::Total && row.period <= grace {
                assert_eq!(row.payment, Decimal::ZERO);
                assert_eq!(row.principal, Decimal::ZERO);
            } else {
                assert!(
                    (row.payment - (row.interest + row.principal)).abs() < TOL,
                    "{mode:?} period {}: payment != interest + principal",
                    row.period
                );
            }
        }
    }
}

#[test]
fn test_balance_monotonic_outside_total_grace() {
    let schedule = build_schedule(dec!(90000), dec!(0.01), 120, 6, GraceMode::Partial);
    let mut previous = dec!(90000);
    for row in &schedule.rows {
        assert!(row.balance <= previous, "balance rose in period {}", row.period);
        assert_eq!(row.opening_balance, previous);
        previous = row.balance;
    }
}

// ===========================================================================
// Total grace
// ===========================================================================

#[test]
fn test_total_grace_capitalization() {
    // 100,000 at 12% TEA, 20 years, 6 months total grace
    // Capitalized principal = 100000 · (1+i)^6 = 105830.0524425836...
    // Installment over 234 months = 1127.9472098527062...
    let i = tem_12_percent();
    let schedule = build_schedule(dec!(100000), i, 240, 6, GraceMode::Total);

    let mut previous = dec!(100000);
    for row in &schedule.rows[..6] {
        assert!(row.balance > previous, "period {} did not capitalize", row.period);
        assert!((row.balance - previous - row.interest).abs() < TOL);
        previous = row.balance;
    }

    assert!((schedule.principal_for_amortization - dec!(105830.0524425836)).abs() < TOL);
    assert!((schedule.rows[5].balance - schedule.principal_for_amortization).abs() < TOL);
    assert!((schedule.monthly_payment - dec!(1127.9472098527)).abs() < TOL);
    assert_eq!(schedule.amortization_months, 234);
    assert_eq!(schedule.rows[6].payment, schedule.monthly_payment);
    assert_eq!(schedule.final_balance(), Decimal::ZERO);
}

#[test]
fn test_partial_grace_pays_interest_only() {
    let i = dec!(0.01);
    let schedule = build_schedule(dec!(50000), i, 60, 4, GraceMode::Partial);
    for row in &schedule.rows[..4] {
        assert_eq!(row.payment, dec!(500));
        assert_eq!(row.balance, dec!(50000));
    }
    // Installment amortizes the untouched principal over the remaining 56 months
    assert_eq!(schedule.monthly_payment, french_installment(dec!(50000), i, 56));
    assert_eq!(schedule.final_balance(), Decimal::ZERO);
}

#[test]
fn test_schedule_is_deterministic() {
    let a = build_schedule(dec!(75000), dec!(0.0091), 96, 3, GraceMode::Total);
    let b = build_schedule(dec!(75000), dec!(0.0091), 96, 3, GraceMode::Total);
    assert_eq!(a, b);
}
