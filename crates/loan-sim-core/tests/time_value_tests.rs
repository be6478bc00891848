use loan_sim_core::rates::{
    annual_effective_to_monthly, monthly_rate, monthly_to_annual_effective, nominal_to_effective,
    Capitalization, RateMode,
};
use loan_sim_core::time_value::{irr, irr_with_diagnostics, npv, IRR_LOWER_BOUND, IRR_UPPER_BOUND};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn annuity(principal: Decimal, installment: Decimal, months: usize) -> Vec<Decimal> {
    let mut flows = vec![-principal];
    flows.extend(std::iter::repeat(installment).take(months));
    flows
}

// ===========================================================================
// Rate conversions
// ===========================================================================

#[test]
fn test_tea_to_tem() {
    // 1.12^(1/12) - 1
    let tem = annual_effective_to_monthly(dec!(0.12));
    assert!((tem - dec!(0.009488792934582974)).abs() < dec!(0.000000000001));
}

#[test]
fn test_tna_quarterly_to_tem() {
    // 12% TNA compounded quarterly: (1.03)^(1/3) - 1
    let tem = monthly_rate(dec!(12), RateMode::Nominal, Capitalization::Quarterly);
    assert!((tem - dec!(0.00990163404996)).abs() < dec!(0.0000000001));
}

#[test]
fn test_tna_monthly_is_simple_division() {
    let tem = monthly_rate(dec!(18), RateMode::Nominal, Capitalization::Monthly);
    assert!((tem - dec!(0.015)).abs() < dec!(0.000000000001));
}

#[test]
fn test_nominal_annual_capitalization_equals_effective() {
    assert_eq!(
        nominal_to_effective(dec!(0.09), Capitalization::Annual),
        dec!(0.09)
    );
}

#[test]
fn test_rate_round_trip() {
    let mut tea = Decimal::ZERO;
    while tea <= dec!(0.50) {
        let back = monthly_to_annual_effective(annual_effective_to_monthly(tea));
        assert!(
            (back - tea).abs() < dec!(0.000000001),
            "round trip drifted at TEA {tea}: {back}"
        );
        tea += dec!(0.025);
    }
}

// ===========================================================================
// NPV / IRR
// ===========================================================================

#[test]
fn test_npv_of_annuity_at_its_own_rate() {
    let i = dec!(0.01);
    // 10000 over 12 months at 1%: 888.48787872...
    let flows = annuity(dec!(10000), dec!(888.4878867834), 12);
    assert!(npv(i, &flows).unwrap().abs() < dec!(0.0001));
}

#[test]
fn test_irr_recovers_annuity_rate() {
    let flows = annuity(dec!(10000), dec!(888.4878867834), 12);
    let rate = irr(&flows).unwrap();
    assert!((rate - dec!(0.01)).abs() < dec!(0.00000001), "got {rate}");
}

#[test]
fn test_irr_long_horizon_stays_finite() {
    // 40-year loan pushes the bracket edges far outside Decimal range
    let flows = annuity(dec!(500000), dec!(4200), 480);
    let sol = irr_with_diagnostics(&flows).unwrap();
    assert!(sol.converged);
    assert!(sol.monthly_rate > IRR_LOWER_BOUND && sol.monthly_rate < IRR_UPPER_BOUND);
    assert!(npv(sol.monthly_rate, &flows).unwrap().abs() < dec!(0.000001));
}

#[test]
fn test_irr_requires_sign_change() {
    assert!(irr(&[dec!(100), dec!(50)]).is_none());
    assert!(irr(&[dec!(-100), dec!(-50)]).is_none());
    assert!(irr(&[Decimal::ZERO, dec!(10), dec!(10)]).is_none());
}

#[test]
fn test_npv_rejects_rate_below_minus_one() {
    assert!(npv(dec!(-1.5), &[dec!(-10), dec!(20)]).is_err());
}

#[test]
fn test_npv_zero_rate_is_plain_sum() {
    let flows = [dec!(-300), dec!(100), dec!(100), dec!(150)];
    assert_eq!(npv(Decimal::ZERO, &flows).unwrap(), dec!(50));
}
