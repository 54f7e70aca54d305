use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use school_billing::{
    compute_pricing, Adjustment, Concept, PaymentRequest, PricingResult, StudentBillingProfile,
};

const FIXED_AMOUNT: Decimal = dec!(150);

fn tuition(due_month: u32, payment_date: (i32, u32, u32), base_amount: Decimal) -> PaymentRequest {
    let (year, month, day) = payment_date;
    PaymentRequest {
        student_id: 42,
        concept: Concept::Tuition,
        due_month,
        payment_date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        base_amount,
    }
}

fn standard(request: &PaymentRequest) -> PricingResult {
    compute_pricing(request, &StudentBillingProfile::standard(), FIXED_AMOUNT).unwrap()
}

#[test]
fn scenario_a_current_month_before_day_ten() {
    let result = standard(&tuition(3, (2024, 3, 5), dec!(1000)));
    assert_eq!(result.discount, dec!(150));
    assert_eq!(result.surcharge, dec!(0));
    assert_eq!(result.final_amount, dec!(850));
    assert_eq!(result.original_amount, dec!(1000));
}

#[test]
fn scenario_b_current_month_after_day_fifteen() {
    let result = standard(&tuition(3, (2024, 3, 20), dec!(1000)));
    assert_eq!(result.surcharge, dec!(150));
    assert_eq!(result.discount, dec!(0));
    assert_eq!(result.final_amount, dec!(1150));
}

#[test]
fn scenario_c_grace_window() {
    let result = standard(&tuition(3, (2024, 3, 12), dec!(1000)));
    assert_eq!(result.surcharge, dec!(0));
    assert_eq!(result.discount, dec!(0));
    assert_eq!(result.final_amount, dec!(1000));
}

#[test]
fn scenario_d_paid_after_due_month() {
    let result = standard(&tuition(9, (2024, 10, 2), dec!(1000)));
    assert_eq!(result.surcharge, dec!(150));
    assert_eq!(result.final_amount, dec!(1150));
    assert_eq!(result.adjustment, Adjustment::LateSurcharge);
}

#[test]
fn scenario_e_paid_before_due_month() {
    let result = standard(&tuition(10, (2024, 9, 15), dec!(1000)));
    assert_eq!(result.discount, dec!(150));
    assert_eq!(result.final_amount, dec!(850));
    assert_eq!(result.adjustment, Adjustment::EarlyDiscount);
}

#[test]
fn scenario_f_sibling_special_rate() {
    let profile = StudentBillingProfile::sibling(Some(dec!(500)));
    let result = compute_pricing(&tuition(3, (2024, 3, 20), dec!(1000)), &profile, FIXED_AMOUNT)
        .unwrap();
    assert_eq!(result.final_amount, dec!(500));
    assert_eq!(result.surcharge, dec!(0));
    assert_eq!(result.discount, dec!(0));
}

#[test]
fn sibling_rate_holds_for_every_day_of_the_year() {
    let profile = StudentBillingProfile::sibling(Some(dec!(500)));
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    while date.year() == 2024 {
        for due_month in [1, 6, 12] {
            let request = PaymentRequest {
                payment_date: date,
                ..tuition(due_month, (2024, 1, 1), dec!(1000))
            };
            let result = compute_pricing(&request, &profile, FIXED_AMOUNT).unwrap();
            assert_eq!(result.final_amount, dec!(500));
            assert!(result.surcharge.is_zero() && result.discount.is_zero());
        }
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn non_tuition_concepts_keep_base_amount() {
    for concept in ["matricula", "libro", "uniforme"] {
        let request = PaymentRequest {
            concept: concept.parse().unwrap(),
            ..tuition(3, (2024, 3, 20), dec!(3000))
        };
        let result = standard(&request);
        assert_eq!(result.final_amount, dec!(3000));
        assert_eq!(result.adjustment, Adjustment::NotTuition);
    }
}

#[test]
fn fixed_amount_is_injected() {
    let request = tuition(3, (2024, 3, 20), dec!(1000));
    let result = compute_pricing(&request, &StudentBillingProfile::standard(), dec!(75)).unwrap();
    assert_eq!(result.final_amount, dec!(1075));
}

#[test]
fn repeated_calls_agree() {
    let request = tuition(9, (2024, 10, 2), dec!(1234.50));
    let first = standard(&request);
    let second = standard(&request);
    assert_eq!(first, second);
    assert_eq!(first.final_amount, dec!(1384.50));
}
