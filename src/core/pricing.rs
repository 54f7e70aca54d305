//! Tuition pricing policy.
//!
//! A tuition payment gets at most one adjustment of a fixed amount:
//!
//! | Timing  | Day of month                 | Effect    |
//! |---------|------------------------------|-----------|
//! | early   | any                          | discount  |
//! | late    | any                          | surcharge |
//! | current | `<= discount_until_day`      | discount  |
//! | current | `>= surcharge_from_day`      | surcharge |
//! | current | in between                   | none      |
//!
//! Timing is decided by month only and dominates the day rules. A sibling with a
//! negotiated rate pays that rate instead. A sibling without one pays the base amount
//! unless the policy is built with [`SiblingWithoutRate::StandardRules`].
//!
//! The discount never exceeds the base amount, so `final_amount` is never negative.

use chrono::Datelike;
use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::domain::model::{
    Adjustment, Concept, PaymentRequest, PaymentTiming, PricingResult, SiblingWithoutRate,
    StudentBillingProfile,
};
use crate::domain::ports::PricingConfigProvider;
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{validate_non_negative, Validate};

pub const DEFAULT_FIXED_AMOUNT: Decimal = Decimal::from_parts(150, 0, 0, false, 0);
pub const DEFAULT_DISCOUNT_UNTIL_DAY: u32 = 10;
pub const DEFAULT_SURCHARGE_FROM_DAY: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuitionPricingPolicy {
    fixed_amount: Decimal,
    discount_until_day: u32,
    surcharge_from_day: u32,
    sibling_without_rate: SiblingWithoutRate,
}

impl Default for TuitionPricingPolicy {
    fn default() -> Self {
        Self {
            fixed_amount: DEFAULT_FIXED_AMOUNT,
            discount_until_day: DEFAULT_DISCOUNT_UNTIL_DAY,
            surcharge_from_day: DEFAULT_SURCHARGE_FROM_DAY,
            sibling_without_rate: SiblingWithoutRate::default(),
        }
    }
}

impl TuitionPricingPolicy {
    pub fn new(fixed_amount: Decimal) -> Result<Self> {
        Self::with_day_windows(
            fixed_amount,
            DEFAULT_DISCOUNT_UNTIL_DAY,
            DEFAULT_SURCHARGE_FROM_DAY,
        )
    }

    pub fn with_day_windows(
        fixed_amount: Decimal,
        discount_until_day: u32,
        surcharge_from_day: u32,
    ) -> Result<Self> {
        validate_non_negative("fixed_amount", fixed_amount)?;
        if discount_until_day == 0 || surcharge_from_day > 31 {
            return Err(BillingError::invalid_input(
                "day_windows",
                format!("{}..{}", discount_until_day, surcharge_from_day),
                "Day windows must fall within 1 and 31",
            ));
        }
        if discount_until_day >= surcharge_from_day {
            return Err(BillingError::invalid_input(
                "day_windows",
                format!("{}..{}", discount_until_day, surcharge_from_day),
                "Discount window must end before the surcharge window starts",
            ));
        }
        Ok(Self {
            fixed_amount,
            discount_until_day,
            surcharge_from_day,
            sibling_without_rate: SiblingWithoutRate::default(),
        })
    }

    pub fn with_sibling_without_rate(mut self, mode: SiblingWithoutRate) -> Self {
        self.sibling_without_rate = mode;
        self
    }

    pub fn from_config<C: PricingConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self::with_day_windows(
            config.fixed_amount(),
            config.discount_until_day(),
            config.surcharge_from_day(),
        )?
        .with_sibling_without_rate(config.sibling_without_rate()))
    }

    pub fn fixed_amount(&self) -> Decimal {
        self.fixed_amount
    }

    pub fn sibling_without_rate(&self) -> SiblingWithoutRate {
        self.sibling_without_rate
    }

    pub fn compute(
        &self,
        request: &PaymentRequest,
        profile: &StudentBillingProfile,
    ) -> Result<PricingResult> {
        request.validate()?;
        profile.validate()?;

        let base = request.base_amount;
        if request.concept != Concept::Tuition {
            return Ok(PricingResult::unadjusted(base, Adjustment::NotTuition));
        }

        if let Some(special) = profile.override_amount() {
            return Ok(PricingResult {
                final_amount: special,
                surcharge: Decimal::ZERO,
                discount: Decimal::ZERO,
                original_amount: base,
                adjustment: Adjustment::SiblingOverride,
            });
        }
        if profile.is_sibling && self.sibling_without_rate == SiblingWithoutRate::Exempt {
            return Ok(PricingResult::unadjusted(base, Adjustment::SiblingExempt));
        }

        let timing = classify_timing(request.payment_date.month(), request.due_month);
        let adjustment = self.adjustment_for(timing, request.payment_date.day());

        let (surcharge, discount) = match adjustment {
            // 折扣不超過原價
            Adjustment::EarlyDiscount | Adjustment::OnTimeDiscount => {
                (Decimal::ZERO, self.fixed_amount.min(base))
            }
            Adjustment::LateSurcharge | Adjustment::CurrentMonthSurcharge => {
                (self.fixed_amount, Decimal::ZERO)
            }
            _ => (Decimal::ZERO, Decimal::ZERO),
        };

        tracing::debug!(
            student_id = request.student_id,
            due_month = request.due_month,
            payment_date = %request.payment_date,
            ?timing,
            %adjustment,
            "Priced tuition payment"
        );

        Ok(PricingResult {
            final_amount: base + surcharge - discount,
            surcharge,
            discount,
            original_amount: base,
            adjustment,
        })
    }

    fn adjustment_for(&self, timing: PaymentTiming, day: u32) -> Adjustment {
        match timing {
            PaymentTiming::Early => Adjustment::EarlyDiscount,
            PaymentTiming::Late => Adjustment::LateSurcharge,
            PaymentTiming::Current if day <= self.discount_until_day => Adjustment::OnTimeDiscount,
            PaymentTiming::Current if day >= self.surcharge_from_day => {
                Adjustment::CurrentMonthSurcharge
            }
            PaymentTiming::Current => Adjustment::GraceWindow,
        }
    }
}

pub fn classify_timing(payment_month: u32, due_month: u32) -> PaymentTiming {
    match payment_month.cmp(&due_month) {
        Ordering::Less => PaymentTiming::Early,
        Ordering::Equal => PaymentTiming::Current,
        Ordering::Greater => PaymentTiming::Late,
    }
}

/// Prices a payment with the default day windows and the given fixed amount.
pub fn compute_pricing(
    request: &PaymentRequest,
    profile: &StudentBillingProfile,
    fixed_amount_constant: Decimal,
) -> Result<PricingResult> {
    TuitionPricingPolicy::new(fixed_amount_constant)?.compute(request, profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tuition(due_month: u32, month: u32, day: u32) -> PaymentRequest {
        PaymentRequest {
            student_id: 1,
            concept: Concept::Tuition,
            due_month,
            payment_date: NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
            base_amount: dec!(1000),
        }
    }

    fn price(request: &PaymentRequest) -> PricingResult {
        compute_pricing(request, &StudentBillingProfile::standard(), dec!(150)).unwrap()
    }

    #[test]
    fn test_default_constant_is_150() {
        assert_eq!(TuitionPricingPolicy::default().fixed_amount(), dec!(150));
    }

    #[test]
    fn test_current_month_on_time_discount() {
        let result = price(&tuition(3, 3, 5));
        assert_eq!(result.discount, dec!(150));
        assert_eq!(result.surcharge, dec!(0));
        assert_eq!(result.final_amount, dec!(850));
        assert_eq!(result.adjustment, Adjustment::OnTimeDiscount);
    }

    #[test]
    fn test_current_month_surcharge() {
        let result = price(&tuition(3, 3, 20));
        assert_eq!(result.surcharge, dec!(150));
        assert_eq!(result.final_amount, dec!(1150));
        assert_eq!(result.adjustment, Adjustment::CurrentMonthSurcharge);
    }

    #[test]
    fn test_grace_window() {
        let result = price(&tuition(3, 3, 12));
        assert_eq!(result.final_amount, dec!(1000));
        assert_eq!(result.surcharge, dec!(0));
        assert_eq!(result.discount, dec!(0));
        assert_eq!(result.adjustment, Adjustment::GraceWindow);
    }

    #[test]
    fn test_late_payment_surcharge() {
        let result = price(&tuition(9, 10, 2));
        assert_eq!(result.surcharge, dec!(150));
        assert_eq!(result.final_amount, dec!(1150));
        assert_eq!(result.adjustment, Adjustment::LateSurcharge);
    }

    #[test]
    fn test_early_payment_discount() {
        let result = price(&tuition(10, 9, 15));
        assert_eq!(result.discount, dec!(150));
        assert_eq!(result.final_amount, dec!(850));
        assert_eq!(result.adjustment, Adjustment::EarlyDiscount);
    }

    #[test]
    fn test_timing_dominates_day_rules() {
        // Early payment on day 20 still gets the discount.
        assert_eq!(price(&tuition(10, 9, 20)).adjustment, Adjustment::EarlyDiscount);
        // Late payment on day 1 still gets the surcharge.
        assert_eq!(price(&tuition(9, 10, 1)).adjustment, Adjustment::LateSurcharge);
    }

    #[test]
    fn test_window_boundaries() {
        assert_eq!(price(&tuition(3, 3, 10)).adjustment, Adjustment::OnTimeDiscount);
        assert_eq!(price(&tuition(3, 3, 11)).adjustment, Adjustment::GraceWindow);
        assert_eq!(price(&tuition(3, 3, 15)).adjustment, Adjustment::GraceWindow);
        assert_eq!(price(&tuition(3, 3, 16)).adjustment, Adjustment::CurrentMonthSurcharge);
    }

    #[test]
    fn test_sibling_override_ignores_dates() {
        let profile = StudentBillingProfile::sibling(Some(dec!(500)));
        for request in [tuition(3, 3, 20), tuition(3, 3, 1), tuition(9, 10, 2), tuition(10, 9, 2)] {
            let result = compute_pricing(&request, &profile, dec!(150)).unwrap();
            assert_eq!(result.final_amount, dec!(500));
            assert_eq!(result.surcharge, dec!(0));
            assert_eq!(result.discount, dec!(0));
            assert_eq!(result.original_amount, dec!(1000));
            assert_eq!(result.adjustment, Adjustment::SiblingOverride);
        }
    }

    #[test]
    fn test_sibling_without_special_amount_is_exempt() {
        let profile = StudentBillingProfile::sibling(None);
        let result = compute_pricing(&tuition(3, 3, 20), &profile, dec!(150)).unwrap();
        assert_eq!(result.final_amount, dec!(1000));
        assert_eq!(result.adjustment, Adjustment::SiblingExempt);
    }

    #[test]
    fn test_sibling_without_rate_can_follow_standard_rules() {
        let policy = TuitionPricingPolicy::default()
            .with_sibling_without_rate(SiblingWithoutRate::StandardRules);
        let sibling = StudentBillingProfile::sibling(None);

        let result = policy.compute(&tuition(3, 3, 20), &sibling).unwrap();
        assert_eq!(result.final_amount, dec!(1150));
        assert_eq!(result.adjustment, Adjustment::CurrentMonthSurcharge);

        let result = policy.compute(&tuition(3, 3, 5), &sibling).unwrap();
        assert_eq!(result.final_amount, dec!(850));

        // 有特別價格時仍以特別價格為準
        let with_rate = StudentBillingProfile::sibling(Some(dec!(500)));
        let result = policy.compute(&tuition(3, 3, 20), &with_rate).unwrap();
        assert_eq!(result.final_amount, dec!(500));
        assert_eq!(result.adjustment, Adjustment::SiblingOverride);

        assert_eq!(
            TuitionPricingPolicy::default().sibling_without_rate(),
            SiblingWithoutRate::Exempt
        );
    }

    #[test]
    fn test_discount_is_capped_at_base_amount() {
        let mut request = tuition(3, 3, 5);
        request.base_amount = dec!(100);
        let result = price(&request);
        assert_eq!(result.discount, dec!(100));
        assert_eq!(result.final_amount, dec!(0));
        assert_eq!(result.adjustment, Adjustment::OnTimeDiscount);

        let mut request = tuition(10, 9, 1);
        request.base_amount = dec!(0);
        let result = price(&request);
        assert_eq!(result.discount, dec!(0));
        assert_eq!(result.final_amount, dec!(0));

        // 加價不受影響
        let mut request = tuition(3, 3, 20);
        request.base_amount = dec!(100);
        assert_eq!(price(&request).final_amount, dec!(250));
    }

    #[test]
    fn test_non_tuition_passes_through() {
        let profile = StudentBillingProfile::sibling(Some(dec!(500)));
        for concept in [Concept::Book, Concept::Enrollment, Concept::Other("uniforme".into())] {
            let mut request = tuition(3, 3, 20);
            request.concept = concept;
            let result = compute_pricing(&request, &profile, dec!(150)).unwrap();
            assert_eq!(result.final_amount, dec!(1000));
            assert_eq!(result.adjustment, Adjustment::NotTuition);
        }
    }

    #[test]
    fn test_surcharge_and_discount_are_exclusive() {
        for due_month in 1..=12 {
            for month in 1..=12 {
                for day in [1, 10, 11, 15, 16, 28] {
                    let result = price(&tuition(due_month, month, day));
                    assert!(result.surcharge.is_zero() || result.discount.is_zero());
                    assert_eq!(
                        result.final_amount,
                        result.original_amount + result.surcharge - result.discount
                    );
                }
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let request = tuition(3, 3, 20);
        assert_eq!(price(&request), price(&request));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let profile = StudentBillingProfile::standard();
        let mut request = tuition(3, 3, 5);
        request.due_month = 0;
        assert!(compute_pricing(&request, &profile, dec!(150)).is_err());

        let mut request = tuition(3, 3, 5);
        request.base_amount = dec!(-10);
        assert!(compute_pricing(&request, &profile, dec!(150)).is_err());

        assert!(compute_pricing(&tuition(3, 3, 5), &profile, dec!(-150)).is_err());
    }

    #[test]
    fn test_custom_day_windows() {
        let policy = TuitionPricingPolicy::with_day_windows(dec!(200), 5, 21).unwrap();
        let profile = StudentBillingProfile::standard();
        let result = policy.compute(&tuition(3, 3, 10), &profile).unwrap();
        assert_eq!(result.adjustment, Adjustment::GraceWindow);
        let result = policy.compute(&tuition(3, 3, 21), &profile).unwrap();
        assert_eq!(result.final_amount, dec!(1200));

        assert!(TuitionPricingPolicy::with_day_windows(dec!(150), 16, 10).is_err());
        assert!(TuitionPricingPolicy::with_day_windows(dec!(150), 0, 16).is_err());
        assert!(TuitionPricingPolicy::with_day_windows(dec!(150), 10, 32).is_err());
    }
}
