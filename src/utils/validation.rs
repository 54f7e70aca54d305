use crate::utils::error::{BillingError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Accepted payment date layouts. The first is what the front office sends.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

pub fn parse_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BillingError::invalid_input(field_name, value, "Date cannot be empty"));
    }

    // 時間戳只取日期部分 (例如 2024-03-05T00:00:00Z)
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .ok_or_else(|| {
            BillingError::invalid_input(
                field_name,
                value,
                format!("Unrecognized date, expected one of {}", DATE_FORMATS.join(", ")),
            )
        })
}

pub fn parse_decimal(field_name: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| BillingError::invalid_input(field_name, value, format!("Not a number: {}", e)))
}

pub fn validate_non_negative(field_name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(BillingError::invalid_input(
            field_name,
            value,
            "Amount cannot be negative",
        ));
    }
    Ok(())
}

pub fn validate_positive(field_name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(BillingError::invalid_input(
            field_name,
            value,
            "Amount must be greater than zero",
        ));
    }
    Ok(())
}

pub fn validate_month(field_name: &str, month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(BillingError::invalid_input(
            field_name,
            month,
            "Month must be between 1 and 12",
        ));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| {
        BillingError::invalid_input(field_name, "<missing>", "Field is required")
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BillingError::invalid_input(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(BillingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("payment_date", "2024-03-05").unwrap(), expected);
        assert_eq!(parse_date("payment_date", "05/03/2024").unwrap(), expected);
        assert_eq!(parse_date("payment_date", "2024-03-05T10:30:00Z").unwrap(), expected);
        assert!(parse_date("payment_date", "").is_err());
        assert!(parse_date("payment_date", "2024-02-30").is_err());
        assert!(parse_date("payment_date", "yesterday").is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_non_negative("base_amount", dec!(0)).is_ok());
        assert!(validate_non_negative("base_amount", dec!(1000)).is_ok());
        assert!(validate_non_negative("base_amount", dec!(-0.01)).is_err());
        assert!(validate_positive("amount", dec!(0)).is_err());
        assert!(parse_decimal("base_amount", "1000.50").is_ok());
        assert!(parse_decimal("base_amount", "mil").is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("due_month", 1).is_ok());
        assert!(validate_month("due_month", 12).is_ok());
        assert!(validate_month("due_month", 0).is_err());
        assert!(validate_month("due_month", 13).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(true);
        let missing: Option<bool> = None;
        assert!(validate_required_field("is_sibling", &present).is_ok());
        assert!(validate_required_field("is_sibling", &missing).is_err());
    }
}
