use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::core::pricing::TuitionPricingPolicy;
use crate::domain::model::{Adjustment, PaymentRequest, StudentBillingProfile};
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{parse_date, parse_decimal};

#[derive(Debug, Deserialize)]
struct QuoteRow {
    student_id: i64,
    concept: String,
    due_month: u32,
    payment_date: String,
    base_amount: String,
    #[serde(default)]
    is_sibling: String,
    #[serde(default)]
    special_fixed_amount: String,
}

#[derive(Debug, Serialize)]
struct QuotedRow {
    student_id: i64,
    concept: String,
    due_month: u32,
    payment_date: NaiveDate,
    original_amount: Decimal,
    surcharge: Decimal,
    discount: Decimal,
    final_amount: Decimal,
    adjustment: Adjustment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub surcharged: usize,
    pub discounted: usize,
    pub total_final: Decimal,
}

fn parse_flag(field_name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "si" | "sí" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(BillingError::invalid_input(
            field_name,
            value,
            "Expected true/false",
        )),
    }
}

impl QuoteRow {
    fn into_inputs(self) -> Result<(PaymentRequest, StudentBillingProfile)> {
        let special_fixed_amount = if self.special_fixed_amount.trim().is_empty() {
            None
        } else {
            Some(parse_decimal("special_fixed_amount", &self.special_fixed_amount)?)
        };
        let profile = StudentBillingProfile {
            is_sibling: parse_flag("is_sibling", &self.is_sibling)?,
            special_fixed_amount,
        };
        let request = PaymentRequest {
            student_id: self.student_id,
            concept: self.concept.parse()?,
            due_month: self.due_month,
            payment_date: parse_date("payment_date", &self.payment_date)?,
            base_amount: parse_decimal("base_amount", &self.base_amount)?,
        };
        Ok((request, profile))
    }
}

/// Prices every row of a CSV batch and writes one result row per input row.
///
/// Input header: `student_id,concept,due_month,payment_date,base_amount,is_sibling,special_fixed_amount`.
/// The first invalid row aborts the batch; row numbers are 1-based data rows.
pub fn quote_csv<R: Read, W: Write>(
    input: R,
    output: W,
    policy: &TuitionPricingPolicy,
) -> Result<BatchSummary> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for (index, row) in reader.deserialize::<QuoteRow>().enumerate() {
        let row_number = index + 1;
        let priced = row
            .map_err(BillingError::from)
            .and_then(QuoteRow::into_inputs)
            .and_then(|(request, profile)| {
                policy
                    .compute(&request, &profile)
                    .map(|pricing| (request, pricing))
            })
            .map_err(|e| BillingError::BatchRowError {
                row: row_number,
                source: Box::new(e),
            })?;
        let (request, pricing) = priced;

        if !pricing.surcharge.is_zero() {
            summary.surcharged += 1;
        }
        if !pricing.discount.is_zero() {
            summary.discounted += 1;
        }
        summary.rows += 1;
        summary.total_final += pricing.final_amount;

        writer.serialize(QuotedRow {
            student_id: request.student_id,
            concept: request.concept.to_string(),
            due_month: request.due_month,
            payment_date: request.payment_date,
            original_amount: pricing.original_amount,
            surcharge: pricing.surcharge,
            discount: pricing.discount,
            final_amount: pricing.final_amount,
            adjustment: pricing.adjustment,
        })?;
    }

    writer.flush()?;
    tracing::info!(
        "📄 Quoted {} rows ({} surcharged, {} discounted)",
        summary.rows,
        summary.surcharged,
        summary.discounted
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "student_id,concept,due_month,payment_date,base_amount,is_sibling,special_fixed_amount\n";

    #[test]
    fn test_quote_csv_prices_each_row() {
        let input = format!(
            "{}{}{}{}",
            HEADER,
            "1,mensualidad,3,2024-03-05,1000,false,\n",
            "2,mensualidad,3,2024-03-20,1000,true,500\n",
            "3,libro,3,2024-03-20,450,false,\n"
        );
        let mut output = Vec::new();
        let summary =
            quote_csv(input.as_bytes(), &mut output, &TuitionPricingPolicy::default()).unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.discounted, 1);
        assert_eq!(summary.surcharged, 0);
        assert_eq!(summary.total_final, dec!(1800));

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "student_id,concept,due_month,payment_date,original_amount,surcharge,discount,final_amount,adjustment"
        );
        assert_eq!(lines[1], "1,mensualidad,3,2024-03-05,1000,0,150,850,on_time_discount");
        assert_eq!(lines[2], "2,mensualidad,3,2024-03-20,1000,0,0,500,sibling_override");
        assert_eq!(lines[3], "3,libro,3,2024-03-20,450,0,0,450,not_tuition");
    }

    #[test]
    fn test_quote_csv_reports_bad_row() {
        let input = format!(
            "{}{}{}",
            HEADER, "1,mensualidad,3,2024-03-05,1000,false,\n", "2,mensualidad,13,2024-03-05,1000,false,\n"
        );
        let mut output = Vec::new();
        let err = quote_csv(input.as_bytes(), &mut output, &TuitionPricingPolicy::default())
            .unwrap_err();
        assert!(matches!(err, BillingError::BatchRowError { row: 2, .. }));
    }

    #[test]
    fn test_quote_csv_requires_sibling_flag() {
        let input = format!("{}{}", HEADER, "1,mensualidad,3,2024-03-05,1000,,\n");
        let mut output = Vec::new();
        let err = quote_csv(input.as_bytes(), &mut output, &TuitionPricingPolicy::default())
            .unwrap_err();
        assert!(matches!(err, BillingError::BatchRowError { row: 1, .. }));
    }
}
