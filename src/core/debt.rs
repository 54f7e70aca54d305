use rust_decimal::Decimal;

use crate::domain::model::{BookAccount, Concept, PaymentRecord, StudentDebt};

/// Outstanding debt shown on a student's file.
///
/// Enrollment is owed in full until an enrollment payment exists; the amount is the
/// student's enrollment type fee when known, otherwise `default_enrollment_fee`.
/// Book debt is the sum of open balances.
pub fn summarize_debt(
    payments: &[PaymentRecord],
    books: &[BookAccount],
    enrollment_fee: Option<Decimal>,
    default_enrollment_fee: Decimal,
) -> StudentDebt {
    let enrollment_paid = payments.iter().any(|p| p.concept == Concept::Enrollment);
    let enrollment_due = if enrollment_paid {
        Decimal::ZERO
    } else {
        enrollment_fee.unwrap_or(default_enrollment_fee)
    };

    let books_due: Decimal = books.iter().map(|b| b.balance).sum();

    StudentDebt {
        enrollment_due,
        books_due,
        total: enrollment_due + books_due,
    }
}
