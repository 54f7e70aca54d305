use crate::domain::model::{
    BookAccount, BookInstallment, NewPreRegistration, NewStudent, PaymentRecord,
    PreRegistration, PreRegistrationStatus, SiblingWithoutRate, StudentProfileRecord,
    StudentRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Read side of the student registry.
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Returns an owned snapshot of the student's billing fields, or `None` if unknown.
    async fn profile(&self, student_id: i64) -> Result<Option<StudentProfileRecord>>;

    /// Fixed enrollment fee of the student's enrollment type, when one is configured.
    async fn enrollment_fee(&self, student_id: i64) -> Result<Option<Decimal>>;
}

/// Write side of the student registry.
#[async_trait]
pub trait StudentRegistry: Send + Sync {
    /// Registers a student; fails with `DuplicateStudent` when the national ID is taken.
    async fn register(&self, student: NewStudent) -> Result<StudentRecord>;
    /// Replaces a student's details; the national ID must stay unique.
    async fn update(&self, id: i64, details: NewStudent) -> Result<StudentRecord>;
    /// Soft delete: the student stays on file with `active = false`.
    async fn deactivate(&self, id: i64) -> Result<StudentRecord>;
    async fn active_students(&self) -> Result<Vec<StudentRecord>>;
}

/// Pre-registration (waitlist) store.
#[async_trait]
pub trait Waitlist: Send + Sync {
    async fn add(&self, entry: NewPreRegistration) -> Result<PreRegistration>;
    async fn pending(&self) -> Result<Vec<PreRegistration>>;
    async fn set_status(&self, id: i64, status: PreRegistrationStatus) -> Result<PreRegistration>;
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Stores the record and returns it with its assigned id.
    async fn record(&self, payment: PaymentRecord) -> Result<PaymentRecord>;
    async fn payments_for(&self, student_id: i64) -> Result<Vec<PaymentRecord>>;
}

#[async_trait]
pub trait BookLedger: Send + Sync {
    async fn book(&self, book_id: i64) -> Result<Option<BookAccount>>;
    async fn books_for(&self, student_id: i64) -> Result<Vec<BookAccount>>;
    /// Applies the installment atomically and returns the updated account.
    async fn apply_installment(&self, installment: BookInstallment) -> Result<BookAccount>;
    /// Undoes an installment applied by `apply_installment`.
    async fn revert_installment(&self, installment: BookInstallment) -> Result<BookAccount>;
}

pub trait PricingConfigProvider: Send + Sync {
    fn fixed_amount(&self) -> Decimal;
    fn discount_until_day(&self) -> u32;
    fn surcharge_from_day(&self) -> u32;
    fn default_enrollment_fee(&self) -> Decimal;
    fn sibling_without_rate(&self) -> SiblingWithoutRate {
        SiblingWithoutRate::default()
    }
}
