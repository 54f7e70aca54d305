use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::model::{
    BookAccount, BookInstallment, NewPreRegistration, NewStudent, PaymentRecord,
    PreRegistration, PreRegistrationStatus, StudentProfileRecord, StudentRecord,
};
use crate::domain::ports::{BookLedger, PaymentLedger, StudentDirectory, StudentRegistry, Waitlist};
use crate::utils::validation::Validate;
use crate::utils::error::{BillingError, Result};

/// In-process store backing the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    students: RwLock<HashMap<i64, StudentProfileRecord>>,
    enrollment_fees: RwLock<HashMap<i64, Decimal>>,
    payments: RwLock<Vec<PaymentRecord>>,
    books: RwLock<HashMap<i64, BookAccount>>,
    installments: RwLock<Vec<BookInstallment>>,
    registry: RwLock<HashMap<i64, StudentRecord>>,
    pre_registrations: RwLock<HashMap<i64, PreRegistration>>,
    next_payment_id: AtomicI64,
    next_student_id: AtomicI64,
    next_pre_registration_id: AtomicI64,
}

fn normalize_national_id(national_id: &str) -> String {
    national_id.trim().to_uppercase()
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_student(&self, record: StudentProfileRecord) {
        let mut students = self.students.write().await;
        students.insert(record.student_id, record);
    }

    pub async fn set_enrollment_fee(&self, student_id: i64, fee: Decimal) {
        let mut fees = self.enrollment_fees.write().await;
        fees.insert(student_id, fee);
    }

    pub async fn add_book(&self, book: BookAccount) {
        let mut books = self.books.write().await;
        books.insert(book.id, book);
    }

    pub async fn installments_for(&self, book_id: i64) -> Vec<BookInstallment> {
        let installments = self.installments.read().await;
        installments
            .iter()
            .filter(|i| i.book_id == book_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StudentDirectory for InMemoryStore {
    async fn profile(&self, student_id: i64) -> Result<Option<StudentProfileRecord>> {
        let students = self.students.read().await;
        Ok(students.get(&student_id).cloned())
    }

    async fn enrollment_fee(&self, student_id: i64) -> Result<Option<Decimal>> {
        let fees = self.enrollment_fees.read().await;
        Ok(fees.get(&student_id).copied())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn record(&self, mut payment: PaymentRecord) -> Result<PaymentRecord> {
        payment.id = self.next_payment_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut payments = self.payments.write().await;
        payments.push(payment.clone());
        Ok(payment)
    }

    async fn payments_for(&self, student_id: i64) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        let mut found: Vec<PaymentRecord> = payments
            .iter()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect();
        // 最新的付款在前
        found.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(found)
    }
}

#[async_trait]
impl BookLedger for InMemoryStore {
    async fn book(&self, book_id: i64) -> Result<Option<BookAccount>> {
        let books = self.books.read().await;
        Ok(books.get(&book_id).cloned())
    }

    async fn books_for(&self, student_id: i64) -> Result<Vec<BookAccount>> {
        let books = self.books.read().await;
        let mut found: Vec<BookAccount> = books
            .values()
            .filter(|b| b.student_id == student_id)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.id);
        Ok(found)
    }

    async fn apply_installment(&self, installment: BookInstallment) -> Result<BookAccount> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(&installment.book_id)
            .ok_or(BillingError::UnknownBook {
                book_id: installment.book_id,
            })?;
        book.apply_installment(installment.amount)?;
        let updated = book.clone();
        drop(books);

        let mut installments = self.installments.write().await;
        installments.push(installment);
        Ok(updated)
    }

    async fn revert_installment(&self, installment: BookInstallment) -> Result<BookAccount> {
        let mut books = self.books.write().await;
        let book = books
            .get_mut(&installment.book_id)
            .ok_or(BillingError::UnknownBook {
                book_id: installment.book_id,
            })?;
        book.revert_installment(installment.amount)?;
        let updated = book.clone();
        drop(books);

        let mut installments = self.installments.write().await;
        if let Some(position) = installments.iter().rposition(|i| *i == installment) {
            installments.remove(position);
        }
        Ok(updated)
    }
}

impl InMemoryStore {
    /// 檢查身分證號是否已被其他學生使用
    fn ensure_unique_national_id(
        registry: &HashMap<i64, StudentRecord>,
        details: &NewStudent,
        except: Option<i64>,
    ) -> Result<()> {
        let taken = registry.values().any(|s| {
            Some(s.id) != except && s.details.national_id == details.national_id
        });
        if taken {
            return Err(BillingError::DuplicateStudent {
                national_id: details.national_id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StudentRegistry for InMemoryStore {
    async fn register(&self, mut student: NewStudent) -> Result<StudentRecord> {
        student.validate()?;
        student.national_id = normalize_national_id(&student.national_id);

        // 檢查與寫入在同一把寫鎖內完成
        let mut registry = self.registry.write().await;
        Self::ensure_unique_national_id(&registry, &student, None)?;
        let record = StudentRecord {
            id: self.next_student_id.fetch_add(1, Ordering::SeqCst) + 1,
            details: student,
            active: true,
        };
        registry.insert(record.id, record.clone());
        drop(registry);

        self.upsert_student(record.profile()).await;
        tracing::info!("🎒 Registered student {} ({})", record.id, record.details.name);
        Ok(record)
    }

    async fn update(&self, id: i64, mut details: NewStudent) -> Result<StudentRecord> {
        details.validate()?;
        details.national_id = normalize_national_id(&details.national_id);

        let mut registry = self.registry.write().await;
        Self::ensure_unique_national_id(&registry, &details, Some(id))?;
        let record = registry
            .get_mut(&id)
            .ok_or(BillingError::UnknownStudent { student_id: id })?;
        record.details = details;
        let updated = record.clone();
        drop(registry);

        self.upsert_student(updated.profile()).await;
        Ok(updated)
    }

    async fn deactivate(&self, id: i64) -> Result<StudentRecord> {
        let mut registry = self.registry.write().await;
        let record = registry
            .get_mut(&id)
            .ok_or(BillingError::UnknownStudent { student_id: id })?;
        record.active = false;
        tracing::info!("🗃️ Student {} deactivated", id);
        Ok(record.clone())
    }

    async fn active_students(&self) -> Result<Vec<StudentRecord>> {
        let registry = self.registry.read().await;
        let mut found: Vec<StudentRecord> =
            registry.values().filter(|s| s.active).cloned().collect();
        found.sort_by(|a, b| a.details.name.cmp(&b.details.name));
        Ok(found)
    }
}

#[async_trait]
impl Waitlist for InMemoryStore {
    async fn add(&self, entry: NewPreRegistration) -> Result<PreRegistration> {
        entry.validate()?;
        let id = self.next_pre_registration_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = PreRegistration::new(id, entry);
        let mut entries = self.pre_registrations.write().await;
        entries.insert(id, created.clone());
        Ok(created)
    }

    async fn pending(&self) -> Result<Vec<PreRegistration>> {
        let entries = self.pre_registrations.read().await;
        let mut found: Vec<PreRegistration> = entries
            .values()
            .filter(|e| e.status == PreRegistrationStatus::Pending)
            .cloned()
            .collect();
        // 先到先排
        found.sort_by_key(|e| e.id);
        Ok(found)
    }

    async fn set_status(&self, id: i64, status: PreRegistrationStatus) -> Result<PreRegistration> {
        let mut entries = self.pre_registrations.write().await;
        let entry = entries
            .get_mut(&id)
            .ok_or(BillingError::UnknownPreRegistration { id })?;
        entry.transition(status)?;
        tracing::info!("📋 Pre-registration {} is now {}", id, status);
        Ok(entry.clone())
    }
}
