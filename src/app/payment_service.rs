use std::sync::Arc;

use rust_decimal::Decimal;

use crate::core::debt::summarize_debt;
use crate::core::pricing::TuitionPricingPolicy;
use crate::domain::model::{
    BookInstallment, PaymentRecord, PaymentRequest, PaymentSubmission, PricingResult,
    StudentBillingProfile, StudentDebt,
};
use crate::domain::ports::{BookLedger, PaymentLedger, StudentDirectory};
use crate::utils::error::{BillingError, Result};

/// Prices and records payments against the student, payment and book stores.
pub struct PaymentService<D: StudentDirectory, P: PaymentLedger, B: BookLedger> {
    pub(crate) directory: Arc<D>,
    pub(crate) payments: Arc<P>,
    pub(crate) books: Arc<B>,
    pub(crate) policy: TuitionPricingPolicy,
    pub(crate) default_enrollment_fee: Decimal,
}

impl<S> PaymentService<S, S, S>
where
    S: StudentDirectory + PaymentLedger + BookLedger,
{
    pub fn from_store(
        store: Arc<S>,
        policy: TuitionPricingPolicy,
        default_enrollment_fee: Decimal,
    ) -> Self {
        Self::new(
            Arc::clone(&store),
            Arc::clone(&store),
            store,
            policy,
            default_enrollment_fee,
        )
    }
}

impl<D: StudentDirectory, P: PaymentLedger, B: BookLedger> PaymentService<D, P, B> {
    pub fn new(
        directory: Arc<D>,
        payments: Arc<P>,
        books: Arc<B>,
        policy: TuitionPricingPolicy,
        default_enrollment_fee: Decimal,
    ) -> Self {
        Self {
            directory,
            payments,
            books,
            policy,
            default_enrollment_fee,
        }
    }

    /// Reads the student's billing fields once; the policy only sees this snapshot.
    async fn profile_snapshot(&self, student_id: i64) -> Result<StudentBillingProfile> {
        let record = self
            .directory
            .profile(student_id)
            .await?
            .ok_or(BillingError::UnknownStudent { student_id })?;
        StudentBillingProfile::try_from(&record)
    }

    async fn price(&self, submission: &PaymentSubmission) -> Result<(PaymentRequest, PricingResult)> {
        let request = submission.to_request()?;
        let profile = self.profile_snapshot(request.student_id).await?;
        let pricing = self.policy.compute(&request, &profile)?;
        Ok((request, pricing))
    }

    /// Prices a submission without writing anything.
    pub async fn quote(&self, submission: &PaymentSubmission) -> Result<PricingResult> {
        let (_, pricing) = self.price(submission).await.inspect_err(|e| {
            tracing::warn!("⚠️ Quote rejected for student {}: {}", submission.student_id, e)
        })?;
        Ok(pricing)
    }

    pub async fn submit(&self, submission: PaymentSubmission) -> Result<PaymentRecord> {
        let (request, pricing) = self.price(&submission).await.inspect_err(|e| {
            tracing::warn!(
                "⚠️ Payment rejected for student {}: {}",
                submission.student_id,
                e
            )
        })?;

        // 書籍分期先原子性地套用，付款寫入失敗時再撤銷
        let installment = submission.book_id.map(|book_id| BookInstallment {
            book_id,
            amount: request.base_amount,
            date: request.payment_date,
            comments: submission.comments.clone(),
        });
        if let Some(installment) = &installment {
            let book = self.books.apply_installment(installment.clone()).await?;
            tracing::info!(
                "📚 Book {} balance now {} (paid {})",
                book.id,
                book.balance,
                book.paid
            );
        }

        let record = match self
            .payments
            .record(PaymentRecord::new(&submission, &request, &pricing))
            .await
        {
            Ok(record) => record,
            Err(e) => {
                if let Some(installment) = installment {
                    tracing::warn!(
                        "⚠️ Payment write failed, reverting installment on book {}: {}",
                        installment.book_id,
                        e
                    );
                    self.books.revert_installment(installment).await?;
                }
                return Err(e);
            }
        };

        tracing::info!(
            "💰 Recorded payment {} for student {}: {} {} -> {} ({})",
            record.id,
            record.student_id,
            record.concept,
            record.original_amount,
            record.final_amount,
            record.adjustment
        );

        Ok(record)
    }

    pub async fn student_debt(&self, student_id: i64) -> Result<StudentDebt> {
        if self.directory.profile(student_id).await?.is_none() {
            return Err(BillingError::UnknownStudent { student_id });
        }

        let payments = self.payments.payments_for(student_id).await?;
        let books = self.books.books_for(student_id).await?;
        let enrollment_fee = self.directory.enrollment_fee(student_id).await?;

        let debt = summarize_debt(&payments, &books, enrollment_fee, self.default_enrollment_fee);
        tracing::debug!(
            "Student {} owes {} (enrollment {}, books {})",
            student_id,
            debt.total,
            debt.enrollment_due,
            debt.books_due
        );
        Ok(debt)
    }
}
