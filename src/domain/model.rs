use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{
    parse_date, validate_month, validate_non_empty_string, validate_non_negative,
    validate_positive, validate_required_field, Validate,
};

/// What a payment is for. Stored under the Spanish names used by the front office.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Concept {
    Tuition,
    Enrollment,
    Book,
    Other(String),
}

impl Concept {
    pub fn as_str(&self) -> &str {
        match self {
            Concept::Tuition => "mensualidad",
            Concept::Enrollment => "matricula",
            Concept::Book => "libro",
            Concept::Other(name) => name,
        }
    }
}

impl FromStr for Concept {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        validate_non_empty_string("concept", s)?;
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "mensualidad" | "tuition" => Concept::Tuition,
            "matricula" | "matrícula" | "enrollment" => Concept::Enrollment,
            "libro" | "book" => Concept::Book,
            _ => Concept::Other(normalized),
        })
    }
}

impl TryFrom<String> for Concept {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Concept> for String {
    fn from(concept: Concept) -> Self {
        concept.as_str().to_string()
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment as it arrives from the front office, before any validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSubmission {
    #[serde(alias = "alumno_id")]
    pub student_id: i64,
    #[serde(alias = "concepto")]
    pub concept: String,
    #[serde(alias = "mes")]
    pub due_month: u32,
    #[serde(alias = "fecha_pago")]
    pub payment_date: String,
    #[serde(alias = "monto")]
    pub base_amount: Decimal,
    #[serde(default, alias = "año")]
    pub year: Option<i32>,
    #[serde(default, alias = "comentarios")]
    pub comments: Option<String>,
    #[serde(default, alias = "usuario")]
    pub user: Option<String>,
    #[serde(default, alias = "cuota_n")]
    pub installment_number: Option<u32>,
    #[serde(default, alias = "total_cuotas")]
    pub total_installments: Option<u32>,
    #[serde(default, alias = "metodo_pago")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "libro_id")]
    pub book_id: Option<i64>,
}

impl PaymentSubmission {
    pub fn to_request(&self) -> Result<PaymentRequest> {
        let request = PaymentRequest {
            student_id: self.student_id,
            concept: self.concept.parse()?,
            due_month: self.due_month,
            payment_date: parse_date("payment_date", &self.payment_date)?,
            base_amount: self.base_amount,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Validated input to the pricing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub student_id: i64,
    pub concept: Concept,
    pub due_month: u32,
    pub payment_date: NaiveDate,
    pub base_amount: Decimal,
}

impl Validate for PaymentRequest {
    fn validate(&self) -> Result<()> {
        validate_month("due_month", self.due_month)?;
        validate_non_negative("base_amount", self.base_amount)?;
        Ok(())
    }
}

/// Student row as stored; `is_sibling` may be NULL in legacy data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProfileRecord {
    #[serde(alias = "id")]
    pub student_id: i64,
    #[serde(alias = "es_hermano")]
    pub is_sibling: Option<bool>,
    #[serde(default, alias = "precio_especial")]
    pub special_fixed_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentBillingProfile {
    pub is_sibling: bool,
    pub special_fixed_amount: Option<Decimal>,
}

impl StudentBillingProfile {
    pub fn standard() -> Self {
        Self {
            is_sibling: false,
            special_fixed_amount: None,
        }
    }

    pub fn sibling(special_fixed_amount: Option<Decimal>) -> Self {
        Self {
            is_sibling: true,
            special_fixed_amount,
        }
    }

    /// Fixed rate that replaces standard pricing, if this profile has one.
    pub fn override_amount(&self) -> Option<Decimal> {
        if self.is_sibling {
            self.special_fixed_amount
        } else {
            None
        }
    }
}

impl TryFrom<&StudentProfileRecord> for StudentBillingProfile {
    type Error = BillingError;

    fn try_from(record: &StudentProfileRecord) -> Result<Self> {
        let is_sibling = *validate_required_field("is_sibling", &record.is_sibling)?;
        if let Some(amount) = record.special_fixed_amount {
            validate_non_negative("special_fixed_amount", amount)?;
        }
        Ok(Self {
            is_sibling,
            special_fixed_amount: record.special_fixed_amount,
        })
    }
}

impl Validate for StudentBillingProfile {
    fn validate(&self) -> Result<()> {
        if let Some(amount) = self.special_fixed_amount {
            validate_non_negative("special_fixed_amount", amount)?;
        }
        Ok(())
    }
}

/// How tuition is priced for a sibling who has no negotiated rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingWithoutRate {
    /// Base amount, no surcharge or discount.
    #[default]
    Exempt,
    /// Same timing rules as any other student.
    StandardRules,
}

/// When a payment was made relative to the month it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    Early,
    Current,
    Late,
}

/// The pricing rule that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    NotTuition,
    SiblingOverride,
    SiblingExempt,
    EarlyDiscount,
    OnTimeDiscount,
    GraceWindow,
    CurrentMonthSurcharge,
    LateSurcharge,
}

impl Adjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Adjustment::NotTuition => "not_tuition",
            Adjustment::SiblingOverride => "sibling_override",
            Adjustment::SiblingExempt => "sibling_exempt",
            Adjustment::EarlyDiscount => "early_discount",
            Adjustment::OnTimeDiscount => "on_time_discount",
            Adjustment::GraceWindow => "grace_window",
            Adjustment::CurrentMonthSurcharge => "current_month_surcharge",
            Adjustment::LateSurcharge => "late_surcharge",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub final_amount: Decimal,
    pub surcharge: Decimal,
    pub discount: Decimal,
    pub original_amount: Decimal,
    pub adjustment: Adjustment,
}

impl PricingResult {
    pub fn unadjusted(base_amount: Decimal, adjustment: Adjustment) -> Self {
        Self {
            final_amount: base_amount,
            surcharge: Decimal::ZERO,
            discount: Decimal::ZERO,
            original_amount: base_amount,
            adjustment,
        }
    }
}

/// Persisted payment. Written once at submission and never repriced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    #[serde(rename = "alumno_id")]
    pub student_id: i64,
    #[serde(rename = "concepto")]
    pub concept: Concept,
    #[serde(rename = "mes")]
    pub due_month: u32,
    #[serde(rename = "año")]
    pub year: Option<i32>,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "monto_original")]
    pub original_amount: Decimal,
    #[serde(rename = "recargo")]
    pub surcharge: Decimal,
    #[serde(rename = "descuento")]
    pub discount: Decimal,
    #[serde(rename = "monto_final")]
    pub final_amount: Decimal,
    #[serde(rename = "fecha_pago")]
    pub payment_date: NaiveDate,
    pub adjustment: Adjustment,
    #[serde(rename = "comentarios")]
    pub comments: Option<String>,
    #[serde(rename = "usuario")]
    pub user: Option<String>,
    #[serde(rename = "cuota_n")]
    pub installment_number: Option<u32>,
    #[serde(rename = "total_cuotas")]
    pub total_installments: Option<u32>,
    #[serde(rename = "metodo_pago")]
    pub payment_method: Option<String>,
    #[serde(rename = "libro_id")]
    pub book_id: Option<i64>,
}

impl PaymentRecord {
    /// Builds an unsaved record (`id` 0); the ledger assigns the id.
    pub fn new(
        submission: &PaymentSubmission,
        request: &PaymentRequest,
        pricing: &PricingResult,
    ) -> Self {
        Self {
            id: 0,
            student_id: request.student_id,
            concept: request.concept.clone(),
            due_month: request.due_month,
            year: submission.year,
            amount: request.base_amount,
            original_amount: pricing.original_amount,
            surcharge: pricing.surcharge,
            discount: pricing.discount,
            final_amount: pricing.final_amount,
            payment_date: request.payment_date,
            adjustment: pricing.adjustment,
            comments: submission.comments.clone(),
            user: submission.user.clone(),
            installment_number: submission.installment_number,
            total_installments: submission.total_installments,
            payment_method: submission.payment_method.clone(),
            book_id: submission.book_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstallment {
    #[serde(rename = "libro_id")]
    pub book_id: i64,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "comentarios")]
    pub comments: Option<String>,
}

/// Student as submitted for registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    #[serde(default, alias = "numero_anual")]
    pub annual_number: Option<i32>,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "cedula")]
    pub national_id: String,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "nivel_id")]
    pub level_id: Option<i64>,
    #[serde(default, alias = "tipo_matricula_id")]
    pub enrollment_type_id: Option<i64>,
    #[serde(default, alias = "fecha_inscripcion")]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(default, alias = "es_hermano")]
    pub is_sibling: bool,
    #[serde(default, alias = "precio_especial")]
    pub special_fixed_amount: Option<Decimal>,
    #[serde(default, alias = "observaciones")]
    pub notes: Option<String>,
}

impl Validate for NewStudent {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_non_empty_string("national_id", &self.national_id)?;
        if let Some(amount) = self.special_fixed_amount {
            validate_non_negative("special_fixed_amount", amount)?;
        }
        Ok(())
    }
}

/// Registered student. Removal only clears `active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewStudent,
    #[serde(rename = "activo")]
    pub active: bool,
}

impl StudentRecord {
    pub fn profile(&self) -> StudentProfileRecord {
        StudentProfileRecord {
            student_id: self.id,
            is_sibling: Some(self.details.is_sibling),
            special_fixed_amount: self.details.special_fixed_amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreRegistrationStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "inscrito")]
    Enrolled,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl fmt::Display for PreRegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PreRegistrationStatus::Pending => "pendiente",
            PreRegistrationStatus::Enrolled => "inscrito",
            PreRegistrationStatus::Cancelled => "cancelado",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPreRegistration {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "nivel_interes")]
    pub level_of_interest: Option<String>,
    #[serde(default, alias = "observaciones")]
    pub notes: Option<String>,
}

impl Validate for NewPreRegistration {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)
    }
}

/// Waitlist entry. Starts `Pending` and is resolved exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreRegistration {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewPreRegistration,
    #[serde(rename = "estado")]
    pub status: PreRegistrationStatus,
}

impl PreRegistration {
    pub fn new(id: i64, details: NewPreRegistration) -> Self {
        Self {
            id,
            details,
            status: PreRegistrationStatus::Pending,
        }
    }

    pub fn transition(&mut self, to: PreRegistrationStatus) -> Result<()> {
        if self.status != PreRegistrationStatus::Pending || to == PreRegistrationStatus::Pending {
            return Err(BillingError::InvalidStatusTransition {
                id: self.id,
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Textbook bought on installments. `paid + balance == total_cost` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAccount {
    pub id: i64,
    #[serde(rename = "alumno_id")]
    pub student_id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "costo_total")]
    pub total_cost: Decimal,
    #[serde(rename = "abonado")]
    pub paid: Decimal,
    #[serde(rename = "saldo")]
    pub balance: Decimal,
}

impl BookAccount {
    pub fn new(
        id: i64,
        student_id: i64,
        title: impl Into<String>,
        total_cost: Decimal,
    ) -> Result<Self> {
        validate_non_negative("total_cost", total_cost)?;
        Ok(Self {
            id,
            student_id,
            title: title.into(),
            total_cost,
            paid: Decimal::ZERO,
            balance: total_cost,
        })
    }

    pub fn apply_installment(&mut self, amount: Decimal) -> Result<()> {
        validate_positive("amount", amount)?;
        if amount > self.balance {
            return Err(BillingError::invalid_input(
                "amount",
                amount,
                format!("Installment exceeds the open balance of {}", self.balance),
            ));
        }
        self.paid += amount;
        self.balance -= amount;
        Ok(())
    }

    pub fn revert_installment(&mut self, amount: Decimal) -> Result<()> {
        validate_positive("amount", amount)?;
        if amount > self.paid {
            return Err(BillingError::invalid_input(
                "amount",
                amount,
                format!("Cannot revert more than the {} already paid", self.paid),
            ));
        }
        self.paid -= amount;
        self.balance += amount;
        Ok(())
    }

    pub fn is_settled(&self) -> bool {
        self.balance.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDebt {
    pub enrollment_due: Decimal,
    pub books_due: Decimal,
    pub total: Decimal,
}
