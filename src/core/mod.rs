pub mod batch;
pub mod debt;
pub mod pricing;

pub use crate::domain::model::{PaymentRequest, PricingResult, StudentBillingProfile};
pub use crate::domain::ports::{BookLedger, PaymentLedger, PricingConfigProvider, StudentDirectory};
pub use crate::utils::error::Result;
