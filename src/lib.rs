pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::BillingConfig;

pub use adapters::InMemoryStore;
pub use app::PaymentService;
pub use core::pricing::{compute_pricing, TuitionPricingPolicy};
pub use domain::model::{
    Adjustment, Concept, PaymentRequest, PaymentSubmission, PricingResult, SiblingWithoutRate,
    StudentBillingProfile,
};
pub use utils::error::{BillingError, Result};
