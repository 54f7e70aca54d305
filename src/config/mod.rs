#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::BillingConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use rust_decimal::Decimal;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "school-billing")]
#[command(about = "Quote tuition payments with the school's surcharge/discount policy")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the surcharge/discount amount from config
    #[arg(long)]
    pub fixed_amount: Option<Decimal>,

    /// CSV file with payments to quote in batch
    #[arg(long)]
    pub batch: Option<String>,

    /// Where to write batch results (stdout when omitted)
    #[arg(long)]
    pub output: Option<String>,

    #[arg(long, default_value = "0")]
    pub student_id: i64,

    #[arg(long, default_value = "mensualidad")]
    pub concept: String,

    /// Month the payment covers (1-12)
    #[arg(long)]
    pub due_month: Option<u32>,

    /// Date the payment is made, e.g. 2024-03-05
    #[arg(long)]
    pub payment_date: Option<String>,

    #[arg(long)]
    pub amount: Option<Decimal>,

    #[arg(long, help = "Student is a sibling of another enrollee")]
    pub sibling: bool,

    /// Negotiated sibling rate
    #[arg(long)]
    pub special_amount: Option<Decimal>,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
