use anyhow::Context;
use clap::Parser;
use school_billing::core::batch::quote_csv;
use school_billing::domain::ports::PricingConfigProvider;
use school_billing::utils::error::{BillingError, ErrorSeverity};
use school_billing::utils::logger;
use school_billing::{CliConfig, InMemoryStore, PaymentService, TuitionPricingPolicy};
use std::sync::Arc;

fn exit_with(e: &BillingError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Billing failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入並驗證配置
    let config = match cli.billing_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting school-billing for {}", config.school.name);
    if let Some(amount) = cli.fixed_amount {
        tracing::info!("🔧 Fixed amount overridden to: {}", amount);
    }
    if cli.verbose {
        tracing::debug!("Billing config: {:?}", config);
    }

    let policy = TuitionPricingPolicy::from_config(&config)
        .context("pricing configuration is inconsistent")?;

    if let Some(input) = cli.open_batch().context("cannot open batch file")? {
        let output = cli.open_output().context("cannot open output")?;
        match quote_csv(input, output, &policy) {
            Ok(summary) => {
                tracing::info!(
                    "✅ Batch quoted: {} rows, total {}",
                    summary.rows,
                    summary.total_final
                );
            }
            Err(e) => exit_with(&e),
        }
        return Ok(());
    }

    let submission = match cli.submission(config.school.year) {
        Ok(submission) => submission,
        Err(e) => exit_with(&e),
    };

    let store = Arc::new(InMemoryStore::new());
    store.upsert_student(cli.profile_record()).await;
    let service = PaymentService::from_store(store, policy, config.default_enrollment_fee());

    match service.quote(&submission).await {
        Ok(pricing) => {
            println!("{}", serde_json::to_string_pretty(&pricing)?);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
