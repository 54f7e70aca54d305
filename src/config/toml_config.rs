use crate::core::pricing::{
    DEFAULT_DISCOUNT_UNTIL_DAY, DEFAULT_FIXED_AMOUNT, DEFAULT_SURCHARGE_FROM_DAY,
};
use crate::domain::model::SiblingWithoutRate;
use crate::domain::ports::PricingConfigProvider;
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ENROLLMENT_FEE: Decimal = Decimal::from_parts(3000, 0, 0, false, 0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub school: SchoolConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub enrollment: Option<EnrollmentConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolConfig {
    pub name: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_fixed_amount")]
    pub fixed_amount: Decimal,
    #[serde(default = "default_discount_until_day")]
    pub discount_until_day: u32,
    #[serde(default = "default_surcharge_from_day")]
    pub surcharge_from_day: u32,
    #[serde(default)]
    pub sibling_without_rate: SiblingWithoutRate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentConfig {
    pub default_fee: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

fn default_fixed_amount() -> Decimal {
    DEFAULT_FIXED_AMOUNT
}

fn default_discount_until_day() -> u32 {
    DEFAULT_DISCOUNT_UNTIL_DAY
}

fn default_surcharge_from_day() -> u32 {
    DEFAULT_SURCHARGE_FROM_DAY
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            fixed_amount: DEFAULT_FIXED_AMOUNT,
            discount_until_day: DEFAULT_DISCOUNT_UNTIL_DAY,
            surcharge_from_day: DEFAULT_SURCHARGE_FROM_DAY,
            sibling_without_rate: SiblingWithoutRate::default(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            school: SchoolConfig {
                name: "school".to_string(),
                year: None,
            },
            pricing: PricingConfig::default(),
            enrollment: None,
            logging: None,
        }
    }
}

impl BillingConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BillingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BillingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SURCHARGE_AMOUNT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BillingError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("school.name", &self.school.name)?;

        if self.pricing.fixed_amount.is_sign_negative() && !self.pricing.fixed_amount.is_zero() {
            return Err(BillingError::InvalidConfigValueError {
                field: "pricing.fixed_amount".to_string(),
                value: self.pricing.fixed_amount.to_string(),
                reason: "Amount cannot be negative".to_string(),
            });
        }

        validate_range("pricing.discount_until_day", self.pricing.discount_until_day, 1, 31)?;
        validate_range("pricing.surcharge_from_day", self.pricing.surcharge_from_day, 1, 31)?;
        if self.pricing.discount_until_day >= self.pricing.surcharge_from_day {
            return Err(BillingError::InvalidConfigValueError {
                field: "pricing.discount_until_day".to_string(),
                value: self.pricing.discount_until_day.to_string(),
                reason: format!(
                    "Must be lower than pricing.surcharge_from_day ({})",
                    self.pricing.surcharge_from_day
                ),
            });
        }

        if let Some(enrollment) = &self.enrollment {
            if enrollment.default_fee.is_sign_negative() && !enrollment.default_fee.is_zero() {
                return Err(BillingError::InvalidConfigValueError {
                    field: "enrollment.default_fee".to_string(),
                    value: enrollment.default_fee.to_string(),
                    reason: "Amount cannot be negative".to_string(),
                });
            }
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(BillingError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl PricingConfigProvider for BillingConfig {
    fn fixed_amount(&self) -> Decimal {
        self.pricing.fixed_amount
    }

    fn discount_until_day(&self) -> u32 {
        self.pricing.discount_until_day
    }

    fn surcharge_from_day(&self) -> u32 {
        self.pricing.surcharge_from_day
    }

    fn default_enrollment_fee(&self) -> Decimal {
        self.enrollment
            .as_ref()
            .map(|e| e.default_fee)
            .unwrap_or(DEFAULT_ENROLLMENT_FEE)
    }

    fn sibling_without_rate(&self) -> SiblingWithoutRate {
        self.pricing.sibling_without_rate
    }
}

impl Validate for BillingConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
