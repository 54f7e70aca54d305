use crate::config::{BillingConfig, CliConfig};
use crate::domain::model::{PaymentSubmission, StudentProfileRecord};
use crate::utils::error::{BillingError, Result};
use crate::utils::validation::{validate_required_field, Validate};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

impl CliConfig {
    /// 載入配置檔並套用命令列覆蓋設定
    pub fn billing_config(&self) -> Result<BillingConfig> {
        let mut config = match &self.config {
            Some(path) => BillingConfig::from_file(path)?,
            None => BillingConfig::default(),
        };

        if let Some(amount) = self.fixed_amount {
            config.pricing.fixed_amount = amount;
        }

        config.validate()?;
        Ok(config)
    }

    /// 單筆報價所需的付款資料
    pub fn submission(&self, year: Option<i32>) -> Result<PaymentSubmission> {
        let due_month = *validate_required_field("due_month", &self.due_month)?;
        let payment_date = validate_required_field("payment_date", &self.payment_date)?.clone();
        let base_amount = *validate_required_field("amount", &self.amount)?;

        Ok(PaymentSubmission {
            student_id: self.student_id,
            concept: self.concept.clone(),
            due_month,
            payment_date,
            base_amount,
            year,
            ..Default::default()
        })
    }

    pub fn profile_record(&self) -> StudentProfileRecord {
        StudentProfileRecord {
            student_id: self.student_id,
            is_sibling: Some(self.sibling),
            special_fixed_amount: self.special_amount,
        }
    }

    pub fn open_batch(&self) -> Result<Option<Box<dyn Read>>> {
        match &self.batch {
            Some(path) => {
                let file = File::open(path).map_err(|e| BillingError::InvalidConfigValueError {
                    field: "batch".to_string(),
                    value: path.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Some(Box::new(BufReader::new(file))))
            }
            None => Ok(None),
        }
    }

    pub fn open_output(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
            None => Ok(Box::new(io::stdout().lock())),
        }
    }
}
