use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invalid input for '{field}' ({value}): {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown student: {student_id}")]
    UnknownStudent { student_id: i64 },

    #[error("Unknown book: {book_id}")]
    UnknownBook { book_id: i64 },

    #[error("A student with national ID {national_id} is already registered")]
    DuplicateStudent { national_id: String },

    #[error("Unknown pre-registration: {id}")]
    UnknownPreRegistration { id: i64 },

    #[error("Pre-registration {id} cannot move from {from} to {to}")]
    InvalidStatusTransition { id: i64, from: String, to: String },

    #[error("Batch row {row} rejected: {source}")]
    BatchRowError {
        row: usize,
        #[source]
        source: Box<BillingError>,
    },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Configuration,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BillingError {
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        BillingError::InvalidInput {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BillingError::InvalidInput { .. }
            | BillingError::DuplicateStudent { .. }
            | BillingError::InvalidStatusTransition { .. } => ErrorCategory::Input,
            BillingError::BatchRowError { source, .. } => source.category(),
            BillingError::UnknownStudent { .. }
            | BillingError::UnknownBook { .. }
            | BillingError::UnknownPreRegistration { .. } => ErrorCategory::Lookup,
            BillingError::StorageError { .. } => ErrorCategory::Storage,
            BillingError::ConfigValidationError { .. }
            | BillingError::InvalidConfigValueError { .. }
            | BillingError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BillingError::IoError(_)
            | BillingError::CsvError(_)
            | BillingError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Lookup => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BillingError::InvalidInput { field, .. } => {
                format!("Correct the '{}' field and submit the payment again", field)
            }
            BillingError::DuplicateStudent { national_id } => format!(
                "Look up the existing student with national ID {} instead of registering again",
                national_id
            ),
            BillingError::UnknownPreRegistration { id } => {
                format!("Check that pre-registration {} exists", id)
            }
            BillingError::InvalidStatusTransition { .. } => {
                "Only pending pre-registrations can be enrolled or cancelled".to_string()
            }
            BillingError::BatchRowError { row, .. } => {
                format!("Fix row {} of the batch file and rerun it", row)
            }
            BillingError::UnknownStudent { student_id } => format!(
                "Check that student {} is registered and active before recording payments",
                student_id
            ),
            BillingError::UnknownBook { book_id } => {
                format!("Register book {} for the student before paying installments", book_id)
            }
            BillingError::StorageError { .. } => {
                "The billing store is unavailable; retry once it is reachable".to_string()
            }
            BillingError::ConfigValidationError { .. }
            | BillingError::InvalidConfigValueError { .. }
            | BillingError::MissingConfigError { .. } => {
                "Review the billing configuration file".to_string()
            }
            BillingError::IoError(_) => "Check file paths and permissions".to_string(),
            BillingError::CsvError(_) => {
                "Make sure the batch file is a CSV with the expected header".to_string()
            }
            BillingError::SerializationError(_) => "Check the JSON payload".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BillingError::InvalidInput { field, reason, .. } => {
                format!("The payment could not be processed: {} ({})", reason, field)
            }
            BillingError::BatchRowError { row, source } => {
                format!("Row {}: {}", row, source.user_friendly_message())
            }
            BillingError::UnknownStudent { student_id } => {
                format!("Student {} was not found", student_id)
            }
            BillingError::UnknownBook { book_id } => format!("Book {} was not found", book_id),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
