use crate::domain::model::TermCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Registrar request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Fetch failed for term {term}: {message}")]
    FetchFailure { term: TermCode, message: String },

    #[error("Listing store error: {message}")]
    StoreError { message: String },

    #[error("Term {term} is not present in the configured term order")]
    UnknownTerm { term: TermCode },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CatalogError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CatalogError::ApiError(_) | CatalogError::FetchFailure { .. } => ErrorCategory::Network,
            CatalogError::IoError(_) | CatalogError::StoreError { .. } => ErrorCategory::Storage,
            CatalogError::UnknownTerm { .. }
            | CatalogError::ConfigValidationError { .. }
            | CatalogError::InvalidConfigValueError { .. }
            | CatalogError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CatalogError::SerializationError(_) | CatalogError::ValidationError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤可重試
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CatalogError::ApiError(_) | CatalogError::FetchFailure { .. } => {
                "Check the registrar endpoint, the bearer token and network connectivity, then rerun the term"
            }
            CatalogError::IoError(_) => "Check that the configured paths exist and are writable",
            CatalogError::StoreError { .. } => {
                "Inspect the listing store; no mutation was applied for the failed read"
            }
            CatalogError::SerializationError(_) => {
                "Verify the input is a JSON array of course records"
            }
            CatalogError::UnknownTerm { .. } => "Add the term to [terms].order in the configuration",
            CatalogError::ConfigValidationError { .. }
            | CatalogError::InvalidConfigValueError { .. }
            | CatalogError::MissingConfigError { .. } => "Fix the configuration file and try again",
            CatalogError::ValidationError { .. } => "Check the input value format",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CatalogError::ApiError(_) | CatalogError::FetchFailure { .. } => {
                format!("Could not fetch registrar data: {}", self)
            }
            CatalogError::StoreError { .. } | CatalogError::IoError(_) => {
                format!("Could not access the listing store: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
