use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Venue not found: {slug}")]
    NotFound { slug: String },

    #[error("Venue store failure: {message}")]
    Store { message: String },

    #[error("Venue store did not respond within {timeout_ms}ms")]
    StoreTimeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Store,
    Configuration,
    Validation,
    System,
}

impl DiscoveryError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::NotFound { slug: slug.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Store { .. } | Self::StoreTimeout { .. } => ErrorCategory::Store,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// 對應的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::ValidationError { .. } => 400,
            Self::StoreTimeout { .. } => 504,
            _ => 500,
        }
    }

    /// 給呼叫端看的訊息，不洩漏儲存層細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound { .. } => "Venue not found".to_string(),
            Self::ValidationError { field, message } => {
                format!("Invalid value for '{}': {}", field, message)
            }
            Self::Store { .. } | Self::StoreTimeout { .. } => {
                "Failed to fetch venues, please try again later".to_string()
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            Self::IoError(_) | Self::SerializationError(_) => {
                "Something went wrong".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
