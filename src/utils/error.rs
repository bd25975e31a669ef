use thiserror::Error;

#[derive(Error, Debug)]
pub enum DailyReadError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    GitError(#[from] git2::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{message}")]
    ConnectionError { url: String, message: String },

    #[error("Data location error at {path}: {reason}")]
    DataLocationError { path: String, reason: String },

    #[error("{message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{0}")]
    ErrorsLogged(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Storage,
    Data,
    Reporting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DailyReadError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::ConnectionError { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::GitError(_) | Self::DataLocationError { .. } => {
                ErrorCategory::Storage
            }
            Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Data,
            Self::TemplateError(_) | Self::ErrorsLogged(_) => ErrorCategory::Reporting,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(_) | Self::ConnectionError { .. } => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. }
            | Self::SerializationError(_)
            | Self::TemplateError(_)
            | Self::ErrorsLogged(_) => ErrorSeverity::High,
            Self::IoError(_) | Self::GitError(_) | Self::DataLocationError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) => format!("Could not reach a remote service: {}", e),
            Self::ConnectionError { url, .. } => format!("Could not connect to {}", url),
            Self::MissingConfigError { field } => format!("Setting {} is required", field),
            Self::DataLocationError { path, reason } => {
                format!("Data location {} cannot be used: {}", path, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network access, service URLs and credentials, then rerun",
            ErrorCategory::Configuration => "Check the environment variables or the config file",
            ErrorCategory::Storage => {
                "Check that the data location is a git repository without stray changes"
            }
            ErrorCategory::Data => "Inspect the offending project or order in the source system",
            ErrorCategory::Reporting => "See the logged errors above; unreported projects are retried next run",
        }
    }
}

pub type Result<T> = std::result::Result<T, DailyReadError>;
