use thiserror::Error;

#[derive(Error, Debug)]
pub enum RssError {
    #[error("Bluesky API {status} {reason}: {body}")]
    FetchError {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML write error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing {field} value")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
}

impl RssError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RssError::ConfigError { .. }
            | RssError::InvalidConfigValueError { .. }
            | RssError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RssError::FetchError { .. } | RssError::ApiError(_) => ErrorCategory::Network,
            RssError::IoError(_) => ErrorCategory::Storage,
            RssError::SerializationError(_) | RssError::XmlError(_) => ErrorCategory::Data,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            RssError::ApiError(e) if e.is_timeout() => {
                "Request to the Bluesky API timed out".to_string()
            }
            RssError::ApiError(e) if e.is_connect() => {
                format!("Could not connect to the Bluesky API: {}", e)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RssError::FetchError { status: 400, .. } => {
                "Check that the handle exists and is spelled correctly"
            }
            RssError::FetchError { status: 429, .. } => "Rate limited, wait a moment and retry",
            RssError::FetchError { .. } | RssError::ApiError(_) => {
                "Check network connectivity and the --api-base value"
            }
            RssError::IoError(_) => "Check that the output path is writable",
            RssError::SerializationError(_) => "The API response had an unexpected shape",
            RssError::XmlError(_) => "Re-run with --verbose and report the failing item",
            RssError::ConfigError { .. }
            | RssError::InvalidConfigValueError { .. }
            | RssError::MissingConfigError { .. } => "Run with --help to see valid options",
        }
    }
}

pub type Result<T> = std::result::Result<T, RssError>;
