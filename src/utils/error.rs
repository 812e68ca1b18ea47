use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("{message}")]
    ImageError { message: String },

    #[error("{message}")]
    ExtractionError { message: String },

    #[error("{message}")]
    ParseError { message: String, raw: String },

    #[error("{message}")]
    DistanceError { message: String },

    #[error("{message}")]
    BrowserError { message: String },
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    ExternalService,
    Automation,
    System,
}

/// 錯誤嚴重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RelayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::ConfigError { .. }
            | RelayError::ConfigValidationError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RelayError::ImageError { .. } => ErrorCategory::Input,
            RelayError::ApiError(_) => ErrorCategory::Network,
            RelayError::ExtractionError { .. }
            | RelayError::ParseError { .. }
            | RelayError::SerializationError(_)
            | RelayError::DistanceError { .. } => ErrorCategory::ExternalService,
            RelayError::BrowserError { .. } => ErrorCategory::Automation,
            RelayError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::ExternalService => ErrorSeverity::Medium,
            ErrorCategory::Automation => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RelayError::ConfigError { .. }
            | RelayError::ConfigValidationError { .. }
            | RelayError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line flags"
            }
            RelayError::MissingConfigError { .. } => {
                "Set the missing value in the config file or via environment variable"
            }
            RelayError::ImageError { .. } => {
                "Send the image as a multipart 'image' field or as a raw image/jpeg body"
            }
            RelayError::ApiError(_) => "Check network connectivity and the service endpoint",
            RelayError::ExtractionError { .. } => {
                "Verify the Gemini API key and model name, then retry"
            }
            RelayError::ParseError { .. } | RelayError::SerializationError(_) => {
                "Retake the photo so the label is sharp and fully visible"
            }
            RelayError::DistanceError { .. } => {
                "Check the extracted addresses and the distance provider credentials"
            }
            RelayError::BrowserError { .. } => {
                "Make sure chromedriver is running and the booking form is reachable"
            }
            RelayError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Bad upload: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::ExternalService => format!("External service problem: {}", self),
            ErrorCategory::Automation => format!("Browser automation problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        RelayError::ConfigError {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        RelayError::ExtractionError {
            message: message.into(),
        }
    }

    pub fn distance(message: impl Into<String>) -> Self {
        RelayError::DistanceError {
            message: message.into(),
        }
    }

    pub fn browser(message: impl Into<String>) -> Self {
        RelayError::BrowserError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = RelayError::browser("no such element");
        assert_eq!(err.category(), ErrorCategory::Automation);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = RelayError::MissingConfigError {
            field: "gemini.api_key".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_parse_error_displays_message_only() {
        let err = RelayError::ParseError {
            message: "expected value at line 1 column 1".to_string(),
            raw: "not json".to_string(),
        };
        assert_eq!(err.to_string(), "expected value at line 1 column 1");
    }
}
