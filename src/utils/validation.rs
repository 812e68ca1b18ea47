use crate::utils::error::{RelayError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    let url = Url::parse(url_str).map_err(|e| RelayError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Unsupported URL scheme: {}", scheme),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// API 金鑰缺少時回傳 MissingConfigError，而不是一般的數值錯誤
pub fn validate_api_key(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() || value.starts_with("${") {
        return Err(RelayError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("browser.form_url", "https://example.com").is_ok());
        assert!(validate_url("browser.webdriver_url", "http://localhost:9515").is_ok());
        assert!(validate_url("browser.form_url", "").is_err());
        assert!(validate_url("browser.form_url", "invalid-url").is_err());
        assert!(validate_url("browser.form_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("gemini.api_key", "abc123").is_ok());
        assert!(matches!(
            validate_api_key("gemini.api_key", "  "),
            Err(RelayError::MissingConfigError { .. })
        ));
        // 未替換的環境變數視為缺少
        assert!(validate_api_key("gemini.api_key", "${GEMINI_API_KEY}").is_err());
    }

    #[test]
    fn test_validate_range_and_one_of() {
        assert!(validate_range("browser.wait_timeout_seconds", 10, 1, 120).is_ok());
        assert!(validate_range("browser.wait_timeout_seconds", 0, 1, 120).is_err());
        assert!(validate_one_of("distance.provider", "model", &["model", "distance_matrix"]).is_ok());
        assert!(validate_one_of("distance.provider", "osrm", &["model", "distance_matrix"]).is_err());
    }
}
