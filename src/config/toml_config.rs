use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DISTANCEMATRIX_API_KEY_ENV: &str = "DISTANCEMATRIX_API_KEY";

/// 日誌中只顯示金鑰是否已設定
fn redact(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub distance: DistanceConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DistanceProviderKind {
    /// 由語言模型估算道路距離
    #[default]
    Model,
    /// DistanceMatrix.ai 路線 API
    DistanceMatrix,
}

impl DistanceProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceProviderKind::Model => "model",
            DistanceProviderKind::DistanceMatrix => "distance_matrix",
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    pub provider: DistanceProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub mode: String,
    pub country: String,
    pub timeout_seconds: u64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            provider: DistanceProviderKind::Model,
            api_key: String::new(),
            base_url: "https://api.distancematrix.ai".to_string(),
            mode: "driving".to_string(),
            country: "India".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for DistanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistanceConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("mode", &self.mode)
            .field("country", &self.country)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub form_url: String,
    pub browser_name: String,
    pub headless: bool,
    pub wait_timeout_seconds: u64,
    pub settle_seconds: u64,
    pub package_weight: String,
    pub keep_open: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            form_url: "https://booking-website-v9ke.vercel.app/".to_string(),
            browser_name: "chrome".to_string(),
            headless: true,
            wait_timeout_seconds: 10,
            settle_seconds: 5,
            package_weight: "450".to_string(),
            keep_open: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl RelayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})，找不到的變數原樣保留
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| RelayError::config(format!("env substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 設定檔沒有金鑰時改讀環境變數
    pub fn resolve_secrets(&mut self) {
        if self.gemini.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(GEMINI_API_KEY_ENV) {
                self.gemini.api_key = key;
            }
        }
        if self.distance.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(DISTANCEMATRIX_API_KEY_ENV) {
                self.distance.api_key = key;
            }
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_range(
            "server.max_upload_bytes",
            self.server.max_upload_bytes,
            1024,
            256 * 1024 * 1024,
        )?;

        validation::validate_api_key("gemini.api_key", &self.gemini.api_key)?;
        validation::validate_non_empty_string("gemini.model", &self.gemini.model)?;
        validation::validate_url("gemini.base_url", &self.gemini.base_url)?;

        if self.distance.provider == DistanceProviderKind::DistanceMatrix {
            validation::validate_api_key("distance.api_key", &self.distance.api_key)?;
            validation::validate_url("distance.base_url", &self.distance.base_url)?;
            validation::validate_one_of(
                "distance.mode",
                &self.distance.mode,
                &["driving", "walking", "bicycling", "transit"],
            )?;
        }

        validation::validate_url("browser.webdriver_url", &self.browser.webdriver_url)?;
        validation::validate_url("browser.form_url", &self.browser.form_url)?;
        validation::validate_range(
            "browser.wait_timeout_seconds",
            self.browser.wait_timeout_seconds,
            1,
            300,
        )?;
        validation::validate_range("browser.settle_seconds", self.browser.settle_seconds, 0, 300)?;

        Ok(())
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080

[gemini]
api_key = "test-key"
model = "gemini-2.5-pro"

[distance]
provider = "distance_matrix"
api_key = "dm-key"

[browser]
webdriver_url = "http://localhost:4444"
headless = false
keep_open = true

[monitoring]
enabled = true
json_logs = true
"#;

        let config = RelayConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.distance.provider, DistanceProviderKind::DistanceMatrix);
        assert_eq!(config.distance.mode, "driving");
        assert!(!config.browser.headless);
        assert!(config.browser.keep_open);
        assert_eq!(config.browser.package_weight, "450");
        assert!(config.monitoring_enabled());
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RelayConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.distance.provider, DistanceProviderKind::Model);
        assert_eq!(config.browser.wait_timeout_seconds, 10);
        assert!(!config.monitoring_enabled());
        // 沒有 API 金鑰時驗證失敗
        assert!(matches!(
            config.validate(),
            Err(RelayError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LABEL_RELAY_TEST_FORM_URL", "https://forms.example.com/book");

        let toml_content = r#"
[gemini]
api_key = "k"

[browser]
form_url = "${LABEL_RELAY_TEST_FORM_URL}"
"#;

        let config = RelayConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.browser.form_url, "https://forms.example.com/book");

        std::env::remove_var("LABEL_RELAY_TEST_FORM_URL");
    }

    #[test]
    fn test_distance_matrix_requires_key() {
        let toml_content = r#"
[gemini]
api_key = "k"

[distance]
provider = "distance_matrix"
"#;
        let mut config = RelayConfig::from_toml_str(toml_content).unwrap();
        config.distance.api_key.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("distance.api_key"));
    }

    #[test]
    fn test_invalid_form_url_rejected() {
        let toml_content = r#"
[gemini]
api_key = "k"

[browser]
form_url = "not a url"
"#;
        let config = RelayConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 6001\n\n[gemini]\napi_key = \"file-key\"\n")
            .unwrap();

        let config = RelayConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 6001);
        assert_eq!(config.gemini.api_key, "file-key");
    }

    #[test]
    fn test_debug_output_hides_api_keys() {
        let toml_content = r#"
[gemini]
api_key = "g-secret-123"

[distance]
provider = "distance_matrix"
api_key = "dm-secret-456"
"#;
        let config = RelayConfig::from_toml_str(toml_content).unwrap();
        let printed = format!("{:?}", config);

        assert!(!printed.contains("g-secret-123"));
        assert!(!printed.contains("dm-secret-456"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("DistanceMatrix"));

        let printed = format!("{:?}", GeminiConfig::default());
        assert!(printed.contains("<unset>"));
    }
}
