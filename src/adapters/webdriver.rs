//! Minimal W3C WebDriver client (chromedriver, geckodriver or a Selenium grid).
//!
//! Only the commands the booking script needs are implemented: session
//! lifecycle, navigation, element lookup by CSS selector, typing and clicking.

use crate::utils::error::{RelayError, Result};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// W3C element reference key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub browser_name: String,
    pub headless: bool,
}

impl SessionOptions {
    fn capabilities(&self) -> Value {
        let mut args = vec!["--window-size=1280,900".to_string()];
        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }

        let mut always_match = json!({ "browserName": self.browser_name });
        match self.browser_name.as_str() {
            "firefox" => {
                let ff_args: Vec<&str> = if self.headless { vec!["-headless"] } else { vec![] };
                always_match["moz:firefoxOptions"] = json!({ "args": ff_args });
            }
            _ => {
                always_match["goog:chromeOptions"] = json!({ "args": args });
            }
        }

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

#[derive(Debug, Clone)]
pub struct WebDriverClient {
    client: Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn new_session(&self, options: &SessionOptions) -> Result<WebDriverSession> {
        let value = self
            .command(Method::POST, "/session", Some(options.capabilities()))
            .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::browser("WebDriver did not return a sessionId"))?
            .to_string();

        tracing::debug!("WebDriver session {} started", session_id);
        Ok(WebDriverSession {
            driver: self.clone(),
            session_id,
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        } else if method == Method::POST {
            request = request.json(&json!({}));
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                RelayError::browser(format!("WebDriver unreachable at {}: {}", url, e.without_url()))
            })?;
        let status = response.status();
        let wire: WireResponse = response.json().await.map_err(|e| {
            RelayError::browser(format!(
                "invalid WebDriver response ({}): {}",
                status,
                e.without_url()
            ))
        })?;

        if status.is_success() {
            return Ok(wire.value);
        }

        Err(WebDriverFailure::from_value(&wire.value).into_error())
    }
}

/// WebDriver 錯誤回應：{"value": {"error": "...", "message": "..."}}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDriverFailure {
    pub error: String,
    pub message: String,
}

impl WebDriverFailure {
    fn from_value(value: &Value) -> Self {
        Self {
            error: value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn into_error(self) -> RelayError {
        RelayError::browser(format!("{}: {}", self.error, self.message))
    }
}

pub struct WebDriverSession {
    driver: WebDriverClient,
    session_id: String,
}

impl WebDriverSession {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    fn path(&self, suffix: &str) -> String {
        format!("/session/{}{}", self.session_id, suffix)
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.driver
            .command(Method::POST, &self.path("/url"), Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    pub async fn find_element(&self, css_selector: &str) -> Result<ElementRef> {
        let value = self
            .driver
            .command(
                Method::POST,
                &self.path("/element"),
                Some(json!({ "using": "css selector", "value": css_selector })),
            )
            .await?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| {
                RelayError::browser(format!("no element reference for '{}'", css_selector))
            })
    }

    /// 等待元素出現，只有 "no such element" 會重試
    pub async fn wait_for_element(&self, css_selector: &str, timeout: Duration) -> Result<ElementRef> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(css_selector).await {
                Ok(element) => return Ok(element),
                Err(RelayError::BrowserError { message })
                    if message.starts_with("no such element") && Instant::now() < deadline =>
                {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(RelayError::BrowserError { message }) if message.starts_with("no such element") => {
                    return Err(RelayError::browser(format!(
                        "timed out after {:?} waiting for '{}'",
                        timeout, css_selector
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.driver
            .command(
                Method::POST,
                &self.path(&format!("/element/{}/value", element.0)),
                Some(json!({ "text": text })),
            )
            .await?;
        Ok(())
    }

    pub async fn click(&self, element: &ElementRef) -> Result<()> {
        self.driver
            .command(
                Method::POST,
                &self.path(&format!("/element/{}/click", element.0)),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.driver
            .command(Method::DELETE, &self.path(""), None)
            .await?;
        tracing::debug!("WebDriver session {} closed", self.session_id);
        Ok(())
    }
}
