use crate::adapters::webdriver::{SessionOptions, WebDriverClient, WebDriverSession};
use crate::config::toml_config::BrowserConfig;
use crate::domain::model::{AddressPair, Distance, FormSubmission, PartyAddress};
use crate::domain::ports::FormFiller;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub const READY_FIELD: &str = "sender-first";
pub const DISTANCE_FIELD: &str = "distance-input";
pub const WEIGHT_FIELD: &str = "weight";
pub const CALCULATE_BUTTON: &str = "calculate-btn";

/// 表單欄位 id 依序為：名、姓、地址、城市、州、郵遞區號、手機
fn party_fields<'a>(prefix: &str, party: &'a PartyAddress) -> [(String, &'a str); 7] {
    [
        (format!("{}-first", prefix), party.first_name.as_str()),
        (format!("{}-last", prefix), party.last_name.as_str()),
        (format!("{}-addr1", prefix), party.address.as_str()),
        (format!("{}-city", prefix), party.city.as_str()),
        (format!("{}-state", prefix), party.state.as_str()),
        (format!("{}-pin", prefix), party.pincode.as_str()),
        (format!("{}-mobile", prefix), party.mobile.as_str()),
    ]
}

/// 表單要填寫的所有 (欄位 id, 值)
pub fn form_values(
    addresses: &AddressPair,
    distance: &Distance,
    package_weight: &str,
) -> Vec<(String, String)> {
    let mut values: Vec<(String, String)> = party_fields("sender", &addresses.from)
        .into_iter()
        .chain(party_fields("recipient", &addresses.to))
        .map(|(id, value)| (id, value.to_string()))
        .collect();

    values.push((DISTANCE_FIELD.to_string(), distance.whole_kilometers().to_string()));
    values.push((WEIGHT_FIELD.to_string(), package_weight.to_string()));
    values
}

pub struct BookingFormFiller {
    driver: WebDriverClient,
    config: BrowserConfig,
}

impl BookingFormFiller {
    pub fn new(config: BrowserConfig) -> Result<Self> {
        Ok(Self {
            driver: WebDriverClient::new(&config.webdriver_url)?,
            config,
        })
    }

    async fn run_script(
        &self,
        session: &WebDriverSession,
        addresses: &AddressPair,
        distance: &Distance,
    ) -> Result<usize> {
        session.navigate(&self.config.form_url).await?;
        session
            .wait_for_element(
                &format!("#{}", READY_FIELD),
                Duration::from_secs(self.config.wait_timeout_seconds),
            )
            .await?;

        let values = form_values(addresses, distance, &self.config.package_weight);
        for (id, value) in &values {
            let element = session.find_element(&format!("#{}", id)).await?;
            session.send_keys(&element, value).await?;
            tracing::debug!("Filled #{}", id);
        }

        let button = session.find_element(&format!("#{}", CALCULATE_BUTTON)).await?;
        session.click(&button).await?;
        tracing::info!("Calculate clicked, waiting {}s for results", self.config.settle_seconds);

        tokio::time::sleep(Duration::from_secs(self.config.settle_seconds)).await;
        Ok(values.len())
    }
}

#[async_trait]
impl FormFiller for BookingFormFiller {
    async fn fill(&self, addresses: &AddressPair, distance: &Distance) -> Result<FormSubmission> {
        let options = SessionOptions {
            browser_name: self.config.browser_name.clone(),
            headless: self.config.headless,
        };
        let session = self.driver.new_session(&options).await?;

        let outcome = self.run_script(&session, addresses, distance).await;

        if self.config.keep_open {
            tracing::info!("Leaving browser session {} open", session.id());
            return outcome.map(|fields_filled| FormSubmission {
                fields_filled,
                session_closed: false,
            });
        }

        // 無論成功與否都關閉瀏覽器，關閉失敗只記錄不覆蓋原本的結果
        let session_id = session.id().to_string();
        let closed = match session.close().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to close browser session {}: {}", session_id, e);
                false
            }
        };

        outcome.map(|fields_filled| FormSubmission {
            fields_filled,
            session_closed: closed,
        })
    }
}
