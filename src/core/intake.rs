use crate::adapters::{
    BookingFormFiller, DistanceMatrixClient, GeminiClient, GeminiDistanceEstimator,
    GeminiLabelExtractor,
};
use crate::config::toml_config::{DistanceProviderKind, RelayConfig};
use crate::domain::model::{AddressPair, BookingReceipt, Distance, LabelImage, RouteQuery};
use crate::domain::ports::{DistanceProvider, FormFiller, LabelExtractor};
use crate::utils::error::{RelayError, Result};
use crate::utils::monitor::RequestMonitor;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Receive,
    Extraction,
    Parsing,
    Distance,
    Browser,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Receive => "receive",
            PipelineStage::Extraction => "extraction",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Distance => "distance",
            PipelineStage::Browser => "browser",
        }
    }

    /// HTTP 回應中使用的錯誤前綴，收件階段直接回傳原因
    pub fn error_prefix(&self) -> Option<&'static str> {
        match self {
            PipelineStage::Receive => None,
            PipelineStage::Extraction => Some("Error calling Gemini API"),
            PipelineStage::Parsing => Some("Error parsing Gemini response"),
            PipelineStage::Distance => Some("Error calculating distance"),
            PipelineStage::Browser => Some("Error in browser automation"),
        }
    }
}

/// 失敗的階段與原因
#[derive(Debug)]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub error: RelayError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage.error_prefix() {
            Some(prefix) => write!(f, "{}: {}", prefix, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for StageFailure {}

pub type StageResult<T> = std::result::Result<T, StageFailure>;

pub const NO_IMAGE_MESSAGE: &str = "No image file received or invalid content-type";

fn missing_image() -> StageFailure {
    StageFailure {
        stage: PipelineStage::Receive,
        error: RelayError::ImageError {
            message: NO_IMAGE_MESSAGE.to_string(),
        },
    }
}

/// 確認請求中真的有圖片內容
pub fn receive(image: Option<LabelImage>) -> StageResult<LabelImage> {
    match image {
        Some(image) if !image.is_empty() => Ok(image),
        _ => Err(missing_image()),
    }
}

/// 標籤處理流程：取出地址 → 計算距離 → 填寫表單
#[derive(Clone)]
pub struct LabelIntake {
    extractor: Arc<dyn LabelExtractor>,
    distance: Arc<dyn DistanceProvider>,
    form: Arc<dyn FormFiller>,
    monitor_enabled: bool,
}

impl LabelIntake {
    pub fn new(
        extractor: Arc<dyn LabelExtractor>,
        distance: Arc<dyn DistanceProvider>,
        form: Arc<dyn FormFiller>,
    ) -> Self {
        Self {
            extractor,
            distance,
            form,
            monitor_enabled: false,
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor_enabled = enabled;
        self
    }

    /// 依設定建立真正的外部服務客戶端
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
        let extractor: Arc<dyn LabelExtractor> = Arc::new(GeminiLabelExtractor::new(gemini.clone()));

        let distance: Arc<dyn DistanceProvider> = match config.distance.provider {
            DistanceProviderKind::Model => Arc::new(GeminiDistanceEstimator::new(
                gemini,
                config.distance.country.clone(),
            )),
            DistanceProviderKind::DistanceMatrix => {
                Arc::new(DistanceMatrixClient::new(&config.distance)?)
            }
        };

        let form: Arc<dyn FormFiller> = Arc::new(BookingFormFiller::new(config.browser.clone())?);

        Ok(Self::new(extractor, distance, form).with_monitoring(config.monitoring_enabled()))
    }

    pub fn distance_provider(&self) -> &str {
        self.distance.name()
    }

    async fn extract(&self, image: &LabelImage) -> StageResult<AddressPair> {
        self.extractor.extract(image).await.map_err(|error| {
            let stage = match &error {
                RelayError::ParseError { raw, .. } => {
                    tracing::warn!("Gemini raw output: {}", raw);
                    PipelineStage::Parsing
                }
                RelayError::SerializationError(_) => PipelineStage::Parsing,
                _ => PipelineStage::Extraction,
            };
            StageFailure { stage, error }
        })
    }

    async fn measure(&self, addresses: &AddressPair) -> StageResult<Distance> {
        let query = RouteQuery::from_pair(addresses, self.distance.country_suffix());
        tracing::debug!("Route query: {:?}", query);

        self.distance
            .distance(&query)
            .await
            .map_err(|error| StageFailure {
                stage: PipelineStage::Distance,
                error,
            })
    }

    /// 只跑到距離計算，不開瀏覽器
    pub async fn preview(&self, image: &LabelImage) -> StageResult<BookingReceipt> {
        let monitor = RequestMonitor::new(self.monitor_enabled);
        if image.is_empty() {
            return Err(missing_image());
        }
        tracing::info!("Received image, size: {} bytes", image.len());

        let addresses = self.extract(image).await?;
        monitor.log_stage("extraction");

        let distance = self.measure(&addresses).await?;
        tracing::info!("Calculated distance: {} km", distance.kilometers);
        monitor.log_stage("distance");

        Ok(BookingReceipt {
            addresses,
            distance,
            submission: None,
            completed_at: chrono::Utc::now(),
        })
    }

    pub async fn process(&self, image: &LabelImage) -> StageResult<BookingReceipt> {
        let monitor = RequestMonitor::new(self.monitor_enabled);
        let mut receipt = self.preview(image).await?;

        let submission = self
            .form
            .fill(&receipt.addresses, &receipt.distance)
            .await
            .map_err(|error| StageFailure {
                stage: PipelineStage::Browser,
                error,
            })?;
        monitor.log_stage("browser");

        tracing::info!("✅ Form filled with {} fields", submission.fields_filled);
        receipt.submission = Some(submission);
        receipt.completed_at = chrono::Utc::now();
        Ok(receipt)
    }
}
