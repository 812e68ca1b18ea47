use crate::domain::model::{AddressPair, Distance, FormSubmission, LabelImage, RouteQuery};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 從標籤照片取出寄件/收件地址
#[async_trait]
pub trait LabelExtractor: Send + Sync {
    async fn extract(&self, image: &LabelImage) -> Result<AddressPair>;
}

#[async_trait]
pub trait DistanceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// 部分供應商（例如語言模型）需要在地址後加上國家名稱
    fn country_suffix(&self) -> Option<&str> {
        None
    }

    async fn distance(&self, query: &RouteQuery) -> Result<Distance>;
}

#[async_trait]
pub trait FormFiller: Send + Sync {
    async fn fill(&self, addresses: &AddressPair, distance: &Distance) -> Result<FormSubmission>;
}
