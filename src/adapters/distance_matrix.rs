use crate::config::toml_config::DistanceConfig;
use crate::domain::model::{Distance, RouteQuery};
use crate::domain::ports::DistanceProvider;
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    #[serde(default)]
    status: String,
    distance: Option<ValueField>,
    duration: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: f64,
}

/// DistanceMatrix.ai 的路線距離查詢
pub struct DistanceMatrixClient {
    client: Client,
    api_key: String,
    base_url: String,
    mode: String,
}

impl DistanceMatrixClient {
    pub fn new(config: &DistanceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mode: config.mode.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/maps/api/distancematrix/json", self.base_url)
    }

    fn first_element(response: MatrixResponse) -> Result<MatrixElement> {
        let MatrixResponse {
            status,
            error_message,
            rows,
        } = response;

        let element = rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next());

        match element {
            Some(element) if status == "OK" && element.status == "OK" => Ok(element),
            _ => Err(RelayError::distance(format!(
                "Error in DistanceMatrix.ai API response: {} - {}",
                status, error_message
            ))),
        }
    }
}

#[async_trait]
impl DistanceProvider for DistanceMatrixClient {
    fn name(&self) -> &str {
        "distance_matrix"
    }

    async fn distance(&self, query: &RouteQuery) -> Result<Distance> {
        tracing::info!("Origin: {}", query.origin);
        tracing::info!("Destination: {}", query.destination);

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("origins", query.origin.as_str()),
                ("destinations", query.destination.as_str()),
                ("key", self.api_key.as_str()),
                ("mode", self.mode.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RelayError::distance(format!("request failed: {}", e.without_url())))?;

        tracing::debug!("Maps response status: {}", response.status());

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| {
                RelayError::distance(format!("malformed response body: {}", e.without_url()))
            })?;
        tracing::debug!(
            "Maps full response: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let parsed: MatrixResponse = serde_json::from_value(body)
            .map_err(|e| RelayError::distance(format!("unexpected response shape: {}", e)))?;
        let element = Self::first_element(parsed)?;

        let meters = element
            .distance
            .ok_or_else(|| RelayError::distance("response element has no distance"))?
            .value;
        let duration_seconds = element.duration.map(|d| d.value.max(0.0) as u64);

        let distance = Distance::from_meters(meters.max(0.0) as u64, duration_seconds);
        tracing::info!(
            "Calculated distance: {} km, duration: {:?} seconds",
            distance.kilometers,
            distance.duration_seconds
        );
        Ok(distance)
    }
}
