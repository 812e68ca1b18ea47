use crate::core::intake::{self, LabelIntake, PipelineStage, StageFailure};
use crate::domain::model::{ImageSource, LabelImage};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;

pub use crate::core::intake::NO_IMAGE_MESSAGE;
pub const SUCCESS_MESSAGE: &str = "✅ Form filled and Calculate clicked successfully";

#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<LabelIntake>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    distance_provider: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        distance_provider: state.intake.distance_provider().to_string(),
    })
}

/// 讀取上傳的圖片：multipart 的 image 欄位，或 image/jpeg 原始內容
async fn read_image(content_type: &str, request: Request) -> Result<Option<LabelImage>, Response> {
    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|rejection| (rejection.status(), rejection.body_text()).into_response())?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| (e.status(), e.body_text()).into_response())?
        {
            if field.name() != Some("image") {
                continue;
            }
            tracing::debug!("Found 'image' in multipart body");
            let mime_type = field
                .content_type()
                .filter(|ct| ct.starts_with("image/"))
                .unwrap_or("image/jpeg")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (e.status(), e.body_text()).into_response())?;

            return Ok(Some(LabelImage {
                bytes: bytes.to_vec(),
                mime_type,
                source: ImageSource::MultipartField,
            }));
        }
        tracing::debug!("No 'image' field in multipart body");
        return Ok(None);
    }

    if content_type.starts_with("image/jpeg") {
        tracing::debug!("No 'image' field, reading raw body");
        let bytes = Bytes::from_request(request, &())
            .await
            .map_err(|rejection| (rejection.status(), rejection.body_text()).into_response())?;
        return Ok(Some(LabelImage::jpeg(bytes.to_vec(), ImageSource::RawBody)));
    }

    Ok(None)
}

pub async fn upload(State(state): State<AppState>, request: Request) -> Response {
    tracing::debug!("Request headers: {:?}", request.headers());
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    tracing::debug!("Request content-type: {}", content_type);

    let image = match read_image(&content_type, request).await {
        Ok(image) => image,
        Err(response) => return response,
    };
    let image = match intake::receive(image) {
        Ok(image) => image,
        Err(failure) => {
            tracing::warn!("Invalid content-type or no image data");
            return failure_response(failure);
        }
    };

    match state.intake.process(&image).await {
        Ok(receipt) => {
            tracing::info!(
                "Booked {} {} -> {} {} ({} km)",
                receipt.addresses.from.first_name,
                receipt.addresses.from.city,
                receipt.addresses.to.first_name,
                receipt.addresses.to.city,
                receipt.distance.whole_kilometers()
            );
            (StatusCode::OK, SUCCESS_MESSAGE).into_response()
        }
        Err(failure) => {
            tracing::error!(
                "❌ {} stage failed: {} (Category: {:?})",
                failure.stage.as_str(),
                failure.error,
                failure.error.category()
            );
            tracing::error!("💡 Suggestion: {}", failure.error.recovery_suggestion());
            failure_response(failure)
        }
    }
}

fn failure_response(failure: StageFailure) -> Response {
    let status = match failure.stage {
        PipelineStage::Receive => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, failure.to_string()).into_response()
}
