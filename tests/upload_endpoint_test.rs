use async_trait::async_trait;
use label_relay::domain::model::{
    AddressPair, Distance, FormSubmission, ImageSource, LabelImage, PartyAddress, RouteQuery,
};
use label_relay::domain::ports::{DistanceProvider, FormFiller, LabelExtractor};
use label_relay::server::{self, NO_IMAGE_MESSAGE, SUCCESS_MESSAGE};
use label_relay::{LabelIntake, RelayError, Result};
use std::sync::{Arc, Mutex};

struct StubExtractor {
    seen: Mutex<Vec<(Vec<u8>, ImageSource)>>,
    fail_with: Option<&'static str>,
}

#[async_trait]
impl LabelExtractor for StubExtractor {
    async fn extract(&self, image: &LabelImage) -> Result<AddressPair> {
        self.seen
            .lock()
            .unwrap()
            .push((image.bytes.clone(), image.source));
        if let Some(message) = self.fail_with {
            return Err(RelayError::extraction(message));
        }
        Ok(AddressPair {
            from: PartyAddress {
                first_name: "Ravi".to_string(),
                city: "Kolkata".to_string(),
                ..Default::default()
            },
            to: PartyAddress {
                first_name: "Meera".to_string(),
                city: "Chennai".to_string(),
                ..Default::default()
            },
        })
    }
}

struct StubDistance;

#[async_trait]
impl DistanceProvider for StubDistance {
    fn name(&self) -> &str {
        "stub"
    }

    async fn distance(&self, _query: &RouteQuery) -> Result<Distance> {
        Ok(Distance::from_kilometers(1670.0))
    }
}

struct StubForm {
    fail: bool,
}

#[async_trait]
impl FormFiller for StubForm {
    async fn fill(&self, _addresses: &AddressPair, _distance: &Distance) -> Result<FormSubmission> {
        if self.fail {
            return Err(RelayError::browser("session not created: chromedriver not running"));
        }
        Ok(FormSubmission {
            fields_filled: 16,
            session_closed: true,
        })
    }
}

/// 在隨機埠啟動服務，回傳 base URL
async fn spawn_app(extractor: Arc<StubExtractor>, form_fails: bool) -> String {
    let intake = Arc::new(LabelIntake::new(
        extractor,
        Arc::new(StubDistance),
        Arc::new(StubForm { fail: form_fails }),
    ));
    let app = server::router(intake, 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn extractor(fail_with: Option<&'static str>) -> Arc<StubExtractor> {
    Arc::new(StubExtractor {
        seen: Mutex::new(Vec::new()),
        fail_with,
    })
}

#[tokio::test]
async fn test_multipart_image_field_is_processed() {
    let stub = extractor(None);
    let base = spawn_app(stub.clone(), false).await;

    let part = reqwest::multipart::Part::bytes(b"\xff\xd8label".to_vec())
        .file_name("label.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);

    let response = reqwest::Client::new()
        .post(format!("{}/upload", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), SUCCESS_MESSAGE);

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, b"\xff\xd8label".to_vec());
    assert_eq!(seen[0].1, ImageSource::MultipartField);
}

#[tokio::test]
async fn test_raw_jpeg_body_is_processed() {
    let stub = extractor(None);
    let base = spawn_app(stub.clone(), false).await;

    let response = reqwest::Client::new()
        .post(format!("{}/upload", base))
        .header("Content-Type", "image/jpeg")
        .body(b"\xff\xd8raw".to_vec())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen[0].1, ImageSource::RawBody);
}

#[tokio::test]
async fn test_missing_image_is_bad_request() {
    let stub = extractor(None);
    let base = spawn_app(stub.clone(), false).await;
    let client = reqwest::Client::new();

    // 錯誤的 content-type
    let response = client
        .post(format!("{}/upload", base))
        .header("Content-Type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), NO_IMAGE_MESSAGE);

    // multipart 但沒有 image 欄位
    let form = reqwest::multipart::Form::new().text("note", "no photo");
    let response = client
        .post(format!("{}/upload", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // 空的 jpeg 內容
    let response = client
        .post(format!("{}/upload", base))
        .header("Content-Type", "image/jpeg")
        .body(Vec::<u8>::new())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stage_failures_map_to_500_with_prefix() {
    let base = spawn_app(extractor(Some("quota exceeded")), false).await;
    let response = reqwest::Client::new()
        .post(format!("{}/upload", base))
        .header("Content-Type", "image/jpeg")
        .body(b"\xff\xd8".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "Error calling Gemini API: quota exceeded"
    );

    let base = spawn_app(extractor(None), true).await;
    let response = reqwest::Client::new()
        .post(format!("{}/upload", base))
        .header("Content-Type", "image/jpeg")
        .body(b"\xff\xd8".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert!(response
        .text()
        .await
        .unwrap()
        .starts_with("Error in browser automation: session not created"));
}

#[tokio::test]
async fn test_health_reports_provider() {
    let base = spawn_app(extractor(None), false).await;
    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["distance_provider"], "stub");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_for_both_encodings() {
    let stub = extractor(None);
    let base = spawn_app(stub.clone(), false).await;
    let client = reqwest::Client::new();
    // 上限 1 MiB，送 2 MiB
    let oversized = vec![0xffu8; 2 * 1024 * 1024];

    let part = reqwest::multipart::Part::bytes(oversized.clone())
        .file_name("label.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let response = client
        .post(format!("{}/upload", base))
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);

    let response = client
        .post(format!("{}/upload", base))
        .header("Content-Type", "image/jpeg")
        .body(oversized)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);

    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_under_limit_is_accepted() {
    let stub = extractor(None);
    let base = spawn_app(stub.clone(), false).await;

    let part = reqwest::multipart::Part::bytes(vec![0xffu8; 512 * 1024])
        .file_name("label.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let response = reqwest::Client::new()
        .post(format!("{}/upload", base))
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(stub.seen.lock().unwrap()[0].0.len(), 512 * 1024);
}
