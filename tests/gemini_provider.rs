//! Drives `GeminiProvider` against a mock Gemini endpoint.

use serde_json::json;
use std::time::Duration;
use tryon::{
    generate_try_on_images, AspectRatio, GeminiModel, GeminiProvider, ImageFormat, ImageUpload,
    InlineImage, TryOnError, TryOnOptions, TryOnProvider, TryOnRequest, TryOnSession,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image-preview:generateContent";
const MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash-image-preview";

/// Base64 of a 12-byte PNG header.
const PNG_B64: &str = "iVBORw0KGgoAAAAA";
const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const JPEG_BYTES: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

fn provider(server: &MockServer) -> GeminiProvider {
    GeminiProvider::builder()
        .api_key("test-key")
        .model(GeminiModel::FlashImagePreview)
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn image_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {
                "parts": [
                    {"text": "Here you go."},
                    {"inlineData": {"mimeType": "image/png", "data": PNG_B64}}
                ]
            },
            "finishReason": "STOP"
        }]
    }))
}

fn person() -> InlineImage {
    InlineImage::from_bytes(&JPEG_BYTES).unwrap()
}

fn garment() -> InlineImage {
    InlineImage::from_bytes(&PNG_BYTES).unwrap()
}

#[tokio::test]
async fn render_sends_both_images_and_decodes_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"],
                "imageConfig": {"aspectRatio": "1:1"}
            }
        })))
        .respond_with(image_response())
        .expect(1)
        .mount(&server)
        .await;

    let request = TryOnRequest::new(person(), garment(), "wear it", AspectRatio::Square);
    let image = provider(&server).render(&request).await.unwrap();

    assert_eq!(image.data, PNG_BYTES.to_vec());
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!(image.metadata.text.as_deref(), Some("Here you go."));
    assert_eq!(
        image.metadata.model.as_deref(),
        Some("gemini-2.5-flash-image-preview")
    );

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[2]["text"], "wear it");
}

#[tokio::test]
async fn fan_out_sends_one_request_per_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(image_response().set_delay(Duration::from_millis(50)))
        .expect(5)
        .mount(&server)
        .await;

    let options = TryOnOptions::new()
        .with_count(5)
        .with_instructions("add a scarf");
    let images = generate_try_on_images(&provider(&server), &person(), &garment(), &options)
        .await
        .unwrap();

    assert_eq!(images.len(), 5);

    let received = server.received_requests().await.unwrap();
    for request in &received {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let prompt = body["contents"][0]["parts"][2]["text"].as_str().unwrap();
        assert!(prompt.contains("MUST have a 9:16 aspect ratio"));
        assert!(prompt.ends_with("Additional user instructions: add a scarf"));
    }
}

#[tokio::test]
async fn text_only_answer_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "I can't edit photos of people."}]},
                "finishReason": "STOP"
            }]
        })))
        .mount(&server)
        .await;

    let request = TryOnRequest::new(person(), garment(), "wear it", AspectRatio::Portrait);
    let err = provider(&server).render(&request).await.unwrap_err();

    match err {
        TryOnError::UnexpectedResponse(msg) => assert_eq!(
            msg,
            "API did not return an image. Response: I can't edit photos of people."
        ),
        other => panic!("expected UnexpectedResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_reports_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_string("quota exceeded"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = TryOnRequest::new(person(), garment(), "wear it", AspectRatio::Portrait);
    let err = provider(&server).render(&request).await.unwrap_err();

    assert!(matches!(
        err,
        TryOnError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(30)
    ));
}

#[tokio::test]
async fn server_error_fails_the_whole_session_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let mut session = TryOnSession::new();
    session.select_person(ImageUpload::from_bytes("me.jpg", &JPEG_BYTES).unwrap());
    session.select_garment(ImageUpload::from_bytes("dress.png", &PNG_BYTES).unwrap());
    session.options = TryOnOptions::new().with_count(3);

    let result = session.generate(&provider(&server)).await;

    assert!(matches!(result, Err(TryOnError::Api { status: 500, .. })));
    assert!(session.results().is_empty());
    assert_eq!(
        session.error(),
        Some("Failed to generate virtual try-on images: API error: 500 - backend unavailable")
    );
}

#[tokio::test]
async fn session_auto_download_writes_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(image_response())
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = TryOnSession::new().with_download_dir(dir.path());
    session.select_person(ImageUpload::from_bytes("me.jpg", &JPEG_BYTES).unwrap());
    session.select_garment(ImageUpload::from_bytes("dress.png", &PNG_BYTES).unwrap());
    session.options = TryOnOptions::new().with_count(3).with_auto_download(true);

    session.generate(&provider(&server)).await.unwrap();

    for n in 1..=3 {
        let saved = std::fs::read(dir.path().join(format!("virtual-try-on-{n}.png"))).unwrap();
        assert_eq!(saved, PNG_BYTES.to_vec());
    }
}

#[tokio::test]
async fn health_check_maps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "models/x"})))
        .mount(&server)
        .await;

    assert!(provider(&server).health_check().await.is_ok());

    let denied = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&denied)
        .await;

    assert!(matches!(
        provider(&denied).health_check().await,
        Err(TryOnError::Auth(_))
    ));
}
