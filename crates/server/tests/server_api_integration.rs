//! Integration tests for the HTML and JSON routes, driven through the full
//! router with `oneshot`.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbImage};
use imgsearch::config::UiYamlConfig;
use imgsearch::{
    AppContext, EmbedError, Embedder, IndexError, PipelineSettings, Query, QueryEmbedding,
    QueryRequest, QueryResponse, RetryConfig, VectorIndex,
};
use index::{CatalogRecord, MemoryIndex};
use serde_json::{json, Map, Value};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

const BOUNDARY: &str = "imgsearch-test-boundary";

/// Wraps an index and counts queries.
struct Counting<I> {
    inner: I,
    calls: AtomicUsize,
}

#[async_trait]
impl<I: VectorIndex> VectorIndex for Counting<I> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.query(request).await
    }
}

struct Unavailable;

#[async_trait]
impl VectorIndex for Unavailable {
    fn name(&self) -> &str {
        "down"
    }

    async fn query(&self, _request: &QueryRequest) -> Result<QueryResponse, IndexError> {
        Err(IndexError::Http {
            status: 503,
            body: "maintenance".into(),
        })
    }
}

/// Never answers.
struct Hung;

#[async_trait]
impl Embedder for Hung {
    fn model_name(&self) -> &str {
        "hung"
    }

    async fn embed(&self, _query: &Query) -> Result<QueryEmbedding, EmbedError> {
        std::future::pending().await
    }
}

fn record(id: &str, values: [f32; 4], with_image: bool) -> CatalogRecord {
    let mut metadata = Map::new();
    if with_image {
        metadata.insert("image_url".into(), json!(format!("https://cdn.example/{id}.jpg")));
    }
    metadata.insert("product_url".into(), json!(format!("https://shop.example/{id}")));
    CatalogRecord {
        id: id.to_string(),
        values: values.to_vec(),
        metadata,
    }
}

fn catalog(n: usize) -> MemoryIndex {
    let records = (0..n)
        .map(|i| record(&format!("sku-{i}"), [1.0, i as f32, 0.5, 0.25], i != 1))
        .collect();
    MemoryIndex::new("test-catalog", records).unwrap()
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        retry: RetryConfig::disabled(),
        ..PipelineSettings::default()
    }
}

fn app_with(index: Arc<dyn VectorIndex>) -> Router {
    let embedder = Arc::new(embed::StubEmbedder::new("stub-clip", 4, false).unwrap());
    let ctx = AppContext::new(embedder, index).with_settings(settings());
    let state = ServerState::with_context(ServerConfig::default(), ctx, UiYamlConfig::default());
    build_router(Arc::new(state))
}

fn app(n: usize) -> Router {
    app_with(Arc::new(catalog(n)))
}

fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn multipart(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn upload_request(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

fn form_request(query: &str) -> Request<Body> {
    let encoded: String = query
        .bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => (b as char).to_string(),
            b' ' => "+".to_string(),
            other => format!("%{other:02X}"),
        })
        .collect();
    Request::builder()
        .method("POST")
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("query={encoded}")))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn index_page_shows_search_controls() {
    let response = app(0)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h1>Semantic Image Search</h1>"));
    assert!(html.contains("<h2>Demo</h2>"));
    assert!(html.contains("Enter your search query:"));
    assert!(html.contains("Search with text"));
    assert!(html.contains("Or upload an image to search"));
    assert!(html.contains("accept=\".jpg,.jpeg,.png\""));
}

#[tokio::test]
async fn text_search_renders_grid() {
    let response = app(6).oneshot(form_request("red sneakers")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(html.matches("<div class=\"row\">").count(), 2);
    assert_eq!(html.matches("<img src=\"https://cdn.example/").count(), 5);
    assert!(html.contains("Image URL not found for Product ID: sku-1."));
    assert!(html.contains("value=\"red sneakers\""));
}

#[tokio::test]
async fn blank_text_search_never_reaches_index() {
    let index = Arc::new(Counting {
        inner: catalog(3),
        calls: AtomicUsize::new(0),
    });
    let response = app_with(index.clone()).oneshot(form_request("   ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Please enter a valid search query."));
    assert!(!html.contains("class=\"grid\""));
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_catalog_renders_no_results_message() {
    let response = app(0).oneshot(form_request("lamp")).await.unwrap();
    let html = body_text(response).await;
    assert!(html.contains("No matching images found."));
    assert!(!html.contains("class=\"grid\""));
}

#[tokio::test]
async fn image_upload_shows_preview_and_results() {
    let body = multipart("file", "query.png", "image/png", &png_bytes());
    let response = app(3)
        .oneshot(upload_request("/search/image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<figcaption>Uploaded Image</figcaption>"));
    assert!(html.contains("src=\"data:image/png;base64,"));
    assert_eq!(html.matches("Product ID: ").count(), 3);
}

#[tokio::test]
async fn unsupported_upload_is_415_page() {
    let body = multipart("file", "anim.gif", "image/gif", b"GIF89a");
    let response = app(3)
        .oneshot(upload_request("/search/image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let html = body_text(response).await;
    assert!(html.contains("Only jpg, jpeg and png images can be searched."));
}

#[tokio::test]
async fn corrupt_upload_reports_unreadable_image() {
    let body = multipart("file", "broken.png", "image/png", b"not really a png");
    let response = app(3)
        .oneshot(upload_request("/search/image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("The uploaded file could not be read as an image."));
    assert!(!html.contains("Uploaded Image</figcaption>"));
}

#[tokio::test]
async fn api_text_search_returns_view() {
    let response = app(5)
        .oneshot(json_request("/api/v1/search", json!({ "query": "red sneakers" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"], "results");
    assert_eq!(body["kind"], "text");
    assert_eq!(body["grid"]["columns_per_row"], 4);
    let rows = body["grid"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].as_array().unwrap().len(), 4);
    assert_eq!(rows[1].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn api_empty_results() {
    let response = app(0)
        .oneshot(json_request("/api/v1/search", json!({ "query": "lamp" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"], "empty");
    assert_eq!(body["message"], "No matching images found.");
}

#[tokio::test]
async fn api_blank_query_is_400() {
    let response = app(3)
        .oneshot(json_request("/api/v1/search", json!({ "query": " " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(body["error"]["message"], "Please enter a valid search query.");
    assert_eq!(body["error"]["retryable"], false);
}

#[tokio::test]
async fn api_index_outage_is_502() {
    let response = app_with(Arc::new(Unavailable))
        .oneshot(json_request("/api/v1/search", json!({ "query": "chair" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INDEX_ERROR");
    assert_eq!(body["error"]["message"], "Search failed, please try again.");
    assert_eq!(body["error"]["retryable"], true);
}

#[tokio::test]
async fn api_image_search() {
    let body = multipart("file", "query.jpg", "image/png", &png_bytes());
    let response = app(2)
        .oneshot(upload_request("/api/v1/search/image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "image");
    assert_eq!(body["state"], "results");
}

#[tokio::test]
async fn api_image_without_file_field_is_400() {
    let body = multipart("other", "query.png", "image/png", &png_bytes());
    let response = app(2)
        .oneshot(upload_request("/api/v1/search/image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "MISSING_UPLOAD");
}

#[tokio::test]
async fn api_corrupt_image_is_422() {
    let body = multipart("file", "x.png", "image/png", b"garbage");
    let response = app(2)
        .oneshot(upload_request("/api/v1/search/image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "IMAGE_DECODE_ERROR");
}

#[tokio::test]
async fn health_and_readiness() {
    let app = app(1);

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["components"]["embedder"], "stub-clip");
    assert_eq!(body["components"]["index"], "test-catalog");
    assert_eq!(body["components"]["top_k"], 8);
}

#[tokio::test]
async fn unknown_route_is_404_json() {
    let response = app(0)
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let response = app(0)
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app(0)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test(start_paused = true)]
async fn hung_embedder_renders_failure_page_before_request_timeout() {
    let ctx = AppContext::new(Arc::new(Hung), Arc::new(catalog(2)));
    let state = ServerState::with_context(ServerConfig::default(), ctx, UiYamlConfig::default());
    let response = build_router(Arc::new(state))
        .oneshot(form_request("red sneakers"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Search failed, please try again."));
}

#[tokio::test(start_paused = true)]
async fn api_hung_embedder_is_504() {
    let ctx = AppContext::new(Arc::new(Hung), Arc::new(catalog(2)));
    let state = ServerState::with_context(ServerConfig::default(), ctx, UiYamlConfig::default());
    let response = build_router(Arc::new(state))
        .oneshot(json_request("/api/v1/search", json!({ "query": "red sneakers" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
    assert_eq!(body["error"]["retryable"], true);
}
