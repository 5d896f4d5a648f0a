#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use imgsearch::{
    AppContext, EmbedError, Embedder, IndexError, PipelineSettings, Query, QueryEmbedding,
    QueryKind, QueryRequest, QueryResponse, RetryConfig, VectorIndex,
};
use index::RawMatch;
use serde_json::{json, Map};

pub const VECTOR: [f32; 4] = [0.1, 0.2, 0.3, 0.4];

/// Embedder that counts calls and replays scripted failures before succeeding.
pub struct FakeEmbedder {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<QueryKind>>,
    failures: Mutex<VecDeque<EmbedError>>,
    delay: Option<Duration>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            delay: None,
        }
    }

    pub fn failing_with(errors: Vec<EmbedError>) -> Self {
        Self {
            failures: Mutex::new(errors.into()),
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model_name(&self) -> &str {
        "fake-clip"
    }

    async fn embed(&self, query: &Query) -> Result<QueryEmbedding, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.kind());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(QueryEmbedding {
            vector: VECTOR.to_vec(),
            model_name: "fake-clip".into(),
            dimension: VECTOR.len(),
            normalized: false,
        })
    }
}

/// Index that records every request and answers with a fixed response.
pub struct FakeIndex {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<QueryRequest>>,
    failures: Mutex<VecDeque<IndexError>>,
    always_fail: Option<IndexError>,
    delay: Option<Duration>,
    response: QueryResponse,
}

impl FakeIndex {
    pub fn answering(response: QueryResponse) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            always_fail: None,
            delay: None,
            response,
        }
    }

    pub fn with_matches(n: usize) -> Self {
        Self::answering(QueryResponse::with_matches(
            (0..n).map(|i| raw_match(&format!("p{i}"), true)).collect(),
        ))
    }

    pub fn failing_with(errors: Vec<IndexError>, then: QueryResponse) -> Self {
        Self {
            failures: Mutex::new(errors.into()),
            ..Self::answering(then)
        }
    }

    pub fn always_failing(err: IndexError) -> Self {
        Self {
            always_fail: Some(err),
            ..Self::answering(QueryResponse::default())
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_matches(1)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> QueryRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    fn name(&self) -> &str {
        "fake-index"
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.always_fail {
            return Err(err.clone());
        }
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.response.clone())
    }
}

pub fn raw_match(id: &str, with_image: bool) -> RawMatch {
    let mut metadata = Map::new();
    if with_image {
        metadata.insert("image_url".into(), json!(format!("https://cdn.example/{id}.jpg")));
    }
    metadata.insert("product_url".into(), json!(format!("https://shop.example/{id}")));
    RawMatch {
        id: Some(id.to_string()),
        score: Some(0.5),
        values: None,
        metadata: Some(metadata),
    }
}

pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        retry: RetryConfig::default()
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_jitter(false),
        ..PipelineSettings::default()
    }
}

pub fn context(embedder: &Arc<FakeEmbedder>, index: &Arc<FakeIndex>) -> AppContext {
    AppContext::new(embedder.clone(), index.clone()).with_settings(fast_settings())
}

pub fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(8, 8, |x, y| {
        image::Rgb([(x * 30) as u8, (y * 30) as u8, 128])
    }));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}
