#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use classifier_frontend::models::{
    DocumentId, DocumentRecord, UploadFile, UploadPolicy, UploadReceipt,
};
use classifier_frontend::services::{ClassifierApi, ClientError, MemoryViewStore, ViewStore};
use classifier_frontend::startup::build_router;
use classifier_frontend::AppState;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "classifier-test-boundary";

/// How the fake answers `POST /upload`.
#[derive(Clone)]
pub enum FakeUpload {
    Accept { message: String, category: Option<String> },
    Reject { status: StatusCode, message: String },
    Fail,
}

/// In-memory stand-in for the classification service.
pub struct FakeClassifier {
    documents: Mutex<Vec<DocumentRecord>>,
    upload_reply: Mutex<FakeUpload>,
    fail_listing: AtomicBool,
    observed_store: Mutex<Option<MemoryViewStore>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    upload_started: Notify,
    pub health_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub uploaded: Mutex<Vec<String>>,
    pub loading_during_upload: Mutex<Vec<bool>>,
}

impl FakeClassifier {
    pub fn new(documents: Vec<DocumentRecord>) -> Self {
        Self {
            documents: Mutex::new(documents),
            upload_reply: Mutex::new(FakeUpload::Accept {
                message: "ok".to_string(),
                category: Some("Invoice".to_string()),
            }),
            fail_listing: AtomicBool::new(false),
            observed_store: Mutex::new(None),
            gate: Mutex::new(None),
            upload_started: Notify::new(),
            health_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
            loading_during_upload: Mutex::new(Vec::new()),
        }
    }

    pub fn reply_with(&self, reply: FakeUpload) {
        *self.upload_reply.lock().unwrap() = reply;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Record the store's loading flag whenever an upload request arrives.
    pub fn observe(&self, store: MemoryViewStore) {
        *self.observed_store.lock().unwrap() = Some(store);
    }

    /// Park every upload request until `release_uploads` is called.
    pub fn hold_uploads(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_uploads(&self) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Resolves once an upload request has reached the fake.
    pub async fn wait_for_upload(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.upload_started.notified())
            .await
            .expect("an upload request should arrive");
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn listings(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifierApi for FakeClassifier {
    async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"status": "ok"}))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                url: "fake://documents".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt, ClientError> {
        let count = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.uploaded.lock().unwrap().push(file.filename.clone());
        self.upload_started.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        let observed = self.observed_store.lock().unwrap().clone();
        if let Some(store) = observed {
            let loading = store.load().await.map(|v| v.is_loading()).unwrap_or(false);
            self.loading_during_upload.lock().unwrap().push(loading);
        }

        let reply = self.upload_reply.lock().unwrap().clone();
        match reply {
            FakeUpload::Accept { message, category } => {
                self.documents.lock().unwrap().push(DocumentRecord {
                    id: DocumentId::from(format!("uploaded-{}", count)),
                    filename: file.filename.clone(),
                    predicted_category: category.clone(),
                    confidence_scores: Some(BTreeMap::from([
                        ("Invoice".to_string(), 0.9),
                        ("Other".to_string(), 0.1),
                    ])),
                    upload_time: format!("2030-01-01T00:00:{:02}", count),
                });
                Ok(UploadReceipt {
                    message,
                    filename: file.filename,
                    predicted_category: category,
                    confidence_scores: None,
                })
            }
            FakeUpload::Reject { status, message } => Err(ClientError::Rejected { status, message }),
            FakeUpload::Fail => Err(ClientError::Decode {
                url: "fake://upload".to_string(),
                reason: "expected value at line 1 column 1".to_string(),
            }),
        }
    }
}

pub fn document(id: &str, filename: &str, upload_time: &str) -> DocumentRecord {
    DocumentRecord {
        id: DocumentId::from(id),
        filename: filename.to_string(),
        predicted_category: Some("Other".to_string()),
        confidence_scores: Some(BTreeMap::from([
            ("Other".to_string(), 0.6),
            ("Invoice".to_string(), 0.25),
            ("Contract".to_string(), 0.15),
        ])),
        upload_time: upload_time.to_string(),
    }
}

pub fn sample_documents() -> Vec<DocumentRecord> {
    vec![
        document("1", "first.txt", "2024-01-01T09:00:00"),
        document("3", "third.docx", "2024-03-01T09:00:00.250000"),
        document("2", "second.pdf", "2024-02-01T09:00:00"),
    ]
}

pub fn test_router(fake: Arc<FakeClassifier>) -> Router {
    test_router_with_limit(fake, 1024 * 1024)
}

pub fn test_router_with_limit(fake: Arc<FakeClassifier>, max_upload_bytes: usize) -> Router {
    let state = AppState::new(fake, UploadPolicy::default()).with_max_upload_bytes(max_upload_bytes);
    build_router(state)
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition should hold within five seconds");
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn upload_request(cookie: Option<&str>, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// `name=value` part of the session cookie set by the response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|s| s.to_string())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("body is JSON")
}

/// Mount a session with `GET /` and return its cookie.
pub async fn mounted_session(app: &Router) -> String {
    let response = send(app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).expect("mount sets a session cookie")
}

pub async fn view(app: &Router, cookie: &str) -> serde_json::Value {
    let response = send(app, get("/api/view", Some(cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}
