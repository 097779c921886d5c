#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use printbroker_api::config::ServerConfig;
use printbroker_api::router::build_app_router;
use printbroker_api::state::AppState;
use printbroker_core::registry::InMemoryRegistry;
use printbroker_core::spooler::{Spooler, SpoolerError};
use printbroker_core::uploads::UploadStore;

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "----printbroker-test-boundary";

/// Printer name used by [`test_config`].
pub const TEST_PRINTER: &str = "Test_Printer";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uploads go to `upload_dir`; CORS allows `http://localhost:3003`.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        printer_name: TEST_PRINTER.to_string(),
        cors_origins: vec!["http://localhost:3003".to_string()],
        upload_dir: upload_dir.to_path_buf(),
        tmp_dir: upload_dir.join("tmp"),
        request_timeout_secs: 30,
        ..ServerConfig::default()
    }
}

/// Spooler double that records every invocation.
#[derive(Default)]
pub struct FakeSpooler {
    pub calls: AtomicUsize,
    pub submitted: Mutex<Vec<(String, PathBuf)>>,
    /// When set, every call fails with this stderr.
    pub fail_with: Option<String>,
    /// Output returned by `list_jobs`.
    pub listing: String,
}

impl FakeSpooler {
    pub fn failing(stderr: &str) -> Self {
        Self {
            fail_with: Some(stderr.to_string()),
            ..Self::default()
        }
    }

    pub fn with_listing(listing: &str) -> Self {
        Self {
            listing: listing.to_string(),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Spooler for FakeSpooler {
    async fn submit(&self, printer: &str, path: &Path) -> Result<String, SpoolerError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.submitted
            .lock()
            .expect("lock")
            .push((printer.to_string(), path.to_path_buf()));
        match &self.fail_with {
            Some(stderr) => Err(SpoolerError::Exited {
                program: "lp".into(),
                exit_code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok(format!("request id is {printer}-{n} (1 file(s))\n")),
        }
    }

    async fn list_jobs(&self) -> Result<String, SpoolerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(stderr) => Err(SpoolerError::Exited {
                program: "lpstat".into(),
                exit_code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok(self.listing.clone()),
        }
    }
}

/// Everything a test needs to drive the app and inspect its side effects.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<InMemoryRegistry>,
    pub spooler: Arc<FakeSpooler>,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    /// Number of files currently in the upload directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path())
            .expect("read upload dir")
            .count()
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(spooler: FakeSpooler) -> TestApp {
    build_test_app_with_limit(spooler, 1024 * 1024)
}

/// Like [`build_test_app`] with an explicit per-file upload limit in bytes.
pub fn build_test_app_with_limit(spooler: FakeSpooler, max_upload_bytes: u64) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("create upload dir");
    let config = test_config(upload_dir.path());

    let registry = Arc::new(InMemoryRegistry::new());
    let spooler = Arc::new(spooler);

    let state = AppState {
        config: Arc::new(config),
        registry: registry.clone(),
        spooler: spooler.clone(),
        uploads: Arc::new(UploadStore::new(upload_dir.path(), max_upload_bytes)),
    };

    TestApp {
        router: build_app_router(state),
        registry,
        spooler,
        upload_dir,
    }
}

/// Encode a single-part multipart body.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a document to `/api/upload` in the `file` field.
pub async fn upload(app: Router, filename: &str, content_type: &str, data: &[u8]) -> Response<Body> {
    post_multipart(app, multipart_body("file", filename, content_type, data)).await
}

pub async fn post_multipart(app: Router, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
