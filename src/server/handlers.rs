use anyhow::{Context, Result};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;

use crate::ocr::TextRecognizer;
use crate::settings;

use super::demo::render_demo_html;
use super::extract::{extract_upload, read_upload, ServerError};
use super::models::{ErrorResponse, ExtractResponse};
use super::state::ServerState;

pub const EXTRACT_PATH: &str = "/extract-text/";

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let recognizer = Arc::new(settings.tesseract());
    let app = build_router(settings, recognizer)?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(
    settings: settings::Settings,
    recognizer: Arc<dyn TextRecognizer>,
) -> Result<Router> {
    let body_limit = settings.max_upload_bytes;
    let state = Arc::new(ServerState {
        settings,
        recognizer,
        demo_html: Arc::new(render_demo_html(EXTRACT_PATH)?),
    });
    Ok(Router::new()
        .route("/health", get(health))
        .route("/demo", get(demo))
        .route(EXTRACT_PATH, post(extract_text))
        .route(EXTRACT_PATH.trim_end_matches('/'), post(extract_text))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn demo(State(state): State<Arc<ServerState>>) -> Html<String> {
    Html(state.demo_html.as_ref().clone())
}

async fn extract_text(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResponse>, (StatusCode, Json<ErrorResponse>)> {
    let started = Instant::now();
    let result = match multipart {
        Ok(mut multipart) => match read_upload(&mut multipart).await {
            Ok(upload) => run_extraction(state, upload).await,
            Err(err) => Err(err),
        },
        Err(rejection) => Err(ServerError::bad_request(rejection.body_text())),
    };

    match result {
        Ok(text) => {
            tracing::info!(
                chars = text.chars().count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "extracted text"
            );
            Ok(Json(ExtractResponse {
                extracted_text: text,
            }))
        }
        Err(err) => {
            if err.status.is_server_error() {
                tracing::error!(status = %err.status, error = %err.message, "text extraction failed");
            } else {
                tracing::warn!(status = %err.status, error = %err.message, "rejected upload");
            }
            Err((err.status, Json(ErrorResponse { error: err.message })))
        }
    }
}

async fn run_extraction(
    state: Arc<ServerState>,
    upload: super::extract::Upload,
) -> Result<String, ServerError> {
    tracing::info!(
        filename = upload.filename.as_deref().unwrap_or(""),
        bytes = upload.bytes.len(),
        "received upload"
    );
    tokio::task::spawn_blocking(move || extract_upload(state.as_ref(), &upload))
        .await
        .map_err(|err| ServerError::internal(format!("server task failed: {}", err)))?
        .map_err(ServerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{BBoxPx, TextRegion};
    use anyhow::anyhow;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "ocr-test-boundary";

    #[derive(Default)]
    struct Seen {
        paths: Vec<PathBuf>,
        langs: Vec<String>,
        contents: Vec<Vec<u8>>,
    }

    struct StubRecognizer {
        lines: Vec<(&'static str, f32)>,
        fail: bool,
        seen: Arc<Mutex<Seen>>,
    }

    impl StubRecognizer {
        fn ok(lines: Vec<(&'static str, f32)>) -> Self {
            Self {
                lines,
                fail: false,
                seen: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                lines: Vec::new(),
                fail: true,
                seen: Arc::default(),
            }
        }
    }

    impl TextRecognizer for StubRecognizer {
        fn recognize(&self, image_path: &Path, lang: &str) -> Result<Vec<TextRegion>> {
            let mut seen = self.seen.lock().unwrap();
            seen.paths.push(image_path.to_path_buf());
            seen.langs.push(lang.to_string());
            seen.contents.push(std::fs::read(image_path)?);
            if self.fail {
                return Err(anyhow!("unsupported image format"));
            }
            Ok(self
                .lines
                .iter()
                .map(|(text, confidence)| TextRegion {
                    bbox: BBoxPx { x: 0, y: 0, w: 10, h: 10 },
                    text: text.to_string(),
                    confidence: *confidence,
                })
                .collect())
        }
    }

    fn test_settings(tmp_dir: &Path) -> settings::Settings {
        settings::Settings {
            server_tmp_dir: Some(tmp_dir.to_string_lossy().to_string()),
            ..settings::Settings::default()
        }
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(EXTRACT_PATH)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    fn remaining_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn extracts_lines_joined_by_newline() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubRecognizer::ok(vec![("Hello", 0.9), ("World", 0.8)]);
        let seen = stub.seen.clone();
        let app = build_router(test_settings(dir.path()), Arc::new(stub)).unwrap();

        let (status, body) = send(app, upload_request(&[("file", Some("sample.png"), &b"image-bytes"[..])])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "extracted_text": "Hello\nWorld" }));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.contents, vec![b"image-bytes".to_vec()]);
        assert_eq!(seen.langs, vec!["japan".to_string()]);
        assert!(seen.paths[0].starts_with(dir.path()));
        assert!(!seen.paths[0].exists());
        assert_eq!(remaining_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn recognizer_error_returns_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubRecognizer::failing();
        let seen = stub.seen.clone();
        let app = build_router(test_settings(dir.path()), Arc::new(stub)).unwrap();

        let (status, body) = send(app, upload_request(&[("file", Some("broken.png"), &b"garbage"[..])])).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "unsupported image format" }));
        assert_eq!(seen.lock().unwrap().paths.len(), 1);
        assert_eq!(remaining_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected_before_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubRecognizer::ok(vec![("unused", 1.0)]);
        let seen = stub.seen.clone();
        let app = build_router(test_settings(dir.path()), Arc::new(stub)).unwrap();

        let (status, body) = send(app, upload_request(&[("note", None, &b"hello"[..])])).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "missing required field: file");
        assert!(seen.lock().unwrap().paths.is_empty());
        assert_eq!(remaining_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn non_multipart_body_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_settings(dir.path()), Arc::new(StubRecognizer::ok(Vec::new()))).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(EXTRACT_PATH)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn lang_field_overrides_configured_language() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubRecognizer::ok(vec![("Invoice", 0.95)]);
        let seen = stub.seen.clone();
        let app = build_router(test_settings(dir.path()), Arc::new(stub)).unwrap();

        let (status, body) = send(
            app,
            upload_request(&[("lang", None, &b"en"[..]), ("file", Some("invoice.png"), &b"bytes"[..])]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["extracted_text"], "Invoice");
        assert_eq!(seen.lock().unwrap().langs, vec!["en".to_string()]);
    }

    #[tokio::test]
    async fn identical_filenames_get_distinct_temp_paths() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubRecognizer::ok(vec![("ok", 1.0)]);
        let seen = stub.seen.clone();
        let app = build_router(test_settings(dir.path()), Arc::new(stub)).unwrap();

        let first = send(app.clone(), upload_request(&[("file", Some("scan.png"), &b"one"[..])]));
        let second = send(app, upload_request(&[("file", Some("scan.png"), &b"two"[..])]));
        let ((first_status, _), (second_status, _)) = tokio::join!(first, second);

        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.paths.len(), 2);
        assert_ne!(seen.paths[0], seen.paths[1]);
        assert_eq!(remaining_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings::Settings {
            max_upload_bytes: 16,
            ..test_settings(dir.path())
        };
        let stub = StubRecognizer::ok(vec![("unused", 1.0)]);
        let seen = stub.seen.clone();
        let app = build_router(settings, Arc::new(stub)).unwrap();

        let (status, _) = send(app, upload_request(&[("file", Some("big.png"), &[0u8; 1024][..])])).await;

        assert!(status.is_client_error());
        assert!(seen.lock().unwrap().paths.is_empty());
        assert_eq!(remaining_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn demo_page_contains_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_settings(dir.path()), Arc::new(StubRecognizer::ok(Vec::new()))).unwrap();
        let request = Request::builder().uri("/demo").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<form"));
        assert!(html.contains("id=\"ocr-form\""));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_settings(dir.path()), Arc::new(StubRecognizer::ok(Vec::new()))).unwrap();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
