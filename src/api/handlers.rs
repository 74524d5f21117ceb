//! HTTP request handlers

use super::socket::socket_handler;
use super::types::{
    AudioUploadResponse, ChatRequest, EntriesResponse, ErrorResponse, SubmitResponse,
};
use super::AppState;
use crate::contact::{ContactSubmission, ValidationError};
use crate::prompt::build_request;
use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;

/// Largest accepted audio upload
const AUDIO_UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // LLM proxy
        .route("/api/chat", post(chat))
        // Contact form
        .route("/api/submit-form", post(submit_form))
        .route("/api/form-entries", get(list_entries))
        // Audio upload
        .route(
            "/api/audio-chat",
            post(audio_chat).layer(DefaultBodyLimit::max(AUDIO_UPLOAD_LIMIT)),
        )
        // Audio relay socket
        .route("/socket", get(socket_handler))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let Some(llm) = state.llm.as_ref() else {
        return Err(AppError::Unavailable(
            "Chat is not configured on this server".to_string(),
        ));
    };
    if request.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let llm_request = build_request(
        &request.message,
        request.context.as_ref(),
        request.is_personalized,
    );
    let stream = llm.stream(&llm_request).await.map_err(|e| {
        tracing::error!(error = %e, kind = ?e.kind, "Chat generation failed");
        AppError::Upstream("Failed to generate response".to_string())
    })?;

    let body = Body::from_stream(stream.map(|chunk| chunk.map(Bytes::from)));
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response())
}

// ============================================================
// Contact Form
// ============================================================

async fn submit_form(
    State(state): State<AppState>,
    body: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let Json(submission) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let contact = submission.validate()?;

    let entry = state.store.insert(contact).await.map_err(|e| {
        tracing::error!(error = %e, "Error submitting form");
        AppError::Internal("Internal server error".to_string())
    })?;
    tracing::info!(id = %entry.id, "Contact entry added");

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            entry,
        }),
    ))
}

async fn list_entries(State(state): State<AppState>) -> Result<Json<EntriesResponse>, AppError> {
    let entries = state.store.list().await.map_err(|e| {
        tracing::error!(error = %e, "Error fetching form entries");
        AppError::Internal("Internal server error".to_string())
    })?;
    Ok(Json(EntriesResponse { entries }))
}

// ============================================================
// Audio Upload
// ============================================================

async fn audio_chat(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AudioUploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|_| no_audio())?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        tracing::info!(
            name = ?file_name,
            size = data.len(),
            content_type = ?content_type,
            "Received audio file"
        );

        return Ok(Json(AudioUploadResponse {
            success: true,
            message: "Audio received successfully".to_string(),
            file_size: data.len(),
            file_name,
        }));
    }

    Err(no_audio())
}

fn no_audio() -> AppError {
    AppError::BadRequest("No audio file provided".to_string())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("helloivy ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub(super) enum AppError {
    BadRequest(String),
    Internal(String),
    /// A required upstream service is not configured
    Unavailable(String),
    /// The upstream service failed
    Upstream(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactStore;
    use crate::db::{ContactEntry, Database, DbError, NewContact};
    use crate::llm::{LlmError, LlmRequest, LlmService, TextStream};
    use async_trait::async_trait;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Store wrapper that counts inserts and can be made to fail
    struct CountingStore {
        inner: Database,
        inserts: AtomicUsize,
        broken: bool,
    }

    impl CountingStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: Database::open_in_memory().unwrap(),
                inserts: AtomicUsize::new(0),
                broken: false,
            })
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self {
                inner: Database::open_in_memory().unwrap(),
                inserts: AtomicUsize::new(0),
                broken: true,
            })
        }

        fn fail<T>(&self) -> Result<T, DbError> {
            Err(DbError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    #[async_trait]
    impl ContactStore for CountingStore {
        async fn insert(&self, entry: NewContact) -> Result<ContactEntry, DbError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return self.fail();
            }
            self.inner.insert(entry).await
        }

        async fn list(&self) -> Result<Vec<ContactEntry>, DbError> {
            if self.broken {
                return self.fail();
            }
            self.inner.list().await
        }
    }

    /// LLM that streams fixed chunks and records prompts
    struct MockLlm {
        chunks: Vec<&'static str>,
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlm {
        fn replying(chunks: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                fail: false,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                chunks: vec![],
                fail: true,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmService for MockLlm {
        async fn stream(&self, request: &LlmRequest) -> Result<TextStream, LlmError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            if self.fail {
                return Err(LlmError::rate_limit("quota exceeded"));
            }
            let chunks: Vec<Result<String, LlmError>> =
                self.chunks.iter().map(|c| Ok((*c).to_string())).collect();
            Ok(futures::stream::iter(chunks).boxed())
        }

        fn model_id(&self) -> &str {
            "mock"
        }
    }

    fn app(store: Arc<CountingStore>, llm: Option<Arc<MockLlm>>) -> Router {
        create_router(AppState::new(
            store,
            llm.map(|l| l as Arc<dyn LlmService>),
        ))
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn read_json(response: Response) -> Value {
        serde_json::from_slice(&read_body(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_list() {
        let store = CountingStore::new();
        let app = app(store.clone(), None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/submit-form",
                &json!({"name": "Ada", "email": "ada@example.com", "message": "Hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["entry"]["name"], "Ada");
        assert!(body["entry"]["id"].is_string());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/form-entries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["entries"][0]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_store() {
        let store = CountingStore::new();
        let response = app(store.clone(), None)
            .oneshot(json_request(
                "POST",
                "/api/submit-form",
                &json!({"name": "Ada", "email": "not-an-email", "message": "Hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Invalid email format"})
        );
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let store = CountingStore::new();
        let response = app(store.clone(), None)
            .oneshot(json_request(
                "POST",
                "/api/submit-form",
                &json!({"name": "Ada", "message": "Hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Name, email, and message are required"})
        );
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let app = app(CountingStore::broken(), None);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/submit-form",
                &json!({"name": "Ada", "email": "ada@example.com", "message": "Hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Internal server error"})
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/form-entries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_chat_streams_plain_text() {
        let llm = MockLlm::replying(vec!["Stanford ", "sounds ", "great!"]);
        let response = app(CountingStore::new(), Some(llm.clone()))
            .oneshot(json_request(
                "POST",
                "/api/chat",
                &json!({
                    "message": "What should I write about?",
                    "context": {"currentStudy": "Chemistry"},
                    "isPersonalized": true
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(read_body(response).await, b"Stanford sounds great!");

        let prompts = llm.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("- Current study/interest: Chemistry"));
        assert!(prompts[0].ends_with("Student message: What should I write about?"));
    }

    #[tokio::test]
    async fn test_chat_errors() {
        let body = json!({"message": "Hi"});

        let unconfigured = app(CountingStore::new(), None)
            .oneshot(json_request("POST", "/api/chat", &body))
            .await
            .unwrap();
        assert_eq!(unconfigured.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(read_json(unconfigured).await["error"].is_string());

        let upstream = app(CountingStore::new(), Some(MockLlm::failing()))
            .oneshot(json_request("POST", "/api/chat", &body))
            .await
            .unwrap();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            read_json(upstream).await,
            json!({"error": "Failed to generate response"})
        );

        let empty = app(CountingStore::new(), Some(MockLlm::replying(vec!["x"])))
            .oneshot(json_request("POST", "/api/chat", &json!({"message": "  "})))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    fn multipart_request(field: &str) -> Request<Body> {
        let body = format!(
            "--XBOUNDARY\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"clip.webm\"\r\n\
             Content-Type: audio/webm\r\n\r\n\
             0123456789\r\n\
             --XBOUNDARY--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/audio-chat")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_audio_upload() {
        let response = app(CountingStore::new(), None)
            .oneshot(multipart_request("audio"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({
                "success": true,
                "message": "Audio received successfully",
                "fileSize": 10,
                "fileName": "clip.webm"
            })
        );

        let response = app(CountingStore::new(), None)
            .oneshot(multipart_request("other"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({"error": "No audio file provided"})
        );
    }

    #[tokio::test]
    async fn test_version() {
        let response = app(CountingStore::new(), None)
            .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(String::from_utf8(read_body(response).await)
            .unwrap()
            .starts_with("helloivy "));
    }
}
