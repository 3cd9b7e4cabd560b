//! HTTP server: pages, JSON API and the contact endpoint

use anyhow::Result;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::contact::{
    ContactError, ContactHandler, ContactOutcome, ContactSubmission, Mailer, RequestInfo,
};
use crate::content::ContentLoader;
use crate::templates::TemplateRenderer;
use crate::Folio;

/// Shared, read-only server state
pub struct AppState<M> {
    pub folio: Folio,
    pub loader: ContentLoader,
    pub templates: TemplateRenderer,
    pub contact: ContactHandler<M>,
}

impl<M: Mailer> AppState<M> {
    pub fn new(folio: Folio, contact: ContactHandler<M>) -> Result<Self> {
        Ok(Self {
            loader: ContentLoader::new(&folio),
            templates: TemplateRenderer::new()?,
            folio,
            contact,
        })
    }

    /// Turn a rendered page into a response, logging template failures
    fn page(&self, status: StatusCode, rendered: Result<String>) -> Response {
        match rendered {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Template rendering failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }

    fn not_found(&self) -> Response {
        self.page(
            StatusCode::NOT_FOUND,
            self.templates.not_found(&self.folio.config),
        )
    }

    fn error_page(&self) -> Response {
        self.page(
            StatusCode::INTERNAL_SERVER_ERROR,
            self.templates.error(&self.folio.config),
        )
    }
}

/// `{ok, error?}` body returned by the JSON endpoints
#[derive(Debug, Serialize)]
struct ApiReply {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiReply {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let status = match &self {
            ContactError::Invalid(_) => StatusCode::BAD_REQUEST,
            ContactError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ContactError::Provider(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(ApiReply::error(self.to_string()))).into_response()
    }
}

/// Build the application router
pub fn router<M: Mailer>(state: Arc<AppState<M>>) -> Router {
    Router::new()
        .route("/", get(home::<M>))
        .route("/blog", get(blog_index::<M>))
        .route("/blog/:slug", get(blog_post::<M>))
        .route("/api/posts", get(api_posts::<M>))
        .route("/api/posts/:slug", get(api_post::<M>))
        .route("/api/contact", post(contact::<M>))
        .fallback(fallback_handler::<M>)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16) -> Result<()> {
    if !folio.content_dir.is_dir() {
        tracing::warn!(
            "Content directory {:?} does not exist; blog pages will fail",
            folio.content_dir
        );
    }

    let contact = ContactHandler::from_env(&folio.config);
    let state = Arc::new(AppState::new(folio.clone(), contact)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Landing page with the newest posts
async fn home<M: Mailer>(State(state): State<Arc<AppState<M>>>) -> Response {
    let posts = match state.loader.load_posts() {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!("Failed to load posts for home page: {}", e);
            Vec::new()
        }
    };
    let latest = &posts[..posts.len().min(state.folio.config.latest_posts)];
    let form_start = Utc::now().timestamp_millis();

    state.page(
        StatusCode::OK,
        state.templates.home(&state.folio.config, latest, form_start),
    )
}

async fn blog_index<M: Mailer>(State(state): State<Arc<AppState<M>>>) -> Response {
    match state.loader.load_posts() {
        Ok(posts) => state.page(
            StatusCode::OK,
            state.templates.blog_index(&state.folio.config, &posts),
        ),
        Err(e) => {
            tracing::error!("Failed to load posts: {}", e);
            state.error_page()
        }
    }
}

async fn blog_post<M: Mailer>(
    State(state): State<Arc<AppState<M>>>,
    Path(slug): Path<String>,
) -> Response {
    match state.loader.find_post(&slug) {
        Some(post) => state.page(
            StatusCode::OK,
            state.templates.post(&state.folio.config, &post),
        ),
        None => state.not_found(),
    }
}

async fn api_posts<M: Mailer>(State(state): State<Arc<AppState<M>>>) -> Response {
    match state.loader.load_posts() {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => {
            tracing::error!("Failed to load posts: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiReply::error("Failed to load posts")),
            )
                .into_response()
        }
    }
}

async fn api_post<M: Mailer>(
    State(state): State<Arc<AppState<M>>>,
    Path(slug): Path<String>,
) -> Response {
    match state.loader.find_post(&slug) {
        Some(post) => Json(post).into_response(),
        None => (StatusCode::NOT_FOUND, Json(ApiReply::error("Not found"))).into_response(),
    }
}

async fn contact<M: Mailer>(
    State(state): State<Arc<AppState<M>>>,
    headers: HeaderMap,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Response {
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            tracing::debug!("Rejected contact payload: {}", rejection);
            return ContactError::Invalid("Invalid payload".to_string()).into_response();
        }
    };

    let info = RequestInfo::now(client_ip(&headers));
    match state.contact.handle(&submission, &info).await {
        Ok(ContactOutcome::Sent) | Ok(ContactOutcome::Dropped(_)) => {
            Json(ApiReply::ok()).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// First address of `X-Forwarded-For`, for the message footer
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Serve static files, or the not-found page
async fn fallback_handler<M: Mailer>(
    State(state): State<Arc<AppState<M>>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.folio.static_dir).append_index_html_on_directories(false);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => state.not_found(),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::contact::{handler_with, RecordingMailer};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestSite {
        _dir: TempDir,
        state: Arc<AppState<RecordingMailer>>,
    }

    fn site_with(posts: &[(&str, &str)], contact: ContactHandler<RecordingMailer>) -> TestSite {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.title = "Jane Doe".to_string();
        let folio = Folio::with_config(dir.path(), config);

        fs::create_dir_all(&folio.content_dir).unwrap();
        for (name, content) in posts {
            fs::write(folio.content_dir.join(name), content).unwrap();
        }
        fs::create_dir_all(folio.static_dir.join("images")).unwrap();
        fs::write(folio.static_dir.join("images/hello.txt"), "static hello").unwrap();

        let state = Arc::new(AppState::new(folio, contact).unwrap());
        TestSite { _dir: dir, state }
    }

    fn default_site() -> TestSite {
        site_with(
            &[
                ("first.md", "---\ntitle: First\ndate: 2023-01-01\n---\nFirst body"),
                ("second.md", "---\ntitle: Second\ndate: 2023-06-01\n---\nSecond body"),
                ("third.md", "---\ntitle: Third\ndate: 2024-01-01\n---\n# Third heading"),
                ("fourth.md", "---\ntitle: Fourth\ndate: 2024-05-01\n---\nFourth body"),
            ],
            handler_with(RecordingMailer::default()),
        )
    }

    async fn send(site: &TestSite, request: Request<Body>) -> (StatusCode, String) {
        let response = router(site.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn contact_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn sent_count(site: &TestSite) -> usize {
        site.state
            .contact
            .mailer()
            .map(|m| m.sent.lock().unwrap().len())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_api_posts_newest_first() {
        let site = default_site();
        let (status, body) = send(&site, get_request("/api/posts")).await;
        assert_eq!(status, StatusCode::OK);

        let posts: serde_json::Value = serde_json::from_str(&body).unwrap();
        let slugs: Vec<_> = posts
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(slugs, vec!["fourth", "third", "second", "first"]);
        assert_eq!(posts[0]["date"], "2024-05-01T00:00:00.000Z");
        assert_eq!(posts[0]["readingMinutes"], 1);
    }

    #[tokio::test]
    async fn test_api_post_lookup() {
        let site = default_site();
        let (status, body) = send(&site, get_request("/api/posts/third")).await;
        assert_eq!(status, StatusCode::OK);
        let post: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(post["meta"]["title"], "Third");
        assert!(post["contentHtml"].as_str().unwrap().contains("<h1>Third heading</h1>"));

        let (status, body) = send(&site, get_request("/api/posts/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"ok":false,"error":"Not found"}"#);
    }

    #[tokio::test]
    async fn test_home_shows_latest_three() {
        let site = default_site();
        let (status, body) = send(&site, get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Fourth"));
        assert!(body.contains("Third"));
        assert!(body.contains("Second"));
        assert!(!body.contains("/blog/first"));
        assert!(body.contains("data-form-start="));
    }

    #[tokio::test]
    async fn test_blog_pages() {
        let site = default_site();
        let (status, body) = send(&site, get_request("/blog")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/blog/first"));
        assert!(body.find("Fourth").unwrap() < body.find("First").unwrap());

        let (status, body) = send(&site, get_request("/blog/third")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Third heading</h1>"));

        let (status, body) = send(&site, get_request("/blog/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));

        let (status, _) = send(&site, get_request("/blog/..%2F..%2F_config")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_content_dir() {
        let site = default_site();
        fs::remove_dir_all(&site.state.folio.content_dir).unwrap();

        let (status, body) = send(&site, get_request("/api/posts")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("\"ok\":false"));

        let (status, body) = send(&site, get_request("/blog")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Something went wrong"));

        // the landing page still renders without posts
        let (status, _) = send(&site, get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_files_and_unknown_paths() {
        let site = default_site();
        let (status, body) = send(&site, get_request("/images/hello.txt")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "static hello");

        let (status, body) = send(&site, get_request("/no/such/page")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_contact_valid_submission() {
        let site = default_site();
        let (status, body) = send(
            &site,
            contact_request(serde_json::json!({
                "email": "visitor@example.com",
                "message": "hi",
                "honeypot": "",
                "human": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
        assert_eq!(sent_count(&site), 1);

        let mailer = site.state.contact.mailer().unwrap();
        let email = mailer.sent.lock().unwrap()[0].clone();
        assert_eq!(email.reply_to, "visitor@example.com");
        assert!(email.html.contains("198.51.100.4"));
    }

    #[tokio::test]
    async fn test_contact_validation_errors() {
        let site = default_site();

        let (status, body) = send(
            &site,
            contact_request(serde_json::json!({
                "email": "visitor@example.com",
                "message": "h",
                "human": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("\"ok\":false"));

        let (status, body) = send(
            &site,
            contact_request(serde_json::json!({ "email": "visitor@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"ok":false,"error":"Invalid payload"}"#);

        let garbage = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&site, garbage).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(sent_count(&site), 0);
    }

    #[tokio::test]
    async fn test_contact_spam_is_disguised() {
        let site = default_site();

        let (status, body) = send(
            &site,
            contact_request(serde_json::json!({
                "email": "bot@example.com",
                "message": "cheap pills",
                "honeypot": "filled",
                "human": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);

        let (status, _) = send(
            &site,
            contact_request(serde_json::json!({
                "email": "bot@example.com",
                "message": "cheap pills",
                "human": true,
                "formStart": Utc::now().timestamp_millis(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(sent_count(&site), 0);
    }

    #[tokio::test]
    async fn test_contact_unconfigured() {
        let site = site_with(&[], ContactHandler::new(&SiteConfig::default(), None));
        let (status, body) = send(
            &site,
            contact_request(serde_json::json!({
                "email": "visitor@example.com",
                "message": "Hello",
                "human": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"ok":false,"error":"Email service not configured"}"#);
    }

    #[tokio::test]
    async fn test_contact_provider_failure() {
        let site = site_with(
            &[],
            handler_with(RecordingMailer {
                fail: true,
                ..Default::default()
            }),
        );
        let (status, body) = send(
            &site,
            contact_request(serde_json::json!({
                "email": "visitor@example.com",
                "message": "Hello",
                "human": true,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, r#"{"ok":false,"error":"Email provider error"}"#);
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");
        headers.insert("x-forwarded-for", " 203.0.113.9 , 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.9");
    }
}
