//! HTTP API for updates and the contact form

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::cache::{IndexCache, IndexSource};
use crate::contact::{build_mailer, ContactRequest, FixedWindowLimiter, Mailer};
use crate::content::{ContentIndex, MarkdownRenderer, Post, PostMeta};
use crate::error::{self, Error};
use crate::query::{self, PostQuery, QueryResult};
use crate::Site;

/// Shared server state
pub struct AppState {
    pub index: IndexSource,
    pub renderer: Arc<MarkdownRenderer>,
    pub limiter: FixedWindowLimiter,
    pub mailer: Arc<dyn Mailer>,
    pub per_page: usize,
    pub site_title: String,
}

impl AppState {
    /// Build server state from the site configuration
    pub fn from_site(site: &Site, watch: bool) -> Self {
        let index = if watch {
            IndexSource::cached(&site.content_dir)
        } else {
            IndexSource::fresh(&site.content_dir)
        };
        let rate_limit = &site.config.contact.rate_limit;

        Self {
            index,
            renderer: Arc::new(MarkdownRenderer::with_theme(&site.config.highlight_theme)),
            limiter: FixedWindowLimiter::new(rate_limit.window(), rate_limit.max_requests),
            mailer: build_mailer(&site.config.contact),
            per_page: site.config.per_page,
            site_title: site.config.title.clone(),
        }
    }
}

/// Listing query string. Everything arrives as text and is interpreted
/// leniently: empty filters mean no filter, a bad page means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> PostQuery {
        let page = self.page.as_deref().map_or(1, parse_page);

        PostQuery {
            category: self.category.filter(|c| !c.is_empty()),
            tag: self.tag.filter(|t| !t.is_empty()),
            page,
        }
    }
}

/// Positive page number from text. Numbers too large for `usize` saturate
/// so the query clamps them to the last page; anything else is page 1.
fn parse_page(raw: &str) -> usize {
    let raw = raw.trim();
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    // All digits, so parsing can only fail on overflow
    digits.parse::<usize>().unwrap_or(usize::MAX).max(1)
}

#[derive(Debug, Serialize)]
struct CategoryListing {
    posts: Vec<PostMeta>,
    category: String,
}

#[derive(Debug, Serialize)]
struct TagListing {
    posts: Vec<PostMeta>,
    tag: String,
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/updates", get(list_updates))
        .route("/api/updates/:slug", get(get_update))
        .route("/api/updates/category/:category", get(category_updates))
        .route("/api/updates/tag/:tag", get(tag_updates))
        .route("/api/contact", post(contact))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn start(site: &Site, ip: &str, port: u16, watch: bool) -> Result<()> {
    let state = Arc::new(AppState::from_site(site, watch));

    if let IndexSource::Cached(cache) = &state.index {
        let cache = Arc::clone(cache);
        let dir = state.index.dir().to_path_buf();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_content(dir, cache) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let state_dir = state.index.dir().to_path_buf();
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Serving {:?} at http://{}:{}", state_dir, ip, port);
    if watch {
        println!("Watching for content changes...");
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Drop the cached index whenever the content directory changes
fn watch_content(dir: PathBuf, cache: Arc<IndexCache>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to collapse bursts of writes into one invalidation
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", dir);

    for result in rx {
        match result {
            Ok(events) => {
                let relevant = events.iter().any(|e| {
                    let path = e.path.to_string_lossy();
                    !path.contains(".DS_Store") && !path.ends_with('~')
                });
                if relevant {
                    for event in &events {
                        tracing::info!("Content changed: {}", event.path.display());
                    }
                    cache.invalidate();
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// Load the index off the async runtime and run `f` against it
async fn with_index<T, F>(state: &Arc<AppState>, f: F) -> error::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ContentIndex, &MarkdownRenderer) -> T + Send + 'static,
{
    let source = state.index.clone();
    let renderer = Arc::clone(&state.renderer);
    let out = tokio::task::spawn_blocking(move || {
        let index = source.load();
        f(index.as_ref(), renderer.as_ref())
    })
    .await?;
    Ok(out)
}

async fn list_updates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> error::Result<Json<QueryResult>> {
    let q = params.into_query();
    let per_page = state.per_page;
    let result = with_index(&state, move |index, _| {
        query::query_with_page_size(index.load_all(), &q, per_page)
    })
    .await?;
    Ok(Json(result))
}

async fn get_update(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> error::Result<Json<Post>> {
    let lookup = slug.clone();
    let post = with_index(&state, move |index, renderer| {
        if let Some(source) = index.source_of(&lookup) {
            tracing::debug!("Rendering {:?} from {:?}", lookup, source);
        }
        index.get_by_slug(&lookup, renderer)
    })
    .await?;
    post.map(Json).ok_or(Error::PostNotFound { slug })
}

async fn category_updates(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> error::Result<Json<CategoryListing>> {
    let filter = category.clone();
    let posts = with_index(&state, move |index, _| {
        query::by_category(index.load_all(), &filter)
    })
    .await?;
    Ok(Json(CategoryListing { posts, category }))
}

async fn tag_updates(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> error::Result<Json<TagListing>> {
    let filter = tag.clone();
    let posts = with_index(&state, move |index, _| {
        query::by_tag(index.load_all(), &filter)
    })
    .await?;
    Ok(Json(TagListing { posts, tag }))
}

async fn contact(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> error::Result<Json<Value>> {
    if state.limiter.check(addr.ip()) {
        tracing::warn!("Rate limited contact request from {}", addr.ip());
        return Err(Error::RateLimited);
    }

    let request: ContactRequest =
        serde_json::from_slice(&body).map_err(|_| Error::InvalidBody)?;
    let message = request.validate()?;
    let email = message.to_email(&state.site_title);

    state.mailer.send(&email).await?;
    tracing::info!("Contact message from {} delivered", message.email);

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{LogMailer, MailError, OutgoingEmail};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{header, Method, Request, StatusCode};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), MailError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: &OutgoingEmail) -> std::result::Result<(), MailError> {
            Err(MailError::Rejected {
                status: 500,
                body: "down".to_string(),
            })
        }
    }

    fn content_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for i in 1..=8 {
            let category = if i % 2 == 0 { "news" } else { "eng" };
            let content = format!(
                "---\ntitle: Post {i}\nslug: post-{i}\ndate: 2024-01-{i:02}\ncategory: {category}\ntags: all, t{i}\n---\n# Post {i}\n\nBody.\n"
            );
            fs::write(dir.path().join(format!("post-{i}.md")), content).unwrap();
        }
        dir
    }

    fn state(dir: &TempDir, mailer: Arc<dyn Mailer>, max_requests: u32) -> Arc<AppState> {
        Arc::new(AppState {
            index: IndexSource::fresh(dir.path()),
            renderer: Arc::new(MarkdownRenderer::new()),
            limiter: FixedWindowLimiter::new(Duration::from_secs(900), max_requests),
            mailer,
            per_page: 6,
            site_title: "Test Site".to_string(),
        })
    }

    fn app(state: Arc<AppState>) -> Router {
        router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4242))))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_contact(app: Router, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_list_params() {
        let q = ListParams {
            category: Some(String::new()),
            tag: Some("rust".to_string()),
            page: Some("abc".to_string()),
        }
        .into_query();
        assert_eq!(q.category, None);
        assert_eq!(q.tag.as_deref(), Some("rust"));
        assert_eq!(q.page, 1);

        let page = |p: &str| {
            ListParams {
                page: Some(p.to_string()),
                ..Default::default()
            }
            .into_query()
            .page
        };
        assert_eq!(page("3"), 3);
        assert_eq!(page("0"), 1);
        assert_eq!(page("-2"), 1);
        assert_eq!(page(" +4 "), 4);
        assert_eq!(page("1.5"), 1);
        assert_eq!(page("99999999999999999999"), usize::MAX);
        assert_eq!(ListParams::default().into_query().page, 1);
    }

    #[tokio::test]
    async fn test_list_updates() {
        let dir = content_dir();
        let app = app(state(&dir, Arc::new(LogMailer), 5));

        let (status, body) = get_json(app.clone(), "/api/updates").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["currentPage"], 1);
        assert_eq!(body["items"].as_array().unwrap().len(), 6);
        assert_eq!(body["items"][0]["slug"], "post-8");
        assert_eq!(body["categories"], json!(["news", "eng"]));

        let (_, body) = get_json(app.clone(), "/api/updates?page=9").await;
        assert_eq!(body["currentPage"], 2);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);

        let (_, body) = get_json(app.clone(), "/api/updates?page=99999999999999999999").await;
        assert_eq!(body["currentPage"], 2);

        let (_, body) = get_json(app.clone(), "/api/updates?category=news&tag=&page=abc").await;
        assert_eq!(body["items"].as_array().unwrap().len(), 4);
        assert_eq!(body["totalPages"], 1);

        let (_, body) = get_json(app, "/api/updates?category=missing").await;
        assert!(body["items"].as_array().unwrap().is_empty());
        assert_eq!(body["tags"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_get_update() {
        let dir = content_dir();
        let app = app(state(&dir, Arc::new(LogMailer), 5));

        let (status, body) = get_json(app.clone(), "/api/updates/post-3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Post 3");
        assert_eq!(body["readingTime"], 1);
        assert!(body["html"].as_str().unwrap().contains("<h1>Post 3</h1>"));

        let (status, body) = get_json(app, "/api/updates/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Post not found");
    }

    #[tokio::test]
    async fn test_facet_listings() {
        let dir = content_dir();
        let app = app(state(&dir, Arc::new(LogMailer), 5));

        let (status, body) = get_json(app.clone(), "/api/updates/category/eng").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "eng");
        let posts = body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 4);
        assert_eq!(posts[0]["slug"], "post-7");

        let (_, body) = get_json(app.clone(), "/api/updates/tag/all").await;
        assert_eq!(body["tag"], "all");
        assert_eq!(body["posts"].as_array().unwrap().len(), 8);

        let (status, body) = get_json(app, "/api/updates/tag/none").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["posts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contact_success() {
        let dir = content_dir();
        let mailer = Arc::new(RecordingMailer::default());
        let app = app(state(&dir, mailer.clone(), 5));

        let (status, body) = post_contact(
            app,
            r#"{"name": " Ada ", "email": "ada@example.com", "message": "Hi <there>"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Contact: Ada");
        assert!(sent[0].html.contains("Hi &lt;there&gt;"));
        assert!(sent[0].html.contains("Test Site"));
    }

    #[tokio::test]
    async fn test_contact_errors() {
        let dir = content_dir();
        let app = app(state(&dir, Arc::new(LogMailer), 10));

        let (status, body) = post_contact(app.clone(), "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");

        let (status, body) =
            post_contact(app.clone(), r#"{"name": "Ada", "email": "nope", "message": "x"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "A valid email is required");

        let failing = self::app(state(&dir, Arc::new(FailingMailer), 10));
        let (status, body) =
            post_contact(failing, r#"{"name": "Ada", "email": "a@b.c", "message": "x"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to send message. Please try again.");
    }

    #[tokio::test]
    async fn test_contact_rate_limit() {
        let dir = content_dir();
        let app = app(state(&dir, Arc::new(LogMailer), 2));
        let body = r#"{"name": "Ada", "email": "a@b.c", "message": "x"}"#;

        assert_eq!(post_contact(app.clone(), body).await.0, StatusCode::OK);
        // Invalid bodies still count against the window
        assert_eq!(post_contact(app.clone(), "{").await.0, StatusCode::BAD_REQUEST);

        let (status, body) = post_contact(app, body).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests. Please try again later.");
    }

    #[tokio::test]
    async fn test_cached_source_serves_same_index() {
        let dir = content_dir();
        let mut state = AppState {
            index: IndexSource::cached(dir.path()),
            ..Arc::try_unwrap(state(&dir, Arc::new(LogMailer), 5)).ok().unwrap()
        };
        state.per_page = 100;
        let cache = match &state.index {
            IndexSource::Cached(cache) => Arc::clone(cache),
            IndexSource::Fresh(_) => unreachable!(),
        };
        let app = app(Arc::new(state));

        let (_, body) = get_json(app.clone(), "/api/updates").await;
        assert_eq!(body["items"].as_array().unwrap().len(), 8);

        fs::write(dir.path().join("new.md"), "---\ntitle: New\nslug: new\n---\n").unwrap();
        let (_, body) = get_json(app.clone(), "/api/updates").await;
        assert_eq!(body["items"].as_array().unwrap().len(), 8);

        cache.invalidate();
        let (_, body) = get_json(app, "/api/updates").await;
        assert_eq!(body["items"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_watcher_invalidates_cache() {
        let dir = content_dir();
        let cache = Arc::new(IndexCache::new(dir.path()));
        assert_eq!(cache.get().len(), 8);

        let watched = Arc::clone(&cache);
        let watch_dir = dir.path().to_path_buf();
        std::thread::spawn(move || watch_content(watch_dir, watched));

        // Keep touching the directory until the watcher has picked it up
        let mut invalidated = false;
        for i in 0..100 {
            if i % 10 == 0 {
                let content = format!("---\ntitle: Late {i}\nslug: late-{i}\n---\n");
                fs::write(dir.path().join(format!("late-{i}.md")), content).unwrap();
            }
            std::thread::sleep(Duration::from_millis(100));
            if !cache.is_loaded() {
                invalidated = true;
                break;
            }
        }

        assert!(invalidated);
        assert!(cache.get().len() > 8);
    }
}
