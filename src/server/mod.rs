//! Development server rendering pages straight from the content tree

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::CONFIG_FILE;
use crate::views::SiteViews;
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Blog and page builders for the current configuration
struct Site {
    blog: Blog,
    views: SiteViews,
}

impl Site {
    fn load(blog: Blog) -> Result<Self> {
        let views = blog.views()?;
        Ok(Self { blog, views })
    }
}

/// Server state
struct ServerState {
    site: RwLock<Arc<Site>>,
    static_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    fn site(&self) -> Arc<Site> {
        match self.site.read() {
            Ok(site) => site.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, site: Site) {
        match self.site.write() {
            Ok(mut current) => *current = Arc::new(site),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(site),
        }
    }

    /// Wrap a rendered page, injecting the reload script when enabled
    fn page(&self, status: StatusCode, html: String) -> Response {
        let html = if self.live_reload {
            inject_live_reload(&html)
        } else {
            html
        };
        (status, Html(html)).into_response()
    }

    fn not_found(&self) -> Result<Response, ServerError> {
        let html = self.site().views.not_found()?;
        Ok(self.page(StatusCode::NOT_FOUND, html))
    }

    fn found_or_404(&self, html: Option<String>) -> Result<Response, ServerError> {
        match html {
            Some(html) => Ok(self.page(StatusCode::OK, html)),
            None => self.not_found(),
        }
    }
}

/// A failed render, reported as a 500
#[derive(Debug)]
struct ServerError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ServerError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

type PageResult = Result<Response, ServerError>;

/// Build the router without binding a socket
fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/blog", get(blog_handler))
        .route("/blog/", get(blog_handler))
        .route("/blog/:year/:month/:slug", get(post_handler))
        .route("/blog/:year/:month/:slug/", get(post_handler))
        .route("/category/:name", get(category_handler))
        .route("/category/:name/", get(category_handler))
        .route("/tag/:name", get(tag_handler))
        .route("/tag/:name/", get(tag_handler))
        .route("/about", get(about_handler))
        .route("/about/", get(about_handler))
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        site: RwLock::new(Arc::new(Site::load(blog.clone())?)),
        static_dir: blog.base_dir.join("static"),
        reload_tx,
        live_reload: watch,
    });

    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let watch_state = state.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(watch_state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch content and configuration, notifying browsers on change
fn watch_and_reload(state: Arc<ServerState>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    let site = state.site();
    let content_dir = site.blog.content_dir.clone();
    let config_path = site.blog.base_dir.join(CONFIG_FILE);
    drop(site);

    if content_dir.exists() {
        debouncer
            .watcher()
            .watch(&content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", content_dir);
    }
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path = e.path.to_string_lossy();
                        !path.contains(".git") && !path.contains(".DS_Store") && !path.ends_with('~')
                    })
                    .collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                if relevant.iter().any(|e| e.path.ends_with(CONFIG_FILE)) {
                    let base_dir = state.site().blog.base_dir.clone();
                    match Blog::new(&base_dir).and_then(Site::load) {
                        Ok(site) => state.replace(site),
                        Err(e) => {
                            tracing::error!("Configuration reload failed: {:#}", e);
                            continue;
                        }
                    }
                }

                // Pages render per request, so a reload is all that is needed
                let _ = state.reload_tx.send(());
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn home_handler(State(state): State<Arc<ServerState>>) -> PageResult {
    let site = state.site();
    let html = site.views.home(&site.blog.index().load())?;
    Ok(state.page(StatusCode::OK, html))
}

async fn blog_handler(State(state): State<Arc<ServerState>>) -> PageResult {
    let site = state.site();
    let html = site.views.blog(&site.blog.index().load())?;
    Ok(state.page(StatusCode::OK, html))
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path((year, month, slug)): Path<(String, String, String)>,
) -> PageResult {
    let site = state.site();
    let html = match site.blog.index().post(&year, &month, &slug)? {
        Some(post) => Some(site.views.post(&post).await?),
        None => None,
    };
    state.found_or_404(html)
}

async fn category_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> PageResult {
    let site = state.site();
    let html = site.views.category(&site.blog.index().load(), &name)?;
    state.found_or_404(html)
}

async fn tag_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> PageResult {
    let site = state.site();
    let html = site.views.tag(&site.blog.index().load(), &name)?;
    state.found_or_404(html)
}

async fn about_handler(State(state): State<Arc<ServerState>>) -> PageResult {
    let html = state.site().views.about().await?;
    Ok(state.page(StatusCode::OK, html))
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serve assets from `<base>/static`; anything else gets the 404 page
async fn fallback_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> PageResult {
    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => Ok(response.into_response()),
        Ok(_) => state.not_found(),
        Err(e) => Err(e.into()),
    }
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
