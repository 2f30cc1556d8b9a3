//! Preview server for the generated site, with live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::generate;
use crate::config::Fallback;
use crate::content::ContentError;
use crate::generator::Generator;
use crate::routes::{PathParams, PostRoute, StaticRoute};
use crate::Blog;

/// API endpoints served alongside the static pages
pub const API_ROUTES: &[&str] = &["/api/hello"];

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
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Generated 404 page, relative to the public directory
const NOT_FOUND_PAGE: &str = "404.html";

/// Server state
struct ServerState {
    public_dir: PathBuf,
    fallback: Fallback,
    generator: Generator,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

#[derive(Debug, Serialize)]
struct Greeting {
    name: &'static str,
}

/// `/api/hello`: the same greeting for every method and query
async fn hello() -> Json<Greeting> {
    Json(Greeting { name: "John Doe" })
}

/// Build the router serving `blog`'s public directory
pub fn router(blog: &Blog, live_reload: bool, reload_tx: broadcast::Sender<()>) -> Result<Router> {
    let state = Arc::new(ServerState {
        public_dir: blog.public_dir.clone(),
        fallback: blog.config.fallback,
        generator: Generator::new(blog)?,
        reload_tx,
        live_reload,
    });

    Ok(Router::new()
        .route("/api/hello", any(hello))
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the preview server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let app = router(blog, watch, reload_tx.clone())?;

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
        let blog = blog.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(blog, reload_tx) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch posts and config, regenerate, then tell browsers to reload
fn watch_and_reload(blog: Blog, reload_tx: broadcast::Sender<()>) -> Result<()> {
    generate::watch_sources(&blog, |_| {
        if generate::rebuild(&blog.base_dir) {
            // No receivers just means no browser is connected
            let _ = reload_tx.send(());
        }
    })
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
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

/// Serve generated files; unknown paths go through the fallback policy
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();

    let file_path = match resolve_file(&state.public_dir, &path) {
        Some(file_path) => file_path,
        None => match render_on_demand(&state, &path).await {
            Ok(Some(file_path)) => file_path,
            Ok(None) => return not_found(&state).await,
            Err(e) => {
                tracing::error!("Failed to render {}: {:#}", path, e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response();
            }
        },
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) if state.live_reload => Html(inject_live_reload(&content)).into_response(),
            Ok(content) => Html(content).into_response(),
            Err(_) => not_found(&state).await,
        }
    } else {
        let mut service = ServeDir::new(&state.public_dir);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

/// Map a request path to a file under `public_dir`.
///
/// Directories resolve to their `index.html`, extensionless paths also try
/// `<path>.html`. Anything that would leave `public_dir` resolves to `None`,
/// and so does the 404 page, which is only ever served with a 404 status.
fn resolve_file(public_dir: &Path, path: &str) -> Option<PathBuf> {
    locate_file(public_dir, path).filter(|file| *file != public_dir.join(NOT_FOUND_PAGE))
}

fn locate_file(public_dir: &Path, path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let candidate = public_dir.join(relative);
    if candidate.is_dir() {
        let index = candidate.join("index.html");
        return index.is_file().then_some(index);
    }
    if candidate.is_file() {
        return Some(candidate);
    }

    let with_html = candidate.with_extension("html");
    with_html.is_file().then_some(with_html)
}

/// Under the blocking policy, render a post that was not generated yet
async fn render_on_demand(state: &Arc<ServerState>, path: &str) -> Result<Option<PathBuf>> {
    if state.fallback != Fallback::Blocking {
        return Ok(None);
    }

    let route = PostRoute::new(state.fallback);
    let Some(id) = PathParams::match_pattern(route.pattern(), path)
        .and_then(|params| params.get("id").map(str::to_string))
    else {
        return Ok(None);
    };

    let state = Arc::clone(state);
    let rendered = tokio::task::spawn_blocking(move || state.generator.render_post(&id)).await?;

    match rendered {
        Ok(file_path) => {
            tracing::info!("Rendered on demand: {:?}", file_path);
            Ok(Some(file_path))
        }
        Err(e) if is_missing_post(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_missing_post(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ContentError>()
        .map(ContentError::is_not_found)
        .unwrap_or(false)
}

/// 404 page with a 404 status
async fn not_found(state: &ServerState) -> Response {
    let page = match tokio::fs::read_to_string(state.public_dir.join(NOT_FOUND_PAGE)).await {
        Ok(page) => Some(page),
        Err(_) => state.generator.render_not_found().ok(),
    };

    match page {
        Some(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
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
