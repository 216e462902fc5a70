//! Development server implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::sync::{broadcast, mpsc};
use tower_http::services::ServeDir;

use pukidocs_config::{ConfigError, SiteConfig};
use pukidocs_static::{BuildConfig, BuildError, BuildResult, StaticBuilder};

use crate::watcher::{FileWatcher, WatchEvent, WatchTargets};
use crate::websocket::{reload_client_script, ReloadHub, ReloadMessage};

const RELOAD_SOCKET_PATH: &str = "/__livereload";
const RELOAD_SCRIPT_PATH: &str = "/__livereload.js";

/// Quiet period before a burst of file events triggers a rebuild.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Project root that relative config paths resolve against
    pub root: PathBuf,

    /// Path to mkdocs.yml
    pub config_path: PathBuf,

    /// Address to bind, `host:port`
    pub addr: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            config_path: PathBuf::from(pukidocs_config::CONFIG_FILENAME),
            addr: "127.0.0.1:8000".to_string(),
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("File watch error: {0}")]
    Watch(String),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    build_dir: PathBuf,
    hub: ReloadHub,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build the site, serve it and rebuild on changes until Ctrl+C.
    pub async fn start(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(&self.config.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.addr.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(ServerError::Serve)?;

        let build_dir = std::env::temp_dir()
            .join("pukidocs-serve")
            .join(addr.port().to_string());

        let site = SiteConfig::load(&self.config.config_path)?;
        let docs_dir = self.config.root.join(&site.docs_dir);

        let initial = {
            let config = self.config.clone();
            let dir = build_dir.clone();
            tokio::task::spawn_blocking(move || build_site(&config, &dir, true)).await??
        };
        tracing::info!(
            "Built {} pages ({} fallback) in {}ms",
            initial.pages,
            initial.fallback_pages,
            initial.duration_ms
        );

        let state = Arc::new(ServerState {
            config: self.config.clone(),
            build_dir: build_dir.clone(),
            hub: ReloadHub::new(),
        });

        let targets = WatchTargets {
            docs_dir,
            config_file: self.config.config_path.clone(),
        };
        let (watcher, rx) =
            FileWatcher::new(&targets).map_err(|e| ServerError::Watch(e.to_string()))?;

        let watch_state = Arc::clone(&state);
        tokio::spawn(async move {
            watch_loop(&watch_state, rx).await;
            drop(watcher);
        });

        let app = router(state);
        let url = format!("http://{}/", addr);
        tracing::info!("Serving on {}", url);

        if self.config.open {
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)?;

        if let Err(e) = std::fs::remove_dir_all(&build_dir) {
            tracing::debug!("Failed to remove {}: {}", build_dir.display(), e);
        }

        Ok(())
    }
}

fn router(state: Arc<ServerState>) -> Router {
    let files = ServeDir::new(&state.build_dir);

    Router::new()
        .route(RELOAD_SOCKET_PATH, get(ws_handler))
        .route(RELOAD_SCRIPT_PATH, get(reload_script_handler))
        .fallback_service(files)
        .with_state(state)
}

/// Load the configuration and build the site into the scratch directory.
///
/// The configuration is read on every call so edits to mkdocs.yml take
/// effect on the next rebuild.
fn build_site(
    config: &DevServerConfig,
    build_dir: &Path,
    clean: bool,
) -> Result<BuildResult, ServerError> {
    let site = SiteConfig::load(&config.config_path)?;

    let mut build = BuildConfig::new(site, &config.root);
    build.site_dir = build_dir.to_path_buf();
    build.base_url = "/".to_string();
    build.minify = false;
    build.clean = clean;
    build.live_reload = Some(RELOAD_SCRIPT_PATH.to_string());

    Ok(StaticBuilder::new(build).build()?)
}

/// Coalesce bursts of watch events and rebuild once per burst.
async fn watch_loop(state: &Arc<ServerState>, mut rx: mpsc::Receiver<WatchEvent>) {
    while let Some(first) = rx.recv().await {
        let mut events = vec![first];
        while let Ok(Some(event)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {
            events.push(event);
        }

        for event in &events {
            tracing::debug!("{}", event);
        }
        tracing::info!("{}, rebuilding", events[0]);

        // removed files would otherwise linger in the output
        let clean = events
            .iter()
            .any(|e| matches!(e, WatchEvent::Removed(_) | WatchEvent::Config(_)));
        rebuild(state, clean).await;
    }
}

async fn rebuild(state: &Arc<ServerState>, clean: bool) {
    let config = state.config.clone();
    let dir = state.build_dir.clone();

    match tokio::task::spawn_blocking(move || build_site(&config, &dir, clean)).await {
        Ok(Ok(result)) => {
            tracing::info!(
                "Rebuilt {} pages in {}ms",
                result.pages,
                result.duration_ms
            );
            state.hub.send(ReloadMessage::Reload);
        }
        Ok(Err(e)) => {
            tracing::error!("Rebuild failed: {}", e);
            state.hub.send(ReloadMessage::BuildFailed {
                message: e.to_string(),
            });
        }
        Err(e) => tracing::error!("Build task failed: {}", e),
    }
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    if send_message(&mut socket, &ReloadMessage::Connected)
        .await
        .is_err()
    {
        return;
    }

    loop {
        match rx.recv().await {
            Ok(msg) => {
                if send_message(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            // a slow client only needs the latest state
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

/// Handler for the live reload client script.
async fn reload_script_handler() -> impl IntoResponse {
    let script = reload_client_script(RELOAD_SOCKET_PATH);
    ([("content-type", "application/javascript")], script)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
