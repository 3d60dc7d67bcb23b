//! HTTP front door.
//!
//! | Route | Handler |
//! |---|---|
//! | `/t<abs path>` | thumbnail from the cache, generated on a miss |
//! | `/o<abs path>` | the original file |
//! | `/favicon.ico` | always 404 |
//! | `/`, `/<dir>` | gallery page for a directory under the served root |
//!
//! Every path goes through the guard before touching the filesystem. Escapes
//! and missing files are indistinguishable to the client (both 404).

use crate::gallery::{self, GalleryError, PageSettings};
use crate::guard::GuardError;
use crate::store::{StoreError, ThumbnailStore};
use axum::Router;
use axum::extract::{Path as UrlPath, Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use maud::Markup;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ThumbnailStore>,
    pub page: Arc<PageSettings>,
}

impl AppState {
    pub fn new(store: ThumbnailStore, version: &str) -> Self {
        let config = store.config();
        let page = PageSettings {
            thumb_width: config.max_width,
            thumb_height: config.max_height,
            version: version.to_string(),
        };
        Self {
            store: Arc::new(store),
            page: Arc::new(page),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/favicon.ico", get(favicon))
        .route("/t/{*path}", get(thumbnail))
        .route("/o/{*path}", get(original))
        .route("/", get(gallery_root))
        .route("/{*path}", get(gallery_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, announce the LAN URL and serve until the process is stopped.
pub async fn serve(state: AppState, bind: IpAddr, port: u16) -> std::io::Result<()> {
    let root = state.store.served_root().path().display().to_string();
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(bind, port)).await?;
    let addr = listener.local_addr()?;

    println!("Serving {root} at http://{}:{}", lan_host(), addr.port());
    info!(%addr, cache = %state.store.cache_root().display(), "listening");

    axum::serve(listener, router(state)).await
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("file not found")]
    NotFound,
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Guard(_)
            | AppError::NotFound
            | AppError::Store(StoreError::SourceNotFound(_)) => {
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
            // Logged with the source path by the store
            AppError::Store(StoreError::Generation(_)) => {
                (StatusCode::BAD_REQUEST, "Thumbnail generation failed").into_response()
            }
            AppError::Task(e) => {
                error!(error = %e, "thumbnail task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// The capture drops the leading slash of the absolute source path.
fn absolute(captured: &str) -> PathBuf {
    Path::new("/").join(captured)
}

async fn thumbnail(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    req: Request,
) -> Result<Response, AppError> {
    let source = state.store.served_root().resolve(absolute(&path))?;

    let store = Arc::clone(&state.store);
    let cache_path = tokio::task::spawn_blocking(move || store.get(&source)).await??;

    Ok(serve_file(cache_path, req).await)
}

async fn original(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    req: Request,
) -> Result<Response, AppError> {
    let source = state.store.served_root().resolve(absolute(&path))?;
    if !source.is_file() {
        return Err(AppError::NotFound);
    }
    Ok(serve_file(source, req).await)
}

async fn serve_file(path: PathBuf, req: Request) -> Response {
    match ServeFile::new(path).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

async fn gallery_root(State(state): State<AppState>) -> Response {
    render_dir(&state, "")
}

async fn gallery_dir(State(state): State<AppState>, UrlPath(path): UrlPath<String>) -> Response {
    render_dir(&state, &path)
}

fn render_dir(state: &AppState, path: &str) -> Response {
    let request_path = format!("/{}", path.trim_end_matches('/'));
    let listing = state
        .store
        .served_root()
        .resolve(path)
        .map_err(|_| GalleryError::NotFound(PathBuf::from(&request_path)))
        .and_then(|dir| gallery::list(&dir, &request_path));

    match listing {
        Ok(listing) => page(
            StatusCode::OK,
            gallery::render_gallery(&listing, &request_path, &state.page),
        ),
        Err(e) if e.is_not_found() => page(
            StatusCode::NOT_FOUND,
            gallery::render_error("Not found", &state.page),
        ),
        Err(e) => {
            error!(path = %request_path, error = %e, "failed to list directory");
            page(
                StatusCode::INTERNAL_SERVER_ERROR,
                gallery::render_error("Could not read directory", &state.page),
            )
        }
    }
}

fn page(status: StatusCode, markup: Markup) -> Response {
    (status, Html(markup.into_string())).into_response()
}

// ============================================================================
// LAN address
// ============================================================================

/// Host name other machines on the LAN can use to reach this one.
pub fn lan_host() -> String {
    host_or_localhost(&gethostname::gethostname().to_string_lossy())
}

fn host_or_localhost(name: &str) -> String {
    match name.trim() {
        "" => "localhost".to_string(),
        name => mdns_name(name),
    }
}

/// Bare host names get the mDNS `.local` suffix; qualified ones are kept.
fn mdns_name(host: &str) -> String {
    if host.contains('.') || host == "localhost" {
        host.to_string()
    } else {
        format!("{host}.local")
    }
}
