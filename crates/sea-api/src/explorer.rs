//! Serves the API explorer: the HTML shell and static assets from the
//! public directory, and the rendered document as JSON.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use sea_docs::{DocumentModel, ExplorerRoute};

use crate::error::ApiError;

#[derive(Debug, Clone)]
struct ExplorerState {
    document: Arc<DocumentModel>,
}

/// Router for `<root>`, `<root>/` and everything below.
pub fn router(document: Arc<DocumentModel>) -> Router {
    let root = document.explorer().root().to_string();
    Router::new()
        .route(&root, get(serve))
        .route(&format!("{root}/"), get(serve))
        .route(&format!("{root}/{{*asset}}"), get(serve))
        .with_state(ExplorerState { document })
}

async fn serve(State(state): State<ExplorerState>, request: Request) -> Response {
    let explorer = state.document.explorer();
    match explorer.route(request.uri().path()) {
        Some(ExplorerRoute::Document) => Json(state.document.render()).into_response(),
        Some(ExplorerRoute::Shell) => file(explorer.shell_path(), request).await,
        Some(ExplorerRoute::Asset(path)) => file(path, request).await,
        None => ApiError::NotFound(request.uri().path().to_string()).into_response(),
    }
}

async fn file(path: std::path::PathBuf, request: Request) -> Response {
    if !path.is_file() {
        return ApiError::NotFound(path.display().to_string()).into_response();
    }
    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(e) => ApiError::Internal(format!("serving {}: {e}", path.display())).into_response(),
    }
}
