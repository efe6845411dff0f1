pub mod api;

use crate::web::api::background::{get_active_items, get_frame, update_viewport};
use crate::web::api::catalog::get_catalog;
use crate::web::api::events::background_events;
use crate::web::api::AppState;
use axum::{
    routing::{get, put},
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

/// API routes plus the media directory under `/media`.
pub fn router(state: AppState, media_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/background/items", get(get_active_items))
        .route("/api/background/frame", get(get_frame))
        .route("/api/background/viewport", put(update_viewport))
        .route("/api/events/background", get(background_events))
        .with_state(state);

    Router::new()
        .nest_service("/media", ServeDir::new(media_dir))
        .merge(api_routes)
}
