use crate::models::catalog::CatalogEntry;
use crate::web::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct CatalogResponse {
    pub entries: Vec<Arc<CatalogEntry>>,
}

pub async fn get_catalog(State(controller): State<AppState>) -> Json<CatalogResponse> {
    let controller = controller.lock().await;
    Json(CatalogResponse {
        entries: controller.catalog().entries().to_vec(),
    })
}
