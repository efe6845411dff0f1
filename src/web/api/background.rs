use crate::background::BackgroundStatus;
use crate::display::ItemFrame;
use crate::models::active_item::ActiveItem;
use crate::models::viewport::ViewportSize;
use crate::web::api::AppState;
use axum::{extract::State, http::StatusCode, Json};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct ItemsResponse {
    pub status: BackgroundStatus,
    pub viewport: ViewportSize,
    pub items: Vec<ActiveItem>,
}

#[derive(Serialize)]
pub struct FrameResponse {
    pub status: BackgroundStatus,
    pub items: Vec<ItemFrame>,
}

#[derive(Deserialize, Debug)]
pub struct ViewportUpdate {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub reduced_motion: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct ViewportResponse {
    pub status: BackgroundStatus,
}

// Scheduler's view: the active set with placement and drift
pub async fn get_active_items(State(controller): State<AppState>) -> Json<ItemsResponse> {
    let controller = controller.lock().await;
    Json(ItemsResponse {
        status: controller.status(),
        viewport: controller.viewport(),
        items: controller.active_items(),
    })
}

// Renderer's view: what should be painted right now
pub async fn get_frame(State(controller): State<AppState>) -> Json<FrameResponse> {
    let controller = controller.lock().await;
    Json(FrameResponse {
        status: controller.status(),
        items: controller.frame(),
    })
}

pub async fn update_viewport(
    State(controller): State<AppState>,
    Json(update): Json<ViewportUpdate>,
) -> Result<Json<ViewportResponse>, (StatusCode, String)> {
    if !update.width.is_finite()
        || !update.height.is_finite()
        || update.width < 0.0
        || update.height < 0.0
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Viewport width and height must be finite and not negative".to_string(),
        ));
    }

    debug!("Viewport update: {:?}", update);
    let mut controller = controller.lock().await;
    let status = controller
        .update_viewport(
            ViewportSize::new(update.width, update.height),
            update.reduced_motion,
        )
        .await;

    Ok(Json(ViewportResponse { status }))
}
