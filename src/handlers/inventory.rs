use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::services::inventory::InventoryStatus;
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/low-stock", get(list_low_stock))
        .route("/:product_id", get(get_by_product))
        .route("/restock/:product_id", post(restock))
}

async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InventoryStatus>>>, ServiceError> {
    let items = state.inventory_service.list_inventory().await?;
    Ok(Json(ApiResponse::success(items)))
}

async fn list_low_stock(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InventoryStatus>>>, ServiceError> {
    let items = state.inventory_service.list_low_stock().await?;
    Ok(Json(ApiResponse::success(items)))
}

async fn get_by_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryStatus>>, ServiceError> {
    let item = state.inventory_service.get_by_product(product_id).await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn restock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryStatus>>, ServiceError> {
    let item = state.inventory_service.restock(product_id).await?;
    Ok(Json(ApiResponse::success(item)))
}
