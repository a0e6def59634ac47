use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::services::orders::{CreateOrderRequest, OrderResponse};
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/user/:user_id", get(list_orders_by_user))
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let created = state.order_service.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let found = state.order_service.get_order(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state.order_service.list_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}

async fn list_orders_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state.order_service.list_orders_by_user(user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}
