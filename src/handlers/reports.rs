use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::entities::sales_performance;
use crate::services::reports::{
    CostPerOrderRecord, RevenueGrowthRecord, RevenuePerOrderRecord, TotalCostRecord,
    TotalRevenueRecord,
};
use crate::{errors::ServiceError, ApiResponse, AppState};

pub fn revenue_routes() -> Router<AppState> {
    Router::new()
        .route("/total-revenue/:year", get(total_revenue_of_year))
        .route("/total-revenue/:year/:end", get(total_revenue_in_range))
        .route("/revenue-per-order/:year", get(revenue_per_order_of_year))
        .route(
            "/revenue-per-order/:year/:end",
            get(revenue_per_order_in_range),
        )
        .route("/revenue-growth-rate/:year", get(revenue_growth_of_year))
        .route(
            "/revenue-growth-rate/:year/:end",
            get(revenue_growth_in_range),
        )
        .route("/total-cost/:year", get(total_cost_of_year))
        .route("/total-cost/:year/:end", get(total_cost_in_range))
        .route("/cost-per-order/:year", get(cost_per_order_of_year))
        .route("/cost-per-order/:year/:end", get(cost_per_order_in_range))
}

async fn total_revenue_of_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<ApiResponse<Vec<TotalRevenueRecord>>>, ServiceError> {
    let records = state.report_service.total_revenue_in_year(year).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn total_revenue_in_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<Vec<TotalRevenueRecord>>>, ServiceError> {
    let records = state
        .report_service
        .total_revenue_in_range(start, end)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn revenue_per_order_of_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<ApiResponse<Vec<RevenuePerOrderRecord>>>, ServiceError> {
    let records = state.report_service.revenue_per_order_in_year(year).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn revenue_per_order_in_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<Vec<RevenuePerOrderRecord>>>, ServiceError> {
    let records = state
        .report_service
        .revenue_per_order_in_range(start, end)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn revenue_growth_of_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<ApiResponse<Vec<RevenueGrowthRecord>>>, ServiceError> {
    let records = state.report_service.revenue_growth_in_year(year).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn revenue_growth_in_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<Vec<RevenueGrowthRecord>>>, ServiceError> {
    let records = state
        .report_service
        .revenue_growth_in_range(start, end)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn total_cost_of_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<ApiResponse<Vec<TotalCostRecord>>>, ServiceError> {
    let records = state.report_service.total_cost_in_year(year).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn total_cost_in_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<Vec<TotalCostRecord>>>, ServiceError> {
    let records = state.report_service.total_cost_in_range(start, end).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn cost_per_order_of_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<ApiResponse<Vec<CostPerOrderRecord>>>, ServiceError> {
    let records = state.report_service.cost_per_order_in_year(year).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn cost_per_order_in_range(
    State(state): State<AppState>,
    Path((start, end)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<Vec<CostPerOrderRecord>>>, ServiceError> {
    let records = state
        .report_service
        .cost_per_order_in_range(start, end)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

pub async fn list_sales_performances(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<sales_performance::Model>>>, ServiceError> {
    let rows = state.report_service.list_sales_performances().await?;
    Ok(Json(ApiResponse::success(rows)))
}
