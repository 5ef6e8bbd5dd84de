use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{BillList, BillResponse, CreateBillRequest, PaginationInfo, StatisticsResponse, UpdateBillRequest};
use super::query::{total_pages, BillListParams};
use super::services;
use super::stats::StatsParams;
use crate::{
    auth::AuthUser,
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    types::MessageResponse,
};

pub fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/statistics", get(bill_statistics))
        .route("/bills/:id", get(get_bill).put(update_bill).delete(delete_bill))
}

#[instrument(skip(state, user, params), fields(user_id = %user.user_id))]
pub async fn list_bills(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<BillListParams>,
) -> Result<Json<BillList>> {
    let page = services::list(&state.db, user.user_id, &params).await?;
    let pagination = PaginationInfo {
        page: page.filter.page,
        limit: page.filter.limit,
        total: page.total,
        total_pages: total_pages(page.total, page.filter.limit),
    };
    Ok(Json(BillList {
        bills: page.rows.into_iter().map(BillResponse::from).collect(),
        pagination,
    }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn create_bill(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillResponse>)> {
    let bill = services::create(&state.db, user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(bill.into())))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_bill(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<BillResponse>> {
    let bill = services::get(&state.db, user.user_id, id).await?;
    Ok(Json(bill.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn update_bill(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateBillRequest>,
) -> Result<Json<BillResponse>> {
    let bill = services::update(&state.db, user.user_id, id, payload).await?;
    Ok(Json(bill.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_bill(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>> {
    services::delete(&state.db, user.user_id, id).await?;
    Ok(Json(MessageResponse::new("Bill deleted successfully")))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn bill_statistics(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<StatsParams>,
) -> Result<Json<StatisticsResponse>> {
    let stats = services::statistics(&state.db, user.user_id, &params).await?;
    Ok(Json(StatisticsResponse::new(
        &stats.window,
        stats.summary,
        stats.categories,
    )))
}
