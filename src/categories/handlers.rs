use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CategoryList, CategoryQuery, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use super::services;
use crate::{
    auth::AuthUser,
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    types::MessageResponse,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
}

#[instrument(skip(state, _user))]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(q): ApiQuery<CategoryQuery>,
) -> Result<Json<CategoryList>> {
    let categories = services::list(&state.db, q.entry_type()?).await?;
    Ok(Json(CategoryList {
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
    }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let category = services::create(&state.db, user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>> {
    let category = services::update(&state.db, user.user_id, id, payload).await?;
    Ok(Json(category.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>> {
    services::delete(&state.db, user.user_id, id).await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
