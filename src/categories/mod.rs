mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod seed;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use dto::{CategoryList, CategoryQuery, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
pub use repo_types::{Category, CategoryOwner};
pub use services::CategoryError;

pub fn router() -> Router<AppState> {
    handlers::category_routes()
}
