mod dto;
pub mod handlers;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod stats;

use crate::state::AppState;
use axum::Router;

pub use dto::{BillList, BillResponse, CreateBillRequest, PaginationInfo, StatisticsResponse, UpdateBillRequest};
pub use query::BillListParams;
pub use services::BillError;
pub use stats::{Period, StatsParams};

pub fn router() -> Router<AppState> {
    handlers::bill_routes()
}
