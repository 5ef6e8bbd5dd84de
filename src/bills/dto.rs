use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{BillRow, CategorySummary, TypeSummary};
use super::stats::{Period, StatsWindow};
use crate::types::EntryType;

#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub amount: f64,
    pub category_id: Uuid,
    pub merchant: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub bill_time: Option<OffsetDateTime>,
}

/// Partial update; an absent field is left as stored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBillRequest {
    #[serde(rename = "type")]
    pub kind: Option<EntryType>,
    pub amount: Option<f64>,
    pub category_id: Option<Uuid>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub bill_time: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub amount: f64,
    pub category_id: Uuid,
    pub category: String,
    pub merchant: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Always true for bills served from the ledger.
    pub synced: bool,
}

impl From<BillRow> for BillResponse {
    fn from(b: BillRow) -> Self {
        Self {
            id: b.id,
            kind: b.kind,
            amount: b.amount,
            category_id: b.category_id,
            category: b.category_name.unwrap_or_default(),
            merchant: b.merchant,
            description: b.description,
            time: b.bill_time,
            created_at: b.created_at,
            updated_at: b.updated_at,
            synced: true,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct BillList {
    pub bills: Vec<BillResponse>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub period: Period,
    pub year: i32,
    pub month: u8,
    pub start_date: String,
    pub end_date: String,
    pub summary: Vec<TypeSummary>,
    pub categories: Vec<CategorySummary>,
}

impl StatisticsResponse {
    pub fn new(window: &StatsWindow, summary: Vec<TypeSummary>, categories: Vec<CategorySummary>) -> Self {
        Self {
            period: window.period,
            year: window.year,
            month: window.month,
            start_date: window.first_day().to_string(),
            end_date: window.last_day().to_string(),
            summary,
            categories,
        }
    }
}
