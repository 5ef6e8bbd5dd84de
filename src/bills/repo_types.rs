use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::types::EntryType;

/// Bill joined with its category name.
#[derive(Debug, Clone, FromRow)]
pub struct BillRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: EntryType,
    pub amount: f64,
    pub merchant: String,
    pub description: String,
    pub bill_time: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TypeSummary {
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub total: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CategorySummary {
    pub category_id: Uuid,
    pub category_name: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub total: f64,
    pub count: i64,
}
