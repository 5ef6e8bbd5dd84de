use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::query::{BillFilter, BILL_SELECT};
use super::repo_types::{BillRow, CategorySummary, TypeSummary};
use super::stats::StatsWindow;
use crate::types::EntryType;

const JOIN_CHANGED: &str = r#"
    SELECT b.id, b.user_id, b.category_id, c.name AS category_name, b.type,
           b.amount, b.merchant, b.description, b.bill_time, b.created_at, b.updated_at
      FROM changed b
      LEFT JOIN categories c ON c.id = b.category_id"#;

pub struct NewBill<'a> {
    pub kind: EntryType,
    pub amount: f64,
    pub category_id: Uuid,
    pub merchant: &'a str,
    pub description: &'a str,
    pub bill_time: OffsetDateTime,
}

/// Fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct BillChanges<'a> {
    pub kind: Option<EntryType>,
    pub amount: Option<f64>,
    pub category_id: Option<Uuid>,
    pub merchant: Option<&'a str>,
    pub description: Option<&'a str>,
    pub bill_time: Option<OffsetDateTime>,
}

pub async fn insert(
    conn: &mut PgConnection,
    owner: Uuid,
    bill: &NewBill<'_>,
) -> Result<BillRow, sqlx::Error> {
    sqlx::query_as::<_, BillRow>(&format!(
        r#"
        WITH changed AS (
            INSERT INTO bills (user_id, category_id, type, amount, merchant, description, bill_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        )
        {JOIN_CHANGED}
        "#
    ))
    .bind(owner)
    .bind(bill.category_id)
    .bind(bill.kind)
    .bind(bill.amount)
    .bind(bill.merchant)
    .bind(bill.description)
    .bind(bill.bill_time)
    .fetch_one(conn)
    .await
}

pub async fn find(db: &PgPool, owner: Uuid, id: Uuid) -> Result<Option<BillRow>, sqlx::Error> {
    sqlx::query_as::<_, BillRow>(&format!(
        "{BILL_SELECT} WHERE b.id = $1 AND b.user_id = $2 AND b.deleted_at IS NULL"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

/// Lock the caller's bill for an update. `false` if there is no such live bill.
pub async fn lock_owned(conn: &mut PgConnection, owner: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let row = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM bills WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

pub async fn update(
    conn: &mut PgConnection,
    owner: Uuid,
    id: Uuid,
    changes: &BillChanges<'_>,
) -> Result<Option<BillRow>, sqlx::Error> {
    sqlx::query_as::<_, BillRow>(&format!(
        r#"
        WITH changed AS (
            UPDATE bills
               SET type = COALESCE($3, type),
                   amount = COALESCE($4, amount),
                   category_id = COALESCE($5, category_id),
                   merchant = COALESCE($6, merchant),
                   description = COALESCE($7, description),
                   bill_time = COALESCE($8, bill_time),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING *
        )
        {JOIN_CHANGED}
        "#
    ))
    .bind(id)
    .bind(owner)
    .bind(changes.kind)
    .bind(changes.amount)
    .bind(changes.category_id)
    .bind(changes.merchant)
    .bind(changes.description)
    .bind(changes.bill_time)
    .fetch_optional(conn)
    .await
}

/// Soft delete. Returns whether a live bill of the caller was hit.
pub async fn soft_delete(db: &PgPool, owner: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        r#"
        UPDATE bills SET deleted_at = now(), updated_at = now()
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(owner)
    .execute(db)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn list(
    db: &PgPool,
    owner: Uuid,
    filter: &BillFilter,
) -> Result<(Vec<BillRow>, i64), sqlx::Error> {
    let total: i64 = filter
        .count_query(owner)
        .build_query_scalar::<i64>()
        .fetch_one(db)
        .await?;

    let rows = filter
        .page_query(owner)
        .build_query_as::<BillRow>()
        .fetch_all(db)
        .await?;

    Ok((rows, total))
}

pub async fn summary_by_type(
    db: &PgPool,
    owner: Uuid,
    window: &StatsWindow,
) -> Result<Vec<TypeSummary>, sqlx::Error> {
    sqlx::query_as::<_, TypeSummary>(
        r#"
        SELECT type, SUM(amount) AS total, COUNT(*) AS count
          FROM bills
         WHERE user_id = $1 AND deleted_at IS NULL
           AND bill_time >= $2 AND bill_time < $3
         GROUP BY type
         ORDER BY type
        "#,
    )
    .bind(owner)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(db)
    .await
}

pub async fn summary_by_category(
    db: &PgPool,
    owner: Uuid,
    window: &StatsWindow,
) -> Result<Vec<CategorySummary>, sqlx::Error> {
    sqlx::query_as::<_, CategorySummary>(
        r#"
        SELECT b.category_id, c.name AS category_name, b.type,
               SUM(b.amount) AS total, COUNT(*) AS count
          FROM bills b
          LEFT JOIN categories c ON c.id = b.category_id
         WHERE b.user_id = $1 AND b.deleted_at IS NULL
           AND b.bill_time >= $2 AND b.bill_time < $3
         GROUP BY b.category_id, c.name, b.type
         ORDER BY total DESC, c.name ASC
        "#,
    )
    .bind(owner)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(db)
    .await
}
