use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::CategoryRow;
use crate::types::EntryType;

const CATEGORY_COLUMNS: &str =
    "id, name, type, icon, color, is_default, user_id, created_at, updated_at";

/// Live categories, defaults first, then in creation order.
pub async fn list(db: &PgPool, kind: Option<EntryType>) -> Result<Vec<CategoryRow>, sqlx::Error> {
    sqlx::query_as::<_, CategoryRow>(&format!(
        r#"
        SELECT {CATEGORY_COLUMNS}
          FROM categories
         WHERE deleted_at IS NULL
           AND ($1::entry_type IS NULL OR type = $1)
         ORDER BY is_default DESC, created_at ASC, id ASC
        "#
    ))
    .bind(kind)
    .fetch_all(db)
    .await
}

pub async fn name_taken(db: &PgPool, name: &str, kind: EntryType) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM categories
             WHERE name = $1 AND type = $2 AND deleted_at IS NULL
        )
        "#,
    )
    .bind(name)
    .bind(kind)
    .fetch_one(db)
    .await
}

pub async fn insert_owned(
    db: &PgPool,
    owner: Uuid,
    name: &str,
    kind: EntryType,
    icon: &str,
    color: &str,
) -> Result<CategoryRow, sqlx::Error> {
    sqlx::query_as::<_, CategoryRow>(&format!(
        r#"
        INSERT INTO categories (name, type, icon, color, is_default, user_id)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(kind)
    .bind(icon)
    .bind(color)
    .bind(owner)
    .fetch_one(db)
    .await
}

/// Lock a category the caller can see (own or system) for a change.
pub async fn lock_visible(
    conn: &mut PgConnection,
    id: Uuid,
    caller: Uuid,
) -> Result<Option<CategoryRow>, sqlx::Error> {
    sqlx::query_as::<_, CategoryRow>(&format!(
        r#"
        SELECT {CATEGORY_COLUMNS}
          FROM categories
         WHERE id = $1
           AND deleted_at IS NULL
           AND (user_id = $2 OR user_id IS NULL)
           FOR UPDATE
        "#
    ))
    .bind(id)
    .bind(caller)
    .fetch_optional(conn)
    .await
}

/// Share-lock a live category so it cannot be deleted while a bill points at it.
/// With `visible_to`, only system categories and that user's own qualify.
pub async fn share_lock(
    conn: &mut PgConnection,
    id: Uuid,
    visible_to: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
          FROM categories
         WHERE id = $1
           AND deleted_at IS NULL
           AND ($2::uuid IS NULL OR user_id = $2 OR user_id IS NULL)
           FOR SHARE
        "#,
    )
    .bind(id)
    .bind(visible_to)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    name: Option<&str>,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<CategoryRow, sqlx::Error> {
    sqlx::query_as::<_, CategoryRow>(&format!(
        r#"
        UPDATE categories
           SET name = COALESCE($2, name),
               icon = COALESCE($3, icon),
               color = COALESCE($4, color),
               updated_at = now()
         WHERE id = $1
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(icon)
    .bind(color)
    .fetch_one(conn)
    .await
}

pub async fn count_live_bills(conn: &mut PgConnection, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM bills WHERE category_id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_one(conn)
    .await
}

pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE categories SET deleted_at = now(), updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
