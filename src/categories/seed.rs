use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use crate::types::EntryType;

/// (name, type, icon, color) of the system categories every user sees.
pub const DEFAULT_CATEGORIES: &[(&str, EntryType, &str, &str)] = &[
    ("Salary", EntryType::Income, "briefcase", "#4CD964"),
    ("Bonus", EntryType::Income, "award", "#5AC8FA"),
    ("Part-time", EntryType::Income, "clock", "#007AFF"),
    ("Investment", EntryType::Income, "trending-up", "#34C759"),
    ("Other Income", EntryType::Income, "plus-circle", "#5856D6"),
    ("Food", EntryType::Expense, "coffee", "#FF9500"),
    ("Shopping", EntryType::Expense, "shopping-bag", "#FF3B30"),
    ("Transport", EntryType::Expense, "map", "#FF2D55"),
    ("Entertainment", EntryType::Expense, "film", "#AF52DE"),
    ("Housing", EntryType::Expense, "home", "#FF9500"),
    ("Travel", EntryType::Expense, "map-pin", "#5856D6"),
    ("Healthcare", EntryType::Expense, "activity", "#FF2D55"),
    ("Education", EntryType::Expense, "book", "#5AC8FA"),
    ("Other Expense", EntryType::Expense, "more-horizontal", "#8E8E93"),
];

/// Insert the default categories into an empty table. Returns how many were added.
pub async fn seed_defaults(db: &PgPool) -> anyhow::Result<usize> {
    let mut tx = db.begin().await.context("begin tx")?;

    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL")
            .fetch_one(&mut *tx)
            .await
            .context("count categories")?;
    if existing > 0 {
        info!(existing, "categories already seeded");
        return Ok(0);
    }

    let mut inserted = 0;
    for (name, kind, icon, color) in DEFAULT_CATEGORIES {
        let res = sqlx::query(
            r#"
            INSERT INTO categories (name, type, icon, color, is_default, user_id)
            VALUES ($1, $2, $3, $4, TRUE, NULL)
            ON CONFLICT (name, type) WHERE deleted_at IS NULL DO NOTHING
            "#,
        )
        .bind(*name)
        .bind(*kind)
        .bind(*icon)
        .bind(*color)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("insert default category {name}"))?;
        inserted += res.rows_affected() as usize;
    }
    tx.commit().await.context("commit tx")?;

    info!(inserted, "seeded default categories");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn defaults_are_unique_per_type() {
        let keys: HashSet<_> = DEFAULT_CATEGORIES.iter().map(|(n, k, _, _)| (*n, *k)).collect();
        assert_eq!(keys.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn defaults_cover_both_types() {
        let income = DEFAULT_CATEGORIES
            .iter()
            .filter(|(_, k, _, _)| *k == EntryType::Income)
            .count();
        assert_eq!(income, 5);
        assert_eq!(DEFAULT_CATEGORIES.len() - income, 9);
    }
}
