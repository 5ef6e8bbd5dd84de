use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateCategoryRequest, UpdateCategoryRequest};
use super::repo;
use super::repo_types::{Category, CategoryOwner};
use crate::error::{is_unique_violation, AppError};
use crate::types::EntryType;

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("Category not found")]
    NotFound,
    #[error("Cannot modify default category")]
    Immutable,
    #[error("Permission denied")]
    Forbidden,
    #[error("Category with this name already exists")]
    Duplicate,
    #[error("Cannot delete category with existing bills")]
    InUse,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<CategoryError> for AppError {
    fn from(e: CategoryError) -> Self {
        match e {
            CategoryError::Invalid(msg) => AppError::Validation(msg.to_string()),
            CategoryError::NotFound => AppError::NotFound(e.to_string()),
            CategoryError::Immutable | CategoryError::Forbidden => AppError::Forbidden(e.to_string()),
            CategoryError::Duplicate | CategoryError::InUse => AppError::Conflict(e.to_string()),
            CategoryError::Storage(e) => e.into(),
        }
    }
}

fn duplicate_or_storage(e: sqlx::Error) -> CategoryError {
    if is_unique_violation(&e) {
        CategoryError::Duplicate
    } else {
        CategoryError::Storage(e)
    }
}

/// Only the owner may change a user category; system categories are frozen.
pub fn authorize_mutation(category: &Category, caller: Uuid) -> Result<(), CategoryError> {
    match category.owner {
        CategoryOwner::System => Err(CategoryError::Immutable),
        CategoryOwner::User(owner) if owner != caller => Err(CategoryError::Forbidden),
        CategoryOwner::User(_) => Ok(()),
    }
}

fn required(value: &str, field: &'static str) -> Result<String, CategoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CategoryError::Invalid(field));
    }
    Ok(value.to_string())
}

pub fn validate_create(req: &mut CreateCategoryRequest) -> Result<(), CategoryError> {
    req.name = required(&req.name, "name is required")?;
    req.icon = required(&req.icon, "icon is required")?;
    req.color = required(&req.color, "color is required")?;
    Ok(())
}

pub fn validate_update(req: &mut UpdateCategoryRequest) -> Result<(), CategoryError> {
    if let Some(name) = req.name.as_deref() {
        req.name = Some(required(name, "name must not be empty")?);
    }
    if let Some(icon) = req.icon.as_deref() {
        req.icon = Some(required(icon, "icon must not be empty")?);
    }
    if let Some(color) = req.color.as_deref() {
        req.color = Some(required(color, "color must not be empty")?);
    }
    Ok(())
}

pub async fn list(db: &PgPool, kind: Option<EntryType>) -> Result<Vec<Category>, CategoryError> {
    let rows = repo::list(db, kind).await?;
    Ok(rows.into_iter().map(Category::from).collect())
}

pub async fn create(
    db: &PgPool,
    owner: Uuid,
    mut req: CreateCategoryRequest,
) -> Result<Category, CategoryError> {
    validate_create(&mut req)?;

    if repo::name_taken(db, &req.name, req.kind).await? {
        warn!(name = %req.name, kind = %req.kind, "duplicate category");
        return Err(CategoryError::Duplicate);
    }

    let row = repo::insert_owned(db, owner, &req.name, req.kind, &req.icon, &req.color)
        .await
        .map_err(duplicate_or_storage)?;

    info!(category_id = %row.id, user_id = %owner, "category created");
    Ok(row.into())
}

pub async fn update(
    db: &PgPool,
    caller: Uuid,
    id: Uuid,
    mut req: UpdateCategoryRequest,
) -> Result<Category, CategoryError> {
    validate_update(&mut req)?;

    let mut tx = db.begin().await?;
    let current: Category = repo::lock_visible(&mut tx, id, caller)
        .await?
        .ok_or(CategoryError::NotFound)?
        .into();
    authorize_mutation(&current, caller)?;

    let row = repo::update(
        &mut tx,
        id,
        req.name.as_deref(),
        req.icon.as_deref(),
        req.color.as_deref(),
    )
    .await
    .map_err(duplicate_or_storage)?;
    tx.commit().await?;

    info!(category_id = %id, user_id = %caller, "category updated");
    Ok(row.into())
}

/// Delete under a row lock; bill writes share-lock the category, so the
/// in-use count cannot go stale before the delete lands.
pub async fn delete(db: &PgPool, caller: Uuid, id: Uuid) -> Result<(), CategoryError> {
    let mut tx = db.begin().await?;
    let current: Category = repo::lock_visible(&mut tx, id, caller)
        .await?
        .ok_or(CategoryError::NotFound)?
        .into();
    authorize_mutation(&current, caller)?;

    if repo::count_live_bills(&mut tx, id).await? > 0 {
        warn!(category_id = %id, "category still referenced by bills");
        return Err(CategoryError::InUse);
    }

    repo::soft_delete(&mut tx, id).await?;
    tx.commit().await?;

    info!(category_id = %id, user_id = %caller, "category deleted");
    Ok(())
}
