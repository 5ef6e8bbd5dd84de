use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dto::{CreateBillRequest, UpdateBillRequest};
use super::query::{BillFilter, BillListParams};
use super::repo::{self, BillChanges, NewBill};
use super::repo_types::{BillRow, CategorySummary, TypeSummary};
use super::stats::{StatsParams, StatsWindow};
use crate::categories::repo as category_repo;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum BillError {
    #[error("{0}")]
    Invalid(String),
    #[error("Bill not found")]
    NotFound,
    #[error("Invalid category")]
    InvalidCategory,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<BillError> for AppError {
    fn from(e: BillError) -> Self {
        match e {
            BillError::Invalid(msg) => AppError::Validation(msg),
            BillError::InvalidCategory => AppError::Validation(e.to_string()),
            BillError::NotFound => AppError::NotFound(e.to_string()),
            BillError::Storage(e) => e.into(),
        }
    }
}

fn check_amount(amount: f64) -> Result<(), BillError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(BillError::Invalid("amount must be greater than 0".into()));
    }
    Ok(())
}

fn check_merchant(merchant: &str) -> Result<String, BillError> {
    let merchant = merchant.trim();
    if merchant.is_empty() {
        return Err(BillError::Invalid("merchant is required".into()));
    }
    Ok(merchant.to_string())
}

pub fn validate_new(req: &mut CreateBillRequest) -> Result<(), BillError> {
    check_amount(req.amount)?;
    req.merchant = check_merchant(&req.merchant)?;
    Ok(())
}

/// Present fields obey the create rules; a description may be cleared.
pub fn validate_patch(req: &mut UpdateBillRequest) -> Result<(), BillError> {
    if let Some(amount) = req.amount {
        check_amount(amount)?;
    }
    if let Some(merchant) = req.merchant.as_deref() {
        req.merchant = Some(check_merchant(merchant)?);
    }
    Ok(())
}

pub async fn create(db: &PgPool, owner: Uuid, mut req: CreateBillRequest) -> Result<BillRow, BillError> {
    validate_new(&mut req)?;

    let mut tx = db.begin().await?;
    if !category_repo::share_lock(&mut tx, req.category_id, None).await? {
        warn!(category_id = %req.category_id, "bill references unknown category");
        return Err(BillError::InvalidCategory);
    }

    let bill = NewBill {
        kind: req.kind,
        amount: req.amount,
        category_id: req.category_id,
        merchant: &req.merchant,
        description: &req.description,
        bill_time: req.bill_time.unwrap_or_else(OffsetDateTime::now_utc),
    };
    let row = repo::insert(&mut tx, owner, &bill).await?;
    tx.commit().await?;

    info!(bill_id = %row.id, user_id = %owner, "bill created");
    Ok(row)
}

pub async fn get(db: &PgPool, owner: Uuid, id: Uuid) -> Result<BillRow, BillError> {
    repo::find(db, owner, id).await?.ok_or(BillError::NotFound)
}

pub async fn update(
    db: &PgPool,
    owner: Uuid,
    id: Uuid,
    mut req: UpdateBillRequest,
) -> Result<BillRow, BillError> {
    validate_patch(&mut req)?;

    let mut tx = db.begin().await?;
    if !repo::lock_owned(&mut tx, owner, id).await? {
        return Err(BillError::NotFound);
    }
    if let Some(category_id) = req.category_id {
        if !category_repo::share_lock(&mut tx, category_id, Some(owner)).await? {
            warn!(%category_id, "bill moved to a category the caller cannot see");
            return Err(BillError::InvalidCategory);
        }
    }

    let changes = BillChanges {
        kind: req.kind,
        amount: req.amount,
        category_id: req.category_id,
        merchant: req.merchant.as_deref(),
        description: req.description.as_deref(),
        bill_time: req.bill_time,
    };
    let row = repo::update(&mut tx, owner, id, &changes)
        .await?
        .ok_or(BillError::NotFound)?;
    tx.commit().await?;

    info!(bill_id = %id, user_id = %owner, "bill updated");
    Ok(row)
}

pub async fn delete(db: &PgPool, owner: Uuid, id: Uuid) -> Result<(), BillError> {
    if !repo::soft_delete(db, owner, id).await? {
        return Err(BillError::NotFound);
    }
    info!(bill_id = %id, user_id = %owner, "bill deleted");
    Ok(())
}

pub struct BillPage {
    pub rows: Vec<BillRow>,
    pub filter: BillFilter,
    pub total: i64,
}

pub async fn list(db: &PgPool, owner: Uuid, params: &BillListParams) -> Result<BillPage, BillError> {
    let filter = BillFilter::from_params(params)?;
    let (rows, total) = repo::list(db, owner, &filter).await?;
    debug!(total, page = filter.page, limit = filter.limit, "bills listed");
    Ok(BillPage { rows, filter, total })
}

pub struct Statistics {
    pub window: StatsWindow,
    pub summary: Vec<TypeSummary>,
    pub categories: Vec<CategorySummary>,
}

pub async fn statistics(db: &PgPool, owner: Uuid, params: &StatsParams) -> Result<Statistics, BillError> {
    let window = StatsWindow::resolve(params, OffsetDateTime::now_utc().date())?;
    let summary = repo::summary_by_type(db, owner, &window).await?;
    let categories = repo::summary_by_category(db, owner, &window).await?;
    Ok(Statistics {
        window,
        summary,
        categories,
    })
}
