//! Bill listing: query-string validation and SQL composition.
//!
//! Every user-supplied value is bound as a parameter. The only text spliced
//! into the statement is the sort column and direction, which come from the
//! closed [`SortKey`] and [`SortOrder`] enums.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use super::services::BillError;
use crate::types::EntryType;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

pub(crate) const BILL_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.category_id, c.name AS category_name, b.type,
           b.amount, b.merchant, b.description, b.bill_time, b.created_at, b.updated_at
      FROM bills b
      LEFT JOIN categories c ON c.id = b.category_id"#;

/// Raw `GET /bills` query string. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct BillListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    BillTime,
    Amount,
    Merchant,
    CreatedAt,
}

impl SortKey {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "bill_time" | "time" => Some(SortKey::BillTime),
            "amount" => Some(SortKey::Amount),
            "merchant" => Some(SortKey::Merchant),
            "created_at" => Some(SortKey::CreatedAt),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortKey::BillTime => "b.bill_time",
            SortKey::Amount => "b.amount",
            SortKey::Merchant => "b.merchant",
            SortKey::CreatedAt => "b.created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct BillFilter {
    pub kind: Option<EntryType>,
    pub category_id: Option<Uuid>,
    /// Inclusive lower bound on `bill_time`.
    pub from: Option<OffsetDateTime>,
    /// Exclusive upper bound on `bill_time`: start of the day after `end_date`.
    pub until: Option<OffsetDateTime>,
    /// ILIKE pattern with wildcards in the user's text escaped.
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for BillFilter {
    fn default() -> Self {
        Self {
            kind: None,
            category_id: None,
            from: None,
            until: None,
            search: None,
            sort: SortKey::default(),
            order: SortOrder::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn invalid(msg: impl Into<String>) -> BillError {
    BillError::Invalid(msg.into())
}

pub fn parse_day(s: &str, field: &str) -> Result<Date, BillError> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|_| invalid(format!("{field} must be a date in YYYY-MM-DD format")))
}

pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl BillFilter {
    pub fn from_params(p: &BillListParams) -> Result<Self, BillError> {
        let mut f = BillFilter::default();

        if let Some(page) = present(&p.page) {
            f.page = page.parse().map_err(|_| invalid("page must be an integer"))?;
            if f.page < 1 {
                return Err(invalid("page must be at least 1"));
            }
        }
        if let Some(limit) = present(&p.limit) {
            f.limit = limit.parse().map_err(|_| invalid("limit must be an integer"))?;
            if !(1..=MAX_LIMIT).contains(&f.limit) {
                return Err(invalid(format!("limit must be between 1 and {MAX_LIMIT}")));
            }
        }
        if (f.page - 1).checked_mul(f.limit).is_none() {
            return Err(invalid("page is out of range"));
        }

        f.kind = match present(&p.kind) {
            None => None,
            Some("income") => Some(EntryType::Income),
            Some("expense") => Some(EntryType::Expense),
            Some(_) => return Err(invalid("type must be income or expense")),
        };
        if let Some(id) = present(&p.category_id) {
            f.category_id = Some(id.parse().map_err(|_| invalid("category_id is not a valid id"))?);
        }

        let start = present(&p.start_date).map(|s| parse_day(s, "start_date")).transpose()?;
        let end = present(&p.end_date).map(|s| parse_day(s, "end_date")).transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(invalid("start_date must not be after end_date"));
            }
        }
        f.from = start.map(|d| d.midnight().assume_utc());
        f.until = match end {
            None => None,
            Some(d) => Some(
                d.next_day()
                    .ok_or_else(|| invalid("end_date is out of range"))?
                    .midnight()
                    .assume_utc(),
            ),
        };

        f.search = present(&p.search)
            .and(p.search.as_deref())
            .map(|s| format!("%{}%", escape_like(s)));

        if let Some(sort) = present(&p.sort_by) {
            f.sort = SortKey::parse(sort)
                .ok_or_else(|| invalid("sort_by must be one of bill_time, amount, merchant, created_at"))?;
        }
        if let Some(order) = present(&p.sort_order) {
            f.order = SortOrder::parse(order).ok_or_else(|| invalid("sort_order must be asc or desc"))?;
        }

        Ok(f)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>, owner: Uuid) {
        qb.push(" WHERE b.deleted_at IS NULL AND b.user_id = ").push_bind(owner);
        if let Some(kind) = self.kind {
            qb.push(" AND b.type = ").push_bind(kind);
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND b.category_id = ").push_bind(category_id);
        }
        if let Some(from) = self.from {
            qb.push(" AND b.bill_time >= ").push_bind(from);
        }
        if let Some(until) = self.until {
            qb.push(" AND b.bill_time < ").push_bind(until);
        }
        if let Some(pattern) = &self.search {
            qb.push(" AND (b.merchant ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR b.description ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }
    }

    /// `SELECT COUNT(*)` over every matching bill, ignoring pagination.
    pub fn count_query(&self, owner: Uuid) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM bills b");
        self.push_conditions(&mut qb, owner);
        qb
    }

    /// One page of matching bills, joined to their category names.
    pub fn page_query(&self, owner: Uuid) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(BILL_SELECT);
        self.push_conditions(&mut qb, owner);
        qb.push(" ORDER BY ")
            .push(self.sort.column())
            .push(" ")
            .push(self.order.sql())
            .push(", b.id ")
            .push(self.order.sql());
        qb.push(" LIMIT ")
            .push_bind(self.limit)
            .push(" OFFSET ")
            .push_bind(self.offset());
        qb
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
