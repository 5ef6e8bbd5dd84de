use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Category;
use super::services::CategoryError;
use crate::types::EntryType;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// `GET /categories` query. A blank `type` means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl CategoryQuery {
    pub fn entry_type(&self) -> Result<Option<EntryType>, CategoryError> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("income") => Ok(Some(EntryType::Income)),
            Some("expense") => Ok(Some(EntryType::Expense)),
            Some(_) => Err(CategoryError::Invalid("type must be income or expense")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub icon: String,
    pub color: String,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            is_default: c.is_default(),
            user_id: c.owner_id(),
            id: c.id,
            name: c.name,
            kind: c.kind,
            icon: c.icon,
            color: c.color,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: Vec<CategoryResponse>,
}
