use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::types::EntryType;

/// Category row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    pub kind: EntryType,
    pub icon: String,
    pub color: String,
    pub is_default: bool,
    pub user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Who may change a category. System categories are the seeded defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOwner {
    System,
    User(Uuid),
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub kind: EntryType,
    pub icon: String,
    pub color: String,
    pub owner: CategoryOwner,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Category {
    pub fn is_default(&self) -> bool {
        self.owner == CategoryOwner::System
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        match self.owner {
            CategoryOwner::System => None,
            CategoryOwner::User(id) => Some(id),
        }
    }
}

impl From<CategoryRow> for Category {
    // The table's CHECK ties is_default to a NULL user_id, so the owner alone decides.
    fn from(r: CategoryRow) -> Self {
        let owner = match r.user_id {
            Some(id) if !r.is_default => CategoryOwner::User(id),
            _ => CategoryOwner::System,
        };
        Self {
            id: r.id,
            name: r.name,
            kind: r.kind,
            icon: r.icon,
            color: r.color,
            owner,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
