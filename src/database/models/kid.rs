use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Kid {
    pub id: DbId,
    pub parent_id: DbId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub age: Option<i32>,
    pub elf_id: Option<DbId>,
    pub created_at: DateTime<Utc>,
}

/// Public view returned from the auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct KidProfile {
    pub id: DbId,
    pub username: String,
    pub name: String,
    pub age: Option<i32>,
    pub elf_id: Option<DbId>,
}

impl From<&Kid> for KidProfile {
    fn from(kid: &Kid) -> Self {
        Self {
            id: kid.id,
            username: kid.username.clone(),
            name: kid.name.clone(),
            age: kid.age,
            elf_id: kid.elf_id,
        }
    }
}

/// Row shape for a parent's kid list
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KidSummary {
    pub id: DbId,
    pub username: String,
    pub name: String,
    pub age: Option<i32>,
    pub elf_id: Option<DbId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Kid> for KidSummary {
    fn from(kid: &Kid) -> Self {
        Self {
            id: kid.id,
            username: kid.username.clone(),
            name: kid.name.clone(),
            age: kid.age,
            elf_id: kid.elf_id,
            created_at: kid.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewKid {
    pub parent_id: DbId,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub age: Option<i32>,
}
