use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbId;

/// Pen-pal persona from the static catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Elf {
    pub id: DbId,
    pub name: String,
    pub job: String,
    pub personality: String,
    pub emoji: Option<String>,
}
