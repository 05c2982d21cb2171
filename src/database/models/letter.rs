use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbId;

/// Who attached the reply to a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Responder {
    Parent,
    Ai,
}

impl Responder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Responder::Parent => "parent",
            Responder::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Letter {
    pub id: DbId,
    pub kid_id: DbId,
    pub elf_id: DbId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub response: Option<String>,
    pub response_at: Option<DateTime<Utc>>,
    pub responded_by: Option<String>,
}

/// Kid's mailbox row: the letter plus the elf it was sent to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KidLetter {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub letter: Letter,
    pub elf_name: String,
    pub elf_emoji: Option<String>,
}

/// Parent's overview row: the letter plus which kid wrote it to which elf
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParentLetter {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub letter: Letter,
    pub kid_name: String,
    pub elf_name: String,
}
