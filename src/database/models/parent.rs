use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbId;

/// How replies to a parent's kids are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Ai,
    Manual,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Ai => "ai",
            ResponseMode::Manual => "manual",
        }
    }
}

// Anything other than "ai" in the column means replies are written by hand
impl From<String> for ResponseMode {
    fn from(value: String) -> Self {
        if value == "ai" {
            ResponseMode::Ai
        } else {
            ResponseMode::Manual
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Parent {
    pub id: DbId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub parent_code: String,
    pub subscription_status: Option<String>,
    pub subscription_plan: Option<String>,
    pub subscription_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub response_mode: ResponseMode,
    pub created_at: DateTime<Utc>,
}

/// Public view returned from the auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ParentProfile {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub parent_code: String,
}

impl From<&Parent> for ParentProfile {
    fn from(parent: &Parent) -> Self {
        Self {
            id: parent.id,
            email: parent.email.clone(),
            name: parent.name.clone(),
            parent_code: parent.parent_code.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewParent {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub parent_code: String,
}
