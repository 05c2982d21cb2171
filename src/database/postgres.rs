use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Certificate, DbId, Elf, Kid, KidLetter, KidSummary, Letter, NewKid, NewParent, Parent,
    ParentLetter, Responder, ResponseMode, Video,
};
use crate::database::repository::Store;

const PARENT_COLUMNS: &str = "id, email, password, name, parent_code, subscription_status, \
     subscription_plan, subscription_date, response_mode, created_at";

const KID_COLUMNS: &str = "id, parent_id, username, password, name, age, elf_id, created_at";

const LETTER_COLUMNS: &str =
    "id, kid_id, elf_id, content, sent_at, response, response_at, responded_by";

/// [`Store`] backed by PostgreSQL; the schema is created outside this service
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "health check"))?;
        Ok(())
    }

    async fn find_parent(&self, id: DbId) -> Result<Option<Parent>, DatabaseError> {
        let query = format!("SELECT {PARENT_COLUMNS} FROM parents WHERE id = $1");
        let parent = sqlx::query_as::<_, Parent>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(parent)
    }

    async fn find_parent_by_email(&self, email: &str) -> Result<Option<Parent>, DatabaseError> {
        let query = format!("SELECT {PARENT_COLUMNS} FROM parents WHERE email = $1");
        let parent = sqlx::query_as::<_, Parent>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(parent)
    }

    async fn find_parent_by_code(&self, code: &str) -> Result<Option<Parent>, DatabaseError> {
        let query = format!("SELECT {PARENT_COLUMNS} FROM parents WHERE parent_code = $1 LIMIT 1");
        let parent = sqlx::query_as::<_, Parent>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(parent)
    }

    async fn create_parent(&self, parent: NewParent) -> Result<Parent, DatabaseError> {
        let query = format!(
            "INSERT INTO parents (email, password, name, parent_code, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {PARENT_COLUMNS}"
        );
        sqlx::query_as::<_, Parent>(&query)
            .bind(&parent.email)
            .bind(&parent.password_hash)
            .bind(&parent.name)
            .bind(&parent.parent_code)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "Email already registered"))
    }

    async fn set_response_mode(&self, parent_id: DbId, mode: ResponseMode) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE parents SET response_mode = $1 WHERE id = $2")
            .bind(mode.as_str())
            .bind(parent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn activate_subscription(&self, parent_id: DbId, plan: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE parents SET subscription_status = 'active', \
             subscription_plan = $1, subscription_date = NOW() \
             WHERE id = $2",
        )
        .bind(plan)
        .bind(parent_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_kids(&self, parent_id: DbId) -> Result<Vec<KidSummary>, DatabaseError> {
        let kids = sqlx::query_as::<_, KidSummary>(
            "SELECT id, username, name, age, elf_id, created_at FROM kids WHERE parent_id = $1 ORDER BY id",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(kids)
    }

    async fn find_kid(&self, id: DbId) -> Result<Option<Kid>, DatabaseError> {
        let query = format!("SELECT {KID_COLUMNS} FROM kids WHERE id = $1");
        let kid = sqlx::query_as::<_, Kid>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(kid)
    }

    async fn find_kid_by_username(&self, username: &str) -> Result<Option<Kid>, DatabaseError> {
        let query = format!("SELECT {KID_COLUMNS} FROM kids WHERE username = $1");
        let kid = sqlx::query_as::<_, Kid>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(kid)
    }

    async fn create_kid(&self, kid: NewKid) -> Result<Kid, DatabaseError> {
        let query = format!(
            "INSERT INTO kids (parent_id, username, password, name, age, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {KID_COLUMNS}"
        );
        sqlx::query_as::<_, Kid>(&query)
            .bind(kid.parent_id)
            .bind(&kid.username)
            .bind(&kid.password_hash)
            .bind(&kid.name)
            .bind(kid.age)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "Username already taken"))
    }

    async fn set_kid_elf(&self, kid_id: DbId, elf_id: DbId) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE kids SET elf_id = $1 WHERE id = $2")
            .bind(elf_id)
            .bind(kid_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn response_mode_for_kid(&self, kid_id: DbId) -> Result<Option<ResponseMode>, DatabaseError> {
        let mode: Option<(String,)> = sqlx::query_as(
            "SELECT p.response_mode FROM parents p \
             JOIN kids k ON k.parent_id = p.id \
             WHERE k.id = $1",
        )
        .bind(kid_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mode.map(|(mode,)| ResponseMode::from(mode)))
    }

    async fn list_elves(&self) -> Result<Vec<Elf>, DatabaseError> {
        let elves = sqlx::query_as::<_, Elf>(
            "SELECT id, name, job, personality, emoji FROM elves ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(elves)
    }

    async fn find_elf(&self, id: DbId) -> Result<Option<Elf>, DatabaseError> {
        let elf = sqlx::query_as::<_, Elf>(
            "SELECT id, name, job, personality, emoji FROM elves WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(elf)
    }

    async fn create_letter(&self, kid_id: DbId, elf_id: DbId, content: &str) -> Result<Letter, DatabaseError> {
        let query = format!(
            "INSERT INTO letters (kid_id, elf_id, content, sent_at) \
             VALUES ($1, $2, $3, NOW()) RETURNING {LETTER_COLUMNS}"
        );
        let letter = sqlx::query_as::<_, Letter>(&query)
            .bind(kid_id)
            .bind(elf_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;
        Ok(letter)
    }

    async fn attach_response(
        &self,
        letter_id: DbId,
        response: &str,
        responder: Responder,
    ) -> Result<Option<Letter>, DatabaseError> {
        let query = format!(
            "UPDATE letters SET response = $1, response_at = NOW(), responded_by = $2 \
             WHERE id = $3 RETURNING {LETTER_COLUMNS}"
        );
        let letter = sqlx::query_as::<_, Letter>(&query)
            .bind(response)
            .bind(responder.as_str())
            .bind(letter_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(letter)
    }

    async fn letter_parent_id(&self, letter_id: DbId) -> Result<Option<DbId>, DatabaseError> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT k.parent_id FROM letters l JOIN kids k ON l.kid_id = k.id WHERE l.id = $1",
        )
        .bind(letter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(parent_id,)| parent_id))
    }

    async fn list_kid_letters(&self, kid_id: DbId) -> Result<Vec<KidLetter>, DatabaseError> {
        let letters = sqlx::query_as::<_, KidLetter>(
            "SELECT l.id, l.kid_id, l.elf_id, l.content, l.sent_at, l.response, \
                    l.response_at, l.responded_by, \
                    e.name AS elf_name, e.emoji AS elf_emoji \
             FROM letters l \
             JOIN elves e ON l.elf_id = e.id \
             WHERE l.kid_id = $1 \
             ORDER BY l.sent_at DESC, l.id DESC",
        )
        .bind(kid_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(letters)
    }

    async fn list_parent_letters(&self, parent_id: DbId) -> Result<Vec<ParentLetter>, DatabaseError> {
        let letters = sqlx::query_as::<_, ParentLetter>(
            "SELECT l.id, l.kid_id, l.elf_id, l.content, l.sent_at, l.response, \
                    l.response_at, l.responded_by, \
                    k.name AS kid_name, e.name AS elf_name \
             FROM letters l \
             JOIN kids k ON l.kid_id = k.id \
             JOIN elves e ON l.elf_id = e.id \
             WHERE k.parent_id = $1 \
             ORDER BY l.sent_at DESC, l.id DESC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(letters)
    }

    async fn list_active_videos(&self) -> Result<Vec<Video>, DatabaseError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT id, title, description, video_url, thumbnail_url, is_active, created_at \
             FROM videos WHERE is_active = true ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn list_certificates(&self, kid_id: DbId) -> Result<Vec<Certificate>, DatabaseError> {
        let certificates = sqlx::query_as::<_, Certificate>(
            "SELECT id, kid_id, certificate_type, title, issued_at \
             FROM certificates WHERE kid_id = $1 ORDER BY issued_at DESC",
        )
        .bind(kid_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(certificates)
    }
}
