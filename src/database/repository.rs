use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Certificate, DbId, Elf, Kid, KidLetter, KidSummary, Letter, NewKid, NewParent, Parent,
    ParentLetter, Responder, ResponseMode, Video,
};

/// Persistence seam used by every handler.
///
/// Each method is a single statement against the store; callers sequence them
/// without a surrounding transaction.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round-trip used by the health endpoint
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Parents

    async fn find_parent(&self, id: DbId) -> Result<Option<Parent>, DatabaseError>;

    async fn find_parent_by_email(&self, email: &str) -> Result<Option<Parent>, DatabaseError>;

    async fn find_parent_by_code(&self, code: &str) -> Result<Option<Parent>, DatabaseError>;

    /// Fails with [`DatabaseError::Conflict`] when the email is taken
    async fn create_parent(&self, parent: NewParent) -> Result<Parent, DatabaseError>;

    async fn set_response_mode(&self, parent_id: DbId, mode: ResponseMode) -> Result<(), DatabaseError>;

    /// Returns false when no parent row matched
    async fn activate_subscription(&self, parent_id: DbId, plan: &str) -> Result<bool, DatabaseError>;

    async fn list_kids(&self, parent_id: DbId) -> Result<Vec<KidSummary>, DatabaseError>;

    // Kids

    async fn find_kid(&self, id: DbId) -> Result<Option<Kid>, DatabaseError>;

    async fn find_kid_by_username(&self, username: &str) -> Result<Option<Kid>, DatabaseError>;

    /// Fails with [`DatabaseError::Conflict`] when the username is taken
    async fn create_kid(&self, kid: NewKid) -> Result<Kid, DatabaseError>;

    /// Overwrites the selection; the elf id is not checked
    async fn set_kid_elf(&self, kid_id: DbId, elf_id: DbId) -> Result<(), DatabaseError>;

    /// Response mode of the parent who owns this kid
    async fn response_mode_for_kid(&self, kid_id: DbId) -> Result<Option<ResponseMode>, DatabaseError>;

    // Elves

    async fn list_elves(&self) -> Result<Vec<Elf>, DatabaseError>;

    async fn find_elf(&self, id: DbId) -> Result<Option<Elf>, DatabaseError>;

    // Letters

    async fn create_letter(&self, kid_id: DbId, elf_id: DbId, content: &str) -> Result<Letter, DatabaseError>;

    /// Overwrites the reply fields; `None` when the letter does not exist
    async fn attach_response(
        &self,
        letter_id: DbId,
        response: &str,
        responder: Responder,
    ) -> Result<Option<Letter>, DatabaseError>;

    /// Parent of the kid who wrote the letter; `None` when the letter does not exist
    async fn letter_parent_id(&self, letter_id: DbId) -> Result<Option<DbId>, DatabaseError>;

    /// Newest first
    async fn list_kid_letters(&self, kid_id: DbId) -> Result<Vec<KidLetter>, DatabaseError>;

    /// Newest first, across all of the parent's kids
    async fn list_parent_letters(&self, parent_id: DbId) -> Result<Vec<ParentLetter>, DatabaseError>;

    // Catalog

    async fn list_active_videos(&self) -> Result<Vec<Video>, DatabaseError>;

    async fn list_certificates(&self, kid_id: DbId) -> Result<Vec<Certificate>, DatabaseError>;
}
