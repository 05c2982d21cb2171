// handlers/protected/mod.rs - Handlers behind the bearer token middleware
//
// Every handler here receives the caller's `Identity` from request extensions
// and checks the role it needs before touching the store.
pub mod catalog;
pub mod elves;
pub mod letters;
pub mod parent;
pub mod subscriptions;

pub use catalog::{certificates_get, videos_get};
pub use elves::elf_select;
pub use letters::{letters_get, letters_post};
pub use parent::{kids_get, letter_respond, parent_letters_get, settings_patch};
pub use subscriptions::create_checkout;

use crate::auth::Identity;
use crate::database::models::DbId;
use crate::error::ApiError;

pub(crate) fn require_parent(identity: Identity) -> Result<DbId, ApiError> {
    match identity {
        Identity::Parent(id) => Ok(id),
        Identity::Kid(_) => Err(ApiError::forbidden("Parent account required")),
    }
}

pub(crate) fn require_kid(identity: Identity) -> Result<DbId, ApiError> {
    match identity {
        Identity::Kid(id) => Ok(id),
        Identity::Parent(_) => Err(ApiError::forbidden("Kid account required")),
    }
}
