// handlers/public/mod.rs - Handlers reachable without a bearer token
pub mod auth;
pub mod elves;
pub mod health;
pub mod webhooks;

pub use auth::{kid_login, kid_register, parent_login, parent_register};
pub use elves::elves_list;
pub use health::health_get;
pub use webhooks::stripe_webhook;
