// handlers/mod.rs - Two security tiers
//
// Public (no token) and protected (bearer token, role checked per handler).
pub mod protected;
pub mod public;
