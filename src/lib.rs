pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use tower_governor::GovernorLayer;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::ApiError;
use crate::handlers::{protected, public};

pub use state::AppState;

/// Full application router: `/api/*` routes, then static files for everything else
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/parent/register", post(public::parent_register))
        .route("/auth/parent/login", post(public::parent_login))
        .route("/auth/kid/register", post(public::kid_register))
        .route("/auth/kid/login", post(public::kid_login))
        .route("/elves", get(public::elves_list))
        .route("/webhooks/stripe", post(public::stripe_webhook))
        .route("/health", get(public::health_get));

    let protected_routes = Router::new()
        .route("/elves/select", post(protected::elf_select))
        .route("/letters", get(protected::letters_get).post(protected::letters_post))
        .route("/parent/letters", get(protected::parent_letters_get))
        .route("/parent/letters/:id/respond", post(protected::letter_respond))
        .route("/parent/settings", patch(protected::settings_patch))
        .route("/parent/kids", get(protected::kids_get))
        .route("/subscriptions/create-checkout", post(protected::create_checkout))
        .route("/videos", get(protected::videos_get))
        .route("/certificates", get(protected::certificates_get))
        .route_layer(from_fn_with_state(state.clone(), middleware::jwt_auth_middleware));

    let mut api = public_routes.merge(protected_routes).fallback(api_not_found);
    if let Some(config) = state.rate_limit.clone() {
        api = api
            .layer(GovernorLayer { config })
            .layer(from_fn(middleware::rate_limit_envelope));
    }

    let mut router = Router::new().nest("/api", api);
    if let Some(dir) = &state.config.server.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    let cors = middleware::cors_layer(&state.config.security);
    let router = router.with_state(state);

    middleware::with_security_headers(router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
