use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/dashboard",
            get(handlers::get_dashboard).post(handlers::post_dashboard),
        )
        .route("/api/options", get(handlers::get_options))
        .with_state(state)
}
