use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/events", get(handlers::events))
        .route("/api/water", post(handlers::adjust_water))
        .route("/api/mood", post(handlers::set_mood))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .route("/api/items/:kind", post(handlers::create_item))
        .route(
            "/api/items/:kind/:id",
            put(handlers::edit_item).delete(handlers::delete_item),
        )
        .route("/api/items/:kind/:id/toggle", post(handlers::toggle_item))
        .with_state(state)
}
