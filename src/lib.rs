pub mod config;
pub mod error;
pub mod event_registry;
pub mod flyers;
pub mod guest_registry;
pub mod handlers;
pub mod models;
pub mod query;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use state::AppState;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Largest request body accepted, flyer included.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Builds the HTTP surface over the registries in `app_state`.
pub fn app(app_state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/events",
            get(handlers::get_events).post(handlers::create_event_handler),
        )
        .route("/events/{event_id}", get(handlers::get_event))
        .route("/events/{event_id}/guests", get(handlers::get_event_guests))
        .route("/guests", post(handlers::create_guest_handler))
        .route("/guests/{guest_id}", get(handlers::get_guest))
        .route("/guests/{guest_id}/rsvp", post(handlers::update_rsvp));

    if let Some(dir) = app_state.flyers.public_dir() {
        router = router.nest_service("/flyers", ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
