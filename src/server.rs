//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth_login))
        .route("/register", post(handlers::auth_register))
        .route("/logout", post(handlers::auth_logout))
        .route("/me", get(handlers::auth_me));

    let book_routes = Router::new()
        .route("/", get(handlers::books_list))
        .route("/", post(handlers::books_create))
        .route("/reorder", put(handlers::books_reorder))
        .route("/{id}", put(handlers::books_update))
        .route("/{id}", delete(handlers::books_delete));

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/images", post(handlers::images_encode))
        .nest("/api/auth", auth_routes)
        .nest("/api/books", book_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
