use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{favorites, health, highlights, last_read, scripture, users};

/// All routes with state applied. CORS and tracing layers are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/readiness", get(health::readiness))
        .route("/liveness", get(health::liveness))
        .route("/api/register", post(auth::register))
        .route("/api/register/", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/login/", post(auth::login))
        .route("/api/niv/verses", get(scripture::list_verses))
        .route("/api/niv/books", get(scripture::list_books))
        .route("/api/niv/chapters/{book_id}", get(scripture::max_chapter))
        .route("/api/niv/{book_id}/{chapter_id}/verses", get(scripture::list_chapter_verses))
        .route("/api/niv/explain", post(scripture::explain_verse));

    let protected_routes = Router::new()
        .route(
            "/api/users/me",
            get(users::get_me).put(users::update_me).delete(users::delete_me),
        )
        .route(
            "/api/users/me/favorites",
            post(favorites::add_favorite).get(favorites::list_favorites),
        )
        .route(
            "/api/users/me/favorites/{book_id}/{chapter}/{verse}",
            delete(favorites::remove_favorite),
        )
        .route(
            "/api/users/me/highlights",
            post(highlights::add_highlight).get(highlights::list_highlights),
        )
        .route(
            "/api/users/me/highlights/{book_id}/{chapter}/{verse}",
            put(highlights::update_highlight).delete(highlights::remove_highlight),
        )
        .route(
            "/api/users/me/last-read",
            post(last_read::set_last_read).get(last_read::get_last_read),
        )
        .route("/api/last-read-verses", get(last_read::list_last_read))
        .route("/api/last-read-verses/", get(last_read::list_last_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
