// src/routes.rs

use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, listing, user},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, user, listing).
/// * Guards owner-scoped routes with the session-cookie middleware.
/// * Applies global middleware (Trace, CORS) and, when configured, serves the
///   client bundle for every other path.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Credentialed requests need explicit origins, not a wildcard.
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let require_session = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/google", post(auth::google))
        .route("/signout", get(auth::signout));

    let user_routes = Router::new()
        .route("/{id}", get(user::get_user))
        .route("/update/{id}", post(user::update_user))
        .route("/delete/{id}", delete(user::delete_user))
        .route("/listings/{id}", get(user::list_user_listings))
        .route_layer(require_session.clone());

    let listing_routes = Router::new()
        .route("/create", post(listing::create_listing))
        .route("/update/{id}", post(listing::update_listing))
        .route("/delete/{id}", delete(listing::delete_listing))
        .route_layer(require_session)
        // Public routes
        .route("/get", get(listing::search_listings))
        .route("/get/{id}", get(listing::get_listing));

    let mut app = Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/user", user_routes)
        .nest("/api/listing", listing_routes)
        .route("/api/health", get(|| async { "ok" }));

    if let Some(dir) = &state.config.static_dir {
        let index = Path::new(dir).join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
    .with_state(state)
}
