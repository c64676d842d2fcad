pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put, delete},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Auth routes
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        // Admin routes
        .nest("/admin", admin_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Internal deployment; tighten if exposed
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/announcements", announcement_routes(state.clone()))
        .nest("/credits", credit_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/documents", document_routes(state))
}

fn announcement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Reading and receipts: any authenticated user
        .route("/", get(handlers::announcements::list))
        .route("/summary", get(handlers::announcements::summary))
        .route("/unread-count", get(handlers::announcements::unread_count))
        .route("/unread", get(handlers::announcements::unread_list))
        .route("/mark-all-read", post(handlers::announcements::mark_all_read))
        .route("/:id", get(handlers::announcements::get))
        .route("/:id/read", post(handlers::announcements::mark_read))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        // Authoring: admins only
        .nest("/", Router::new()
            .route("/", post(handlers::announcements::create))
            .route("/:id", put(handlers::announcements::update))
            .route("/:id", delete(handlers::announcements::delete))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}

fn credit_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::credits::balance))
        .route("/transactions", get(handlers::credits::transactions))
        .route("/consume", post(handlers::credits::consume))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Self-service and org browsing for any authenticated user
        .route("/me/avatar", post(handlers::users::upload_avatar))
        .route("/:id/children", get(handlers::users::children))
        .route("/:id/tree", get(handlers::users::tree))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        // Administration
        .nest("/", Router::new()
            .route("/", get(handlers::users::list))
            .route("/", post(handlers::users::create))
            .route("/stats", get(handlers::users::stats))
            .route("/:id", get(handlers::users::get))
            .route("/:id", put(handlers::users::update))
            .route("/:id", delete(handlers::users::delete))
            .route("/:id/parent", put(handlers::users::set_parent))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}

fn document_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::documents::list))
        .route("/categories", get(handlers::documents::list_categories))
        .route("/:id/download", post(handlers::documents::record_download))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        .nest("/", Router::new()
            .route("/", post(handlers::documents::create))
            .route("/:id", delete(handlers::documents::delete))
            .route("/categories", post(handlers::documents::create_category))
            .route("/categories/:id", delete(handlers::documents::delete_category))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/credits/grant", post(handlers::credits::grant))
        .route("/credits/distribute", post(handlers::credits::distribute))
        .route("/credits/:user_id", get(handlers::credits::user_balance))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ))
        .with_state(state)
}
