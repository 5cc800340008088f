use crate::api::ApiDoc;
use crate::auth::middleware::{require_admin, require_auth};
use crate::auth::AccessGuard;
use crate::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Routes mounted under `/api`.
pub fn create_router(guard: Arc<AccessGuard>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/auth/register", post(crate::api::handlers::auth::register))
        .route("/auth/login", post(crate::api::handlers::auth::login))
        .route(
            "/auth/admin/login",
            post(crate::api::handlers::auth::admin_login),
        )
        .route("/openapi.json", get(openapi_json));

    // The admin guard reads the principal the access guard leaves behind,
    // so it must sit inside it.
    let admin_routes = Router::new()
        .route(
            "/admin/users",
            get(crate::api::handlers::admin::list_users),
        )
        .route(
            "/admin/users/{id}/role",
            put(crate::api::handlers::admin::update_role),
        )
        .route(
            "/admin/users/{id}",
            delete(crate::api::handlers::admin::delete_user),
        )
        .layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/auth/logout", post(crate::api::handlers::auth::logout))
        .route("/auth/me", get(crate::api::handlers::auth::me))
        .route(
            "/auth/profile",
            put(crate::api::handlers::auth::update_profile),
        )
        .route(
            "/auth/password",
            put(crate::api::handlers::auth::change_password),
        )
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(guard, require_auth));

    public_routes.merge(protected_routes)
}

/// The complete application: health probe, API, tracing and CORS.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api", create_router(state.guard.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
