//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for memberhub, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/auth`)
//! - `POST /api/auth/register` - Register a new account and receive a token
//! - `POST /api/auth/login` - Login and receive a token
//! - `POST /api/auth/admin/login` - Admin-only login with a shorter session
//! - `POST /api/auth/logout` - Revoke the presented token
//! - `GET /api/auth/me` - Current account
//! - `PUT /api/auth/profile` - Update profile fields
//! - `PUT /api/auth/password` - Change password, revoking other sessions
//!
//! ## Administration (`/api/admin`)
//! - `GET /api/admin/users` - List accounts
//! - `PUT /api/admin/users/{id}/role` - Change an account's role
//! - `DELETE /api/admin/users/{id}` - Delete an account and everything tied to it
//!
//! ## Misc
//! - `GET /health` - Liveness probe
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! # Authentication
//!
//! Protected endpoints require a live session token in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    AccountView, AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse,
    ProfileUpdate, RegisterRequest, Role, RoleUpdateRequest, UpdatedUserResponse,
    UserListResponse, UserResponse,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// OpenAPI document for every route under `/api`.
#[derive(OpenApi)]
#[openapi(
    info(title = "memberhub", description = "Identity and session authorization"),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::admin_login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::auth::update_profile,
        handlers::auth::change_password,
        handlers::admin::list_users,
        handlers::admin::update_role,
        handlers::admin::delete_user,
    ),
    components(schemas(
        Role,
        AccountView,
        RegisterRequest,
        LoginRequest,
        ChangePasswordRequest,
        ProfileUpdate,
        RoleUpdateRequest,
        AuthResponse,
        UserResponse,
        UpdatedUserResponse,
        UserListResponse,
        MessageResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and session management"),
        (name = "admin", description = "Account administration")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
