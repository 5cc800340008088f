use super::json_body;
use crate::{
    auth::{AuthSession, AuthenticatedPrincipal, BearerToken},
    types::{
        AppError, AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse,
        ProfileUpdate, Rejection, RegisterRequest, Result, UpdatedUserResponse, UserResponse,
    },
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

fn auth_response(message: &str, session: AuthSession) -> AuthResponse {
    AuthResponse {
        message: message.to_string(),
        user: session.user,
        token: session.token,
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let session = state.authenticator.register(json_body(payload)?).await?;

    Ok((
        StatusCode::CREATED,
        Json(auth_response("User registered successfully", session)),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let payload = json_body(payload)?;
    let session = state
        .authenticator
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(auth_response("Login successful", session)))
}

/// Elevated login for administrators
#[utoipa::path(
    post,
    path = "/api/auth/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let payload = json_body(payload)?;
    let session = state
        .authenticator
        .admin_login(&payload.email, &payload.password)
        .await?;

    Ok(Json(auth_response("Admin login successful", session)))
}

/// Revoke the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authorized", body = MessageResponse)
    ),
    tag = "auth",
    security(("bearer" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<MessageResponse>> {
    state.authenticator.logout(&token).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Current account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = UserResponse),
        (status = 401, description = "Not authorized", body = MessageResponse)
    ),
    tag = "auth",
    security(("bearer" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Json<UserResponse>> {
    let account = state
        .accounts
        .find_by_id(&principal.id)
        .await?
        .ok_or(AppError::Unauthorized(Rejection::AccountGone))?;

    Ok(Json(UserResponse {
        user: account.view(),
    }))
}

/// Update profile fields of the current account
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = UpdatedUserResponse),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Not authorized", body = MessageResponse)
    ),
    tag = "auth",
    security(("bearer" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UpdatedUserResponse>> {
    let mut changes = json_body(payload)?;
    if let Some(name) = changes.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
    }

    let account = state
        .accounts
        .update_profile(&principal.id, &changes)
        .await?;

    Ok(Json(UpdatedUserResponse {
        message: "Profile updated successfully".to_string(),
        user: account.view(),
    }))
}

/// Change the password of the current account
///
/// Every other session of the account is revoked; the one making this
/// request stays valid.
#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid input or wrong current password", body = MessageResponse),
        (status = 401, description = "Not authorized", body = MessageResponse)
    ),
    tag = "auth",
    security(("bearer" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    BearerToken(token): BearerToken,
    payload: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let payload = json_body(payload)?;
    state
        .authenticator
        .change_password(
            &principal.id,
            &payload.current_password,
            &payload.new_password,
            &token,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
