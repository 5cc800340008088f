//! Account administration. Every route here sits behind both the access
//! guard and the admin guard.

use super::json_body;
use crate::{
    auth::AuthenticatedPrincipal,
    types::{
        AppError, MessageResponse, Result, Role, RoleUpdateRequest, UpdatedUserResponse,
        UserListResponse,
    },
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

/// List all accounts.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All accounts", body = UserListResponse),
        (status = 401, description = "Not authorized", body = MessageResponse),
        (status = 403, description = "Admin access required", body = MessageResponse)
    ),
    tag = "admin",
    security(("bearer" = []))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>> {
    let users = state
        .accounts
        .list()
        .await?
        .iter()
        .map(|account| account.view())
        .collect();

    Ok(Json(UserListResponse { users }))
}

/// Change an account's role.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    params(("id" = String, Path, description = "Account id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = UpdatedUserResponse),
        (status = 400, description = "Admins cannot demote themselves", body = MessageResponse),
        (status = 403, description = "Admin access required", body = MessageResponse),
        (status = 404, description = "No such account", body = MessageResponse)
    ),
    tag = "admin",
    security(("bearer" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<String>,
    payload: std::result::Result<Json<RoleUpdateRequest>, JsonRejection>,
) -> Result<Json<UpdatedUserResponse>> {
    let payload = json_body(payload)?;
    if id == principal.id && payload.role != Role::Admin {
        return Err(AppError::Validation(
            "Admins cannot demote themselves".to_string(),
        ));
    }

    let account = state.accounts.set_role(&id, payload.role).await?;
    tracing::info!(
        admin_id = %principal.id,
        user_id = %account.id,
        role = %account.role,
        "Role changed"
    );

    Ok(Json(UpdatedUserResponse {
        message: format!("Role updated to {}", account.role),
        user: account.view(),
    }))
}

/// Delete an account, detaching it from dependent records and revoking its sessions.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Admins cannot delete themselves", body = MessageResponse),
        (status = 403, description = "Admin access required", body = MessageResponse),
        (status = 404, description = "No such account", body = MessageResponse)
    ),
    tag = "admin",
    security(("bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    if id == principal.id {
        return Err(AppError::Validation(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    if !state.accounts.delete(&id).await? {
        return Err(AppError::NotFound("User".to_string()));
    }
    tracing::info!(admin_id = %principal.id, user_id = %id, "Account removed by admin");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
