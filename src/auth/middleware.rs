use crate::auth::jwt::TokenIssuer;
use crate::db::{CredentialStore, SessionLedger};
use crate::types::{AppError, Rejection, Result, Role};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// The identity established for one request. Built only by [`AccessGuard`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedPrincipal {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedPrincipal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The exact bearer token the request was authenticated with.
#[derive(Debug, Clone, PartialEq)]
pub struct BearerToken(pub String);

/// Stateless verification plus the stateful checks a signature can't answer.
pub struct AccessGuard {
    tokens: Arc<TokenIssuer>,
    ledger: Arc<dyn SessionLedger>,
    accounts: Arc<dyn CredentialStore>,
}

impl AccessGuard {
    pub fn new(
        tokens: Arc<TokenIssuer>,
        ledger: Arc<dyn SessionLedger>,
        accounts: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            tokens,
            ledger,
            accounts,
        }
    }

    /// Runs every check in order and stops at the first failure.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<(AuthenticatedPrincipal, BearerToken)> {
        let token = bearer_token(headers).ok_or(AppError::Unauthorized(Rejection::NoToken))?;

        let claims = self.tokens.verify(token)?;

        if !self.ledger.is_live(token).await? {
            return Err(AppError::Unauthorized(Rejection::SessionExpired));
        }

        let account = self
            .accounts
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized(Rejection::AccountGone))?;

        // Role comes from the stored account so demotions apply at once.
        let principal = AuthenticatedPrincipal {
            id: account.id,
            email: account.email,
            role: account.role,
        };

        Ok((principal, BearerToken(token.to_string())))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn require_auth(
    State(guard): State<Arc<AccessGuard>>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let (principal, token) = guard.authenticate(req.headers()).await?;

    req.extensions_mut().insert(principal);
    req.extensions_mut().insert(token);

    Ok(next.run(req).await)
}

/// Admin-only gate. Must be layered inside [`require_auth`]; without an
/// established principal it rejects as unauthenticated.
pub async fn require_admin(req: Request, next: Next) -> std::result::Result<Response, AppError> {
    let principal = req
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .ok_or(AppError::Unauthorized(Rejection::NoToken))?;

    if !principal.is_admin() {
        tracing::warn!(user_id = %principal.id, "Non-admin denied admin route");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}

// Extractors for handlers behind the guard

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .ok_or(AppError::Unauthorized(Rejection::NoToken))
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or(AppError::Unauthorized(Rejection::NoToken))
    }
}
