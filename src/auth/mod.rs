//! Identity and session authorization
//!
//! This module is the security core of memberhub: credentials, tokens,
//! session liveness and role gating.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id hashing and verification
//! - [`auth::jwt`](crate::auth::jwt) - HS256 token issuance and verification
//! - [`auth::authenticator`](crate::auth::authenticator) - registration, login, logout, password change
//! - [`auth::middleware`](crate::auth::middleware) - access guard, admin guard and extractors
//!
//! # Two checks per request
//!
//! A bearer token must pass both the stateless check (signature and embedded
//! expiry) and the stateful one (a live row in the session ledger). Neither
//! substitutes for the other: the signature proves the token is ours, the
//! ledger lets the server revoke it before it expires.
//!
//! ```ignore
//! use memberhub::auth::middleware::{require_admin, require_auth};
//!
//! let admin = Router::new()
//!     .route("/users", get(list_users))
//!     .layer(middleware::from_fn(require_admin));
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .merge(admin)
//!     .layer(middleware::from_fn_with_state(guard, require_auth));
//! ```
//!
//! ## Extracting the principal in handlers
//!
//! ```ignore
//! async fn me(principal: AuthenticatedPrincipal) -> impl IntoResponse {
//!     format!("Hello, {}!", principal.email)
//! }
//! ```
//!
//! # Configuration
//!
//! Configure via `memberhub.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "JWT_SECRET"   # env var holding the signing key (>= 32 bytes)
//! session_ttl_secs = 604800       # ordinary sessions, 7 days
//! admin_session_ttl_secs = 86400  # admin login sessions, 24 hours
//! ```

/// Registration and login orchestration.
pub mod authenticator;
/// Token issuance and verification.
pub mod jwt;
/// Access guard middleware and request extractors.
pub mod middleware;
/// Password hashing and verification.
pub mod password;

pub use authenticator::{AuthSession, Authenticator, SessionPolicy};
pub use jwt::{IssuedToken, TokenIssuer};
pub use middleware::{AccessGuard, AuthenticatedPrincipal, BearerToken};
pub use password::PasswordHasher;
