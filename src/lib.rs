//! # memberhub - identity and session authorization
//!
//! The account and session core of a student membership site: registration,
//! login, logout, profile and password management, and role-gated
//! administration of accounts.
//!
//! ## Overview
//!
//! memberhub can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `memberhub-server` binary
//! 2. **As a library** - Mount [`api::routes::create_router`] in your own axum app
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use memberhub::{api::routes::app, AppState, HubConfig, TursoClient};
//! use std::sync::Arc;
//!
//! let config = HubConfig::load("memberhub.toml")?;
//! let db = Arc::new(TursoClient::new_local(&config.database.url).await?);
//! let secret = config.jwt_secret()?;
//! let state = AppState::new(config, db, secret.as_bytes())?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app(state)).await?;
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Password hashing, tokens, the authenticator and guards
//! - [`cli`] - Command-line interface of the server binary
//! - [`db`] - Account and session persistence (libsql)
//! - [`types`] - Request/response types and error handling
//! - [`utils`] - TOML configuration
//!
//! ## Sessions
//!
//! A token is only honored while its fingerprint has a live row in the
//! session ledger. Logout, password change and account deletion remove rows,
//! which revokes tokens before their signed expiry.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Credentials, tokens, sessions and access guards.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Account and session storage.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use auth::{AccessGuard, Authenticator, PasswordHasher, TokenIssuer};
pub use db::{AccountStore, CredentialStore, SessionLedger, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::HubConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Infrastructure configuration
    pub config: Arc<HubConfig>,
    /// Account lookups and mutations
    pub accounts: Arc<dyn CredentialStore>,
    /// Live session rows
    pub ledger: Arc<dyn SessionLedger>,
    /// Registration, login, logout and password change
    pub authenticator: Arc<Authenticator>,
    /// Bearer token checks for protected routes
    pub guard: Arc<AccessGuard>,
}

impl AppState {
    /// Wires the stores, token issuer and guards from a loaded configuration.
    pub fn new(config: HubConfig, turso: Arc<TursoClient>, jwt_secret: &[u8]) -> Result<Self> {
        let hasher = config
            .password_hasher()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let policy = config.session_policy();

        let accounts: Arc<dyn CredentialStore> =
            Arc::new(AccountStore::new(turso.clone(), hasher.clone()));
        let ledger: Arc<dyn SessionLedger> = turso.clone();
        let tokens = Arc::new(TokenIssuer::new(jwt_secret));

        let authenticator = Arc::new(Authenticator::new(
            accounts.clone(),
            ledger.clone(),
            tokens.clone(),
            hasher,
            policy,
        )?);
        let guard = Arc::new(AccessGuard::new(tokens, ledger.clone(), accounts.clone()));

        Ok(Self {
            config: Arc::new(config),
            accounts,
            ledger,
            authenticator,
            guard,
        })
    }
}
