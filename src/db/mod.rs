//! Persistence for accounts and sessions.
//!
//! - [`turso`] - libsql client (local SQLite file or in-memory) and raw SQL
//! - [`traits`] - `CredentialStore` and `SessionLedger` seams
//! - [`accounts`] - `CredentialStore` implementation that hashes on write

#![allow(missing_docs)]

pub mod accounts;
pub mod traits;
pub mod turso;

// Re-exports
pub use accounts::{normalize_email, AccountStore};
pub use traits::{Account, AccountDraft, CredentialStore, SessionLedger};
pub use turso::TursoClient;
