//! Storage abstraction traits
//!
//! Two seams separate the identity core from persistence:
//!
//! - [`CredentialStore`] - account records, with plaintext passwords routed
//!   through the password hasher before anything is written.
//! - [`SessionLedger`] - the server-side record that makes an issued token
//!   revocable independently of its signature and embedded expiry.
//!
//! Both are implemented over [`TursoClient`](super::turso::TursoClient).
//!
//! # Example
//!
//! ```rust,ignore
//! use memberhub::db::{AccountStore, SessionLedger, TursoClient};
//!
//! let db = Arc::new(TursoClient::new_memory().await?);
//! let accounts = AccountStore::new(db.clone(), PasswordHasher::default());
//! db.record(&token, &account.id, expires_at).await?;
//! assert!(db.is_live(&token).await?);
//! ```

use crate::auth::jwt::fingerprint;
use crate::types::{ProfileUpdate, Result, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// User record from the database
pub use super::turso::Account;

/// Everything needed to create an account. `password` is plaintext and never
/// leaves the store unhashed.
#[derive(Debug, Clone, Default)]
pub struct AccountDraft {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub year: Option<String>,
    pub photo: Option<String>,
}

/// Persisted account records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by email. Matching is case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Look up an account by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>>;

    /// Create an account. Fails with `DuplicateIdentity` if the normalized
    /// email is taken.
    async fn create(&self, draft: AccountDraft) -> Result<Account>;

    /// Replace the stored secret with a hash of `new_plaintext`.
    async fn update_secret(&self, id: &str, new_plaintext: &str) -> Result<()>;

    /// Apply a partial profile update and return the new state.
    async fn update_profile(&self, id: &str, changes: &ProfileUpdate) -> Result<Account>;

    /// Change an account's role and return the new state.
    async fn set_role(&self, id: &str, role: Role) -> Result<Account>;

    /// All accounts, oldest first.
    async fn list(&self) -> Result<Vec<Account>>;

    /// Delete an account, detaching dependent records first. Returns false
    /// if no such account existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Server-side session records.
#[async_trait]
pub trait SessionLedger: Send + Sync {
    /// Bind an issued token to its owner and expiry.
    async fn record(&self, token: &str, user_id: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// True iff a record exists for exactly this token and has not expired.
    async fn is_live(&self, token: &str) -> Result<bool>;

    /// Remove the record for one token. Returns false if there was none.
    async fn revoke(&self, token: &str) -> Result<bool>;

    /// Remove every record belonging to `user_id`, optionally sparing one token.
    async fn revoke_all_for(&self, user_id: &str, except: Option<&str>) -> Result<u64>;

    /// Drop records whose expiry has passed.
    async fn purge_expired(&self) -> Result<u64>;
}

// ============== Implement SessionLedger for TursoClient ==============

#[async_trait]
impl SessionLedger for super::turso::TursoClient {
    async fn record(&self, token: &str, user_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.create_session(&fingerprint(token), user_id, expires_at.timestamp())
            .await
    }

    async fn is_live(&self, token: &str) -> Result<bool> {
        let expiry = self.get_session_expiry(&fingerprint(token)).await?;
        Ok(matches!(expiry, Some(expires_at) if Utc::now().timestamp() <= expires_at))
    }

    async fn revoke(&self, token: &str) -> Result<bool> {
        self.delete_session_by_token_hash(&fingerprint(token)).await
    }

    async fn revoke_all_for(&self, user_id: &str, except: Option<&str>) -> Result<u64> {
        let keep = except.map(fingerprint);
        self.delete_user_sessions(user_id, keep.as_deref()).await
    }

    async fn purge_expired(&self) -> Result<u64> {
        self.delete_expired_sessions(Utc::now().timestamp()).await
    }
}
