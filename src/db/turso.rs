use crate::types::{AccountView, AppError, ProfileUpdate, Result, Role};
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, role, name, student_id, course, year, photo, created_at, updated_at";

pub struct TursoClient {
    db: Database,
    /// In-memory databases live exactly as long as one connection, so every
    /// operation must reuse it.
    shared: Option<Connection>,
}

impl TursoClient {
    /// Opens an ephemeral in-memory database. Used by tests and `:memory:` configs.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self {
            db,
            shared: Some(conn),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Opens (or creates) a local SQLite database file.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path == ":memory:" {
            return Self::new_memory().await;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database {}: {}", path, e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub fn connection(&self) -> Result<Connection> {
        if let Some(conn) = &self.shared {
            return Ok(conn.clone());
        }
        self.db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        // Users table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'student',
                name TEXT NOT NULL,
                student_id TEXT,
                course TEXT,
                year TEXT,
                photo TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        // Sessions table, keyed by token fingerprint
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create sessions table: {}", e)))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create sessions index: {}", e)))?;

        // Event registrations, owned by the events module
        conn.execute(
            "CREATE TABLE IF NOT EXISTS event_registrations (
                event_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                registered_at INTEGER NOT NULL,
                PRIMARY KEY (event_id, user_id),
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create event_registrations table: {}", e))
        })?;

        // Moderation attributions for blog/gallery content
        conn.execute(
            "CREATE TABLE IF NOT EXISTS content_reviews (
                content_id TEXT PRIMARY KEY,
                content_kind TEXT NOT NULL,
                reviewed_by TEXT,
                reviewed_at INTEGER NOT NULL,
                FOREIGN KEY (reviewed_by) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create content_reviews table: {}", e)))?;

        Ok(())
    }

    // User operations
    pub async fn insert_user(&self, draft: &NewAccountRow<'_>) -> Result<Account> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO users (id, email, password_hash, role, name, student_id, course, year, photo, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            libsql::params![
                draft.id,
                draft.email,
                draft.password_hash,
                draft.role.as_str(),
                draft.name,
                draft.student_id,
                draft.course,
                draft.year,
                draft.photo,
                now,
                now,
            ],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateIdentity
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;

        self.get_user_by_id(draft.id)
            .await?
            .ok_or_else(|| AppError::Database("Inserted user vanished".to_string()))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.query_one_user(
            &format!("SELECT {} FROM users WHERE email = ?", ACCOUNT_COLUMNS),
            email,
        )
        .await
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.query_one_user(
            &format!("SELECT {} FROM users WHERE id = ?", ACCOUNT_COLUMNS),
            id,
        )
        .await
    }

    async fn query_one_user(&self, sql: &str, param: &str) -> Result<Option<Account>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(sql, [param])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(Account::from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<Account>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM users ORDER BY created_at ASC, email ASC",
                    ACCOUNT_COLUMNS
                ),
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        let mut accounts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            accounts.push(Account::from_row(&row)?);
        }

        Ok(accounts)
    }

    /// Returns false when no user has the given id.
    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<bool> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let changed = conn
            .execute(
                "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
                (password_hash, now, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update password: {}", e)))?;

        Ok(changed > 0)
    }

    pub async fn update_role(&self, id: &str, role: Role) -> Result<bool> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let changed = conn
            .execute(
                "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
                (role.as_str(), now, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update role: {}", e)))?;

        Ok(changed > 0)
    }

    pub async fn update_profile(&self, id: &str, changes: &ProfileUpdate) -> Result<bool> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let changed = conn
            .execute(
                "UPDATE users SET
                    name = COALESCE(?, name),
                    student_id = COALESCE(?, student_id),
                    course = COALESCE(?, course),
                    year = COALESCE(?, year),
                    photo = COALESCE(?, photo),
                    updated_at = ?
                 WHERE id = ?",
                (
                    changes.name.as_deref(),
                    changes.student_id.as_deref(),
                    changes.course.as_deref(),
                    changes.year.as_deref(),
                    changes.photo.as_deref(),
                    now,
                    id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update profile: {}", e)))?;

        Ok(changed > 0)
    }

    /// Removes an account after detaching everything that references it.
    /// Runs in one transaction; returns false when the account did not exist.
    pub async fn delete_user_cascade(&self, id: &str) -> Result<bool> {
        let conn = self.connection()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM event_registrations WHERE user_id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to detach registrations: {}", e)))?;
        tx.execute(
            "UPDATE content_reviews SET reviewed_by = NULL WHERE reviewed_by = ?",
            [id],
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to detach reviews: {}", e)))?;
        tx.execute("DELETE FROM sessions WHERE user_id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete sessions: {}", e)))?;
        let removed = tx
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit deletion: {}", e)))?;

        Ok(removed > 0)
    }

    // Session operations
    pub async fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        expires_at: i64,
    ) -> Result<()> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, expires_at, created_at)
             VALUES (?, ?, ?, ?)",
            (token_hash, user_id, expires_at, now),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create session: {}", e)))?;

        Ok(())
    }

    /// Expiry of the session with the given fingerprint, if one was recorded.
    pub async fn get_session_expiry(&self, token_hash: &str) -> Result<Option<i64>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT expires_at FROM sessions WHERE token_hash = ?",
                [token_hash],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query session: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(
                row.get::<i64>(0)
                    .map_err(|e| AppError::Database(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub async fn delete_session_by_token_hash(&self, token_hash: &str) -> Result<bool> {
        let conn = self.connection()?;

        let removed = conn
            .execute("DELETE FROM sessions WHERE token_hash = ?", [token_hash])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete session: {}", e)))?;

        Ok(removed > 0)
    }

    pub async fn delete_user_sessions(
        &self,
        user_id: &str,
        keep_token_hash: Option<&str>,
    ) -> Result<u64> {
        let conn = self.connection()?;

        let removed = conn
            .execute(
                "DELETE FROM sessions WHERE user_id = ? AND token_hash IS NOT COALESCE(?, '')",
                (user_id, keep_token_hash),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user sessions: {}", e)))?;

        Ok(removed)
    }

    pub async fn delete_expired_sessions(&self, now: i64) -> Result<u64> {
        let conn = self.connection()?;

        conn.execute("DELETE FROM sessions WHERE expires_at < ?", [now])
            .await
            .map_err(|e| AppError::Database(format!("Failed to purge sessions: {}", e)))
    }
}

fn is_unique_violation(err: &libsql::Error) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}

/// Column values for a new `users` row. The hash must already be computed.
#[derive(Debug)]
pub struct NewAccountRow<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub name: &'a str,
    pub student_id: Option<&'a str>,
    pub course: Option<&'a str>,
    pub year: Option<&'a str>,
    pub photo: Option<&'a str>,
}

/// A stored password digest. Not serializable, and redacted in `Debug`.
#[derive(Clone)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// User record from the database
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub secret: PasswordDigest,
    pub role: Role,
    pub name: String,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub year: Option<String>,
    pub photo: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    fn from_row(row: &Row) -> Result<Self> {
        let role: String = row.get(3).map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Self {
            id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
            secret: PasswordDigest(row.get(2).map_err(|e| AppError::Database(e.to_string()))?),
            role: Role::parse(&role)
                .ok_or_else(|| AppError::Database(format!("Unknown role '{}'", role)))?,
            name: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
            student_id: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
            course: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
            year: row.get(7).map_err(|e| AppError::Database(e.to_string()))?,
            photo: row.get(8).map_err(|e| AppError::Database(e.to_string()))?,
            created_at: row.get(9).map_err(|e| AppError::Database(e.to_string()))?,
            updated_at: row.get(10).map_err(|e| AppError::Database(e.to_string()))?,
        })
    }

    /// The outward projection. There is no other way to serialize an account.
    pub fn view(&self) -> AccountView {
        let created_at = DateTime::<Utc>::from_timestamp(self.created_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        AccountView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            student_id: self.student_id.clone(),
            course: self.course.clone(),
            year: self.year.clone(),
            photo: self.photo.clone(),
            created_at,
        }
    }
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        account.view()
    }
}
