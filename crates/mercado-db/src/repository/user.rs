//! # User Repository
//!
//! Credentials, roles, and the default-admin bootstrap.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Authentication                                    │
//! │                                                                         │
//! │  Login screen                                                          │
//! │       │  authenticate("admin", "admin")                                │
//! │       ▼                                                                 │
//! │  SELECT password_hash FROM users WHERE username = ?                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  hex(sha256(supplied)) == stored hash?                                 │
//! │       │                                                                 │
//! │       ├── yes → UserSummary { username, role }  (hash never leaves)    │
//! │       └── no  → DbError::Unauthorized  (same error for unknown user)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Credentials are stored as hex-encoded SHA-256 digests. Listings and the
//! authenticate result expose [`UserSummary`] only; the hash never crosses
//! the repository boundary.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use mercado_core::validation::{validate_password, validate_username};
use mercado_core::{Role, UserSummary, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user with the given credentials and role.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    pub async fn create(&self, username: &str, password: &str, role: Role) -> DbResult<UserSummary> {
        validate_username(username)?;
        validate_password(password)?;

        let username = username.trim();
        debug!(username = %username, ?role, "Creating user");

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(hash_password(password))
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(UserSummary {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            role,
        })
    }

    /// Verifies a username/password pair.
    ///
    /// Unknown usernames and wrong passwords fail identically with
    /// [`DbError::Unauthorized`]; callers cannot probe for valid usernames.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<UserSummary> {
        let row = sqlx::query_as::<_, (i64, String, String, Role)>(
            "SELECT id, username, password_hash, role FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let (id, username, stored_hash, role) = row.ok_or(DbError::Unauthorized)?;

        if hash_password(password) != stored_hash {
            return Err(DbError::Unauthorized);
        }

        debug!(username = %username, ?role, "User authenticated");
        Ok(UserSummary { id, username, role })
    }

    /// Lists all users, without password hashes.
    pub async fn list(&self) -> DbResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, role FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Updates a user's username, role, and optionally their password.
    ///
    /// Passing `None` for the password preserves the existing hash.
    pub async fn update(
        &self,
        id: i64,
        username: &str,
        role: Role,
        new_password: Option<&str>,
    ) -> DbResult<()> {
        validate_username(username)?;

        let result = match new_password {
            Some(password) => {
                validate_password(password)?;
                sqlx::query(
                    "UPDATE users SET username = ?2, role = ?3, password_hash = ?4 WHERE id = ?1",
                )
                .bind(id)
                .bind(username.trim())
                .bind(role)
                .bind(hash_password(password))
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE users SET username = ?2, role = ?3 WHERE id = ?1")
                    .bind(id)
                    .bind(username.trim())
                    .bind(role)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Changes a user's password.
    pub async fn change_password(&self, id: i64, new_password: &str) -> DbResult<()> {
        validate_password(new_password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(hash_password(new_password))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Deletes a user.
    ///
    /// The acting user can never delete themselves; that would strand the
    /// session (and possibly the last admin) mid-shift.
    pub async fn delete(&self, id: i64, acting_user_id: i64) -> DbResult<()> {
        let row = sqlx::query_as::<_, (String,)>("SELECT username FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let (username,) = row.ok_or_else(|| DbError::not_found("User", id))?;

        if id == acting_user_id {
            return Err(DbError::SelfDeletion { username });
        }

        debug!(username = %username, "Deleting user");

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Ensures a fresh install has the default `admin`/`admin` account.
    ///
    /// Runs at startup so a fresh install is never locked out. The account
    /// is synthesized only when the user table is completely empty; once any
    /// account exists (renamed admin, cashiers only, whatever), startup
    /// never re-creates the weak default.
    ///
    /// ## Returns
    /// `true` if the account was created by this call.
    pub async fn ensure_default_admin(&self) -> DbResult<bool> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        if existing > 0 {
            return Ok(false);
        }

        self.create(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, Role::Admin)
            .await?;

        info!("Default admin account created");
        Ok(true)
    }
}

/// Hex-encoded SHA-256 digest of a password.
fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        // Known digest of the empty string
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_password("admin").len(), 64);
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let db = test_db().await;
        let repo = db.users();

        let created = repo.create("cajero1", "s3cret", Role::Cashier).await.unwrap();
        assert_eq!(created.role, Role::Cashier);

        let session = repo.authenticate("cajero1", "s3cret").await.unwrap();
        assert_eq!(session.id, created.id);

        assert!(matches!(
            repo.authenticate("cajero1", "wrong").await,
            Err(DbError::Unauthorized)
        ));
        assert!(matches!(
            repo.authenticate("nadie", "s3cret").await,
            Err(DbError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        let repo = db.users();

        repo.create("cajero1", "a", Role::Cashier).await.unwrap();
        assert!(matches!(
            repo.create("cajero1", "b", Role::Admin).await,
            Err(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_admin_bootstrap_is_idempotent() {
        let db = test_db().await;
        let repo = db.users();

        assert!(repo.ensure_default_admin().await.unwrap());
        assert!(!repo.ensure_default_admin().await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);

        let admin = repo.authenticate("admin", "admin").await.unwrap();
        assert_eq!(admin.role, Role::Admin);

        // bootstrap never resets a changed password
        repo.change_password(admin.id, "nueva").await.unwrap();
        assert!(!repo.ensure_default_admin().await.unwrap());
        assert!(repo.authenticate("admin", "admin").await.is_err());
        assert!(repo.authenticate("admin", "nueva").await.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_skips_nonempty_store() {
        let db = test_db().await;
        let repo = db.users();

        // the store has accounts, just none named "admin" (renamed or
        // deleted by a real admin) - the weak default must not come back
        repo.create("maria", "s3cret", Role::Admin).await.unwrap();

        assert!(!repo.ensure_default_admin().await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(matches!(
            repo.authenticate("admin", "admin").await,
            Err(DbError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_update_preserves_password_when_omitted() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.create("cajero1", "s3cret", Role::Cashier).await.unwrap();

        // promote without touching the password
        repo.update(user.id, "cajero1", Role::Admin, None)
            .await
            .unwrap();
        let session = repo.authenticate("cajero1", "s3cret").await.unwrap();
        assert_eq!(session.role, Role::Admin);

        // rename and reset the password
        repo.update(user.id, "encargado", Role::Admin, Some("nueva"))
            .await
            .unwrap();
        assert!(repo.authenticate("cajero1", "s3cret").await.is_err());
        assert!(repo.authenticate("encargado", "nueva").await.is_ok());

        assert!(matches!(
            repo.update(9999, "nadie", Role::Cashier, None).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_self_deletion_guard() {
        let db = test_db().await;
        let repo = db.users();

        let admin = repo.create("admin", "admin", Role::Admin).await.unwrap();
        let cashier = repo.create("cajero1", "x", Role::Cashier).await.unwrap();

        assert!(matches!(
            repo.delete(admin.id, admin.id).await,
            Err(DbError::SelfDeletion { .. })
        ));

        repo.delete(cashier.id, admin.id).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);

        assert!(matches!(
            repo.delete(cashier.id, admin.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_listing_hides_hashes() {
        let db = test_db().await;
        let repo = db.users();
        repo.create("cajero1", "s3cret", Role::Cashier).await.unwrap();

        let listed = &repo.list().await.unwrap()[0];
        let json = serde_json::to_string(listed).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("hash"));
    }
}
