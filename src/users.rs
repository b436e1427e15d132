//! Persistent user accounts
//!
//! Moderator/admin accounts live in the `Users` table. Passwords are
//! stored as bcrypt hashes; permission bits are stored raw and never
//! interpreted here.

use sqlx::MySqlPool;

use crate::console::UserStore;
use crate::permissions::Permissions;

/// Errors from user store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Check a password against a stored hash. Malformed hashes count as a
/// mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// User store backed by the server's MySQL database.
pub struct SqlUserStore {
    pool: MySqlPool,
}

impl SqlUserStore {
    pub fn new(pool: MySqlPool) -> SqlUserStore {
        SqlUserStore { pool }
    }

    /// Fetch the stored permission bits for `username`, if present.
    pub async fn permissions_of(&self, username: &str) -> Option<Permissions> {
        let row: Option<(u64,)> =
            sqlx::query_as("SELECT `UsrPermissions` FROM `Users` WHERE `UsrName` = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .unwrap_or(None);
        row.map(|(bits,)| Permissions::from_bits(bits))
    }
}

impl UserStore for SqlUserStore {
    type Error = StoreError;

    /// Returns true if `username` is in `Users`.
    async fn exists(&self, username: &str) -> bool {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT COUNT(*) FROM `Users` WHERE `UsrName` = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .unwrap_or(None);
        row.map(|(n,)| n > 0).unwrap_or(false)
    }

    async fn create(
        &self,
        username: &str,
        secret: &str,
        permissions: Permissions,
    ) -> Result<(), StoreError> {
        let hash = hash_password(secret)?;
        sqlx::query(
            "INSERT INTO `Users` (`UsrName`, `UsrPassword`, `UsrPermissions`) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(hash)
        .bind(permissions.bits())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete `username`. Deleting a name that is not present is not an
    /// error; the caller reports missing users separately.
    async fn remove(&self, username: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM `Users` WHERE `UsrName` = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
