//! Account storage.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::info;

use crate::error::{DbError, Result};
use crate::types::{NewUser, User};
use crate::Database;

/// Hash a password into a PHC string with a fresh random salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|e| DbError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a plain password against a stored PHC hash.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn user_from_row(row: &AnyRow) -> Result<User> {
    let admin: i64 = row.try_get("admin")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        admin: admin != 0,
        password_hash: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    /// Create an account, hashing its password before it is stored.
    ///
    /// Fails with [`DbError::Constraint`] if the username is taken.
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        let username = user.username.trim();
        if username.is_empty() {
            return Err(DbError::invalid_input("username is required"));
        }
        if self.find_user(username).await?.is_some() {
            return Err(DbError::constraint(format!(
                "user '{}' already exists",
                username
            )));
        }

        let hash = hash_password(&user.password)?;
        sqlx::query(&self.kind.sql(
            "INSERT INTO users (username, password, email, admin, created_at) VALUES (?, ?, ?, ?, ?)",
        ))
        .bind(username)
        .bind(hash.as_str())
        .bind(user.email.as_str())
        .bind(i64::from(user.admin))
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        let created = self
            .find_user(username)
            .await?
            .ok_or_else(|| DbError::not_found(format!("user '{}' after insert", username)))?;
        info!(username, admin = created.admin, "Created user");
        Ok(created)
    }

    /// Look up an account by username.
    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&self.kind.sql(
            "SELECT id, username, password, email, admin, created_at FROM users WHERE username = ?",
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Number of stored accounts.
    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?
            .try_get("n")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("not-a-hash", "anything"));
    }
}
