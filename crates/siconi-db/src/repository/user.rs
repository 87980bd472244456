//! # User Repository
//!
//! Accounts for the people working the counter. Passwords are stored as
//! Argon2 PHC strings and only ever compared through [`UserRepository::verify_credentials`].

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use siconi_core::validation::{validate_name, validate_password, validate_username};
use siconi_core::{new_id, User, UserRole};

const SELECT_USER: &str =
    "SELECT id, username, password_hash, full_name, role, is_active, created_at FROM users";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
    ) -> DbResult<User> {
        let username = username.trim().to_lowercase();
        validate_username(&username)?;
        validate_password(password)?;
        validate_name("full name", full_name)?;

        let user = User {
            id: new_id(),
            username,
            password_hash: hash_password(password)?,
            full_name: full_name.trim().to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, full_name, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &user.username),
            other => other,
        })?;

        info!(id = %user.id, username = %user.username, role = ?user.role, "User created");
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE username = ?1", SELECT_USER))
            .bind(username.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{} ORDER BY username", SELECT_USER))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Returns the active user when the password matches, `None` otherwise.
    ///
    /// Unknown user, inactive user and wrong password all look the same to
    /// the caller.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            debug!(username = %username, "Login for unknown user");
            return Ok(None);
        };

        if !user.is_active {
            warn!(username = %user.username, "Login attempt on inactive account");
            return Ok(None);
        }

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(username = %user.username, "Wrong password");
            Ok(None)
        }
    }

    pub async fn change_password(&self, id: &str, new_password: &str) -> DbResult<()> {
        validate_password(new_password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?2 WHERE id = ?1")
            .bind(id)
            .bind(hash_password(new_password)?)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, "Password changed");
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id = %id, active = active, "User active flag changed");
        Ok(())
    }
}

fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_verify_credentials() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo
            .create("Maria", "secreto1", "María Gómez", UserRole::Vendedor)
            .await
            .unwrap();
        assert_eq!(user.username, "maria");
        assert!(user.password_hash.starts_with("$argon2"));

        assert!(repo.verify_credentials("maria", "secreto1").await.unwrap().is_some());
        assert!(repo.verify_credentials("maria", "otro-pass").await.unwrap().is_none());
        assert!(repo.verify_credentials("nadie", "secreto1").await.unwrap().is_none());

        repo.set_active(&user.id, false).await.unwrap();
        assert!(repo.verify_credentials("maria", "secreto1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_password_and_duplicates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo
            .create("admin", "inicial1", "Administrador", UserRole::Admin)
            .await
            .unwrap();
        repo.change_password(&user.id, "nuevo123").await.unwrap();

        assert!(repo.verify_credentials("admin", "inicial1").await.unwrap().is_none());
        assert!(repo.verify_credentials("admin", "nuevo123").await.unwrap().is_some());

        let err = repo
            .create("admin", "inicial1", "Otro", UserRole::Asistente)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[test]
    fn test_password_never_serialized() {
        let user = User {
            id: new_id(),
            username: "maria".to_string(),
            password_hash: hash_password("secreto1").unwrap(),
            full_name: "María".to_string(),
            role: UserRole::Vendedor,
            is_active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }
}
