//! # User Repository
//!
//! Account storage. Hashing and credential checks live in the API crate;
//! this layer only stores and fetches rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use storefront_core::{CoreError, NewUser, Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user with the default role.
    ///
    /// A taken username or email comes back as
    /// `DbError::UniqueViolation { field: "username" | "email", .. }`.
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        debug!(username = %user.username, "Inserting user");

        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, username, email, password_hash, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Role::User)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                let value = if field == "email" {
                    user.email.clone()
                } else {
                    user.username.clone()
                };
                DbError::duplicate(field, value)
            }
            other => other,
        })?;

        info!(id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Finds a user by (already normalized) email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<User> {
        sqlx::query_as(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(id).into())
    }

    /// Changes a user's role. Only the seed tool promotes accounts.
    pub async fn set_role(&self, id: i64, role: Role) -> DbResult<User> {
        let user: Option<User> = sqlx::query_as(
            r#"
            UPDATE users SET role = ?1 WHERE id = ?2
            RETURNING id, username, email, password_hash, role, created_at
            "#,
        )
        .bind(role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let user = user.ok_or(CoreError::UserNotFound(id))?;
        info!(id, role = %user.role, "User role changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;

        let created = db.users().insert(&alice()).await.unwrap();
        assert_eq!(created.role, Role::User);

        let found = db
            .users()
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert!(db.users().find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let db = test_db().await;
        db.users().insert(&alice()).await.unwrap();

        let mut same_name = alice();
        same_name.email = "other@example.com".to_string();
        let err = db.users().insert(&same_name).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));

        let mut same_email = alice();
        same_email.username = "alice2".to_string();
        let err = db.users().insert(&same_email).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_set_role() {
        let db = test_db().await;
        let user = db.users().insert(&alice()).await.unwrap();

        let promoted = db.users().set_role(user.id, Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);
        let err = db.users().set_role(999, Role::Admin).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::UserNotFound(999))));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = test_db().await;
        let user = db.users().insert(&alice()).await.unwrap();

        assert_eq!(db.users().get_by_id(user.id).await.unwrap().username, "alice");
        let err = db.users().get_by_id(999).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::UserNotFound(999))));
    }
}
