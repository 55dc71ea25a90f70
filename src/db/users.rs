use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::db::models::User;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    /// Insert a user. A racing signup that trips `UNIQUE(email)` is reported
    /// as `DuplicateEmail`, same as the up-front check.
    pub async fn create(
        pool: &Pool<Sqlite>,
        email: &str,
        name: &str,
        password_hash: &str,
        session_token: &str,
    ) -> Result<User, AppError> {
        let created_at = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (email, name, password_hash, session_token, created_at)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(session_token)
        .bind(created_at)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation() && db_err.message().contains("users.email") =>
            {
                AppError::DuplicateEmail
            }
            other => AppError::Database(other),
        })?;

        Ok(user)
    }

    pub async fn get_by_email(
        pool: &Pool<Sqlite>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    #[cfg(test)]
    pub(crate) async fn get_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_session_token(
        pool: &Pool<Sqlite>,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE session_token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Overwrite the user's single session token. Whatever token was stored
    /// before stops authenticating as soon as this returns.
    pub async fn replace_session_token(
        pool: &Pool<Sqlite>,
        user_id: i64,
        token: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET session_token = ? WHERE id = ?")
            .bind(token)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!("User {} vanished during login", user_id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;

    #[tokio::test]
    async fn test_unique_email_violation_is_duplicate_email() {
        let pool = memory_pool().await;

        UserRepository::create(&pool, "ann@uci.edu", "Ann", "hash", "token-1")
            .await
            .unwrap();
        let err = UserRepository::create(&pool, "ann@uci.edu", "Ann", "hash", "token-2")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_reused_token_is_not_duplicate_email() {
        let pool = memory_pool().await;

        UserRepository::create(&pool, "ann@uci.edu", "Ann", "hash", "same-token")
            .await
            .unwrap();
        let err = UserRepository::create(&pool, "bob@uci.edu", "Bob", "hash", "same-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_replace_session_token() {
        let pool = memory_pool().await;

        let user = UserRepository::create(&pool, "ann@uci.edu", "Ann", "hash", "old")
            .await
            .unwrap();
        UserRepository::replace_session_token(&pool, user.id, "new").await.unwrap();

        assert!(UserRepository::get_by_session_token(&pool, "old").await.unwrap().is_none());
        let found = UserRepository::get_by_session_token(&pool, "new").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(
            UserRepository::get_by_id(&pool, user.id).await.unwrap().unwrap().email,
            "ann@uci.edu"
        );
    }
}
