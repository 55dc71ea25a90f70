use std::sync::OnceLock;

use sqlx::{Pool, Sqlite};

use crate::crypto::{generate_session_token, hash_password, verify_password};
use crate::db::{User, UserInfo, UserRepository};
use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash compared against when the email is unknown
fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}

/// A freshly issued session token and the user it belongs to
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: UserInfo,
}

pub struct AuthService;

impl AuthService {
    pub async fn signup(
        pool: &Pool<Sqlite>,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        validate_signup(email, name, password)?;

        if UserRepository::get_by_email(pool, email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = hash_password(password)?;
        let token = generate_session_token();

        let user = UserRepository::create(pool, email, name.trim(), &password_hash, &token).await?;
        tracing::info!(user_id = user.id, "New user signed up");

        Ok(AuthSession {
            token,
            user: UserInfo::from(&user),
        })
    }

    /// Verify credentials and issue a new token, replacing the previous one
    pub async fn login(
        pool: &Pool<Sqlite>,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let Some(user) = UserRepository::get_by_email(pool, email).await? else {
            // Burn the same Argon2 cost as a real check so unknown emails can't be timed
            let _ = verify_password(password, dummy_hash());
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = generate_session_token();
        UserRepository::replace_session_token(pool, user.id, &token).await?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(AuthSession {
            token,
            user: UserInfo::from(&user),
        })
    }

    /// Resolve a bearer token to the user currently holding it
    pub async fn authenticate(pool: &Pool<Sqlite>, token: Option<&str>) -> Result<User, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        UserRepository::get_by_session_token(pool, token)
            .await?
            .ok_or(AppError::InvalidSession)
    }
}

fn validate_signup(email: &str, name: &str, password: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".to_string()));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AppError::Validation("Invalid email address".to_string())),
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;

    #[test]
    fn test_validate_signup() {
        assert!(validate_signup("a@b.com", "Ann", "longenough").is_ok());
        assert!(matches!(
            validate_signup("a@b.com", "  ", "longenough"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_signup("nope", "Ann", "longenough"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_signup("a@b.com", "Ann", "short"),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = memory_pool().await;

        AuthService::signup(&pool, "ann@uci.edu", "Ann", "password123").await.unwrap();
        let err = AuthService::signup(&pool, "ann@uci.edu", "Other Ann", "password456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let pool = memory_pool().await;

        AuthService::signup(&pool, "ann@uci.edu", "Ann", "password123").await.unwrap();
        AuthService::signup(&pool, "Ann@uci.edu", "Ann", "password123").await.unwrap();
    }

    #[tokio::test]
    async fn test_signup_token_authenticates() {
        let pool = memory_pool().await;

        let session = AuthService::signup(&pool, "ann@uci.edu", "Ann", "password123")
            .await
            .unwrap();
        let user = AuthService::authenticate(&pool, Some(&session.token)).await.unwrap();
        assert_eq!(user.id, session.user.id);
        assert_eq!(user.email, "ann@uci.edu");
        assert_ne!(user.password_hash, "password123");

        let stored = UserRepository::get_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.session_token.as_deref(), Some(session.token.as_str()));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let pool = memory_pool().await;

        AuthService::signup(&pool, "ann@uci.edu", "Ann", "password123").await.unwrap();
        let err = AuthService::login(&pool, "ann@uci.edu", "password124").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = AuthService::login(&pool, "nobody@uci.edu", "password123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = dummy_hash();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("password123", hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_supersedes_previous_token() {
        let pool = memory_pool().await;

        let signup = AuthService::signup(&pool, "ann@uci.edu", "Ann", "password123")
            .await
            .unwrap();
        let first = AuthService::login(&pool, "ann@uci.edu", "password123").await.unwrap();

        let err = AuthService::authenticate(&pool, Some(&signup.token)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession));
        AuthService::authenticate(&pool, Some(&first.token)).await.unwrap();

        let second = AuthService::login(&pool, "ann@uci.edu", "password123").await.unwrap();
        let err = AuthService::authenticate(&pool, Some(&first.token)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession));
        AuthService::authenticate(&pool, Some(&second.token)).await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticate_without_token() {
        let pool = memory_pool().await;

        let err = AuthService::authenticate(&pool, None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        let err = AuthService::authenticate(&pool, Some("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        let err = AuthService::authenticate(&pool, Some("bogus")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession));
    }
}
