use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::state::AppState;
use crate::db::User;
use crate::error::AppError;
use crate::services::AuthService;

/// The authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication middleware - resolves the bearer token to its user
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).map(str::to_owned);

    let user = AuthService::authenticate(&state.db, token.as_deref()).await?;
    tracing::debug!(user_id = user.id, "Request authenticated");

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
/// A missing header or another scheme counts as no credentials at all.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
