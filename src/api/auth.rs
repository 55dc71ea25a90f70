use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::db::UserInfo;
use crate::error::AppError;
use crate::services::{AuthService, AuthSession};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserInfo,
}

impl AuthResponse {
    fn new(message: &'static str, session: AuthSession) -> Self {
        AuthResponse {
            message,
            token: session.token,
            user: session.user,
        }
    }
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;
    let session = AuthService::signup(&state.db, &req.email, &req.name, &req.password).await?;
    Ok(Json(AuthResponse::new("User created", session)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;
    let session = AuthService::login(&state.db, &req.email, &req.password).await?;
    Ok(Json(AuthResponse::new("Login successful", session)))
}

/// GET /auth/me (requires auth via middleware)
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserInfo> {
    Json(UserInfo::from(&user))
}
