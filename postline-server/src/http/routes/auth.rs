//! Account endpoints: signup, login, token refresh, logout

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use super::MessageResponse;
use crate::auth::{hash_password, verify_password, AuthError, IssuedTokens, TokenType};
use crate::db::{DbError, NewUser, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;
use crate::models::{Email, Password, Username};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub about: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedTokens> for TokenResponse {
    fn from(t: IssuedTokens) -> Self {
        Self {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            token_type: "bearer",
            expires_in: t.expires_in,
        }
    }
}

/// POST /auth/signup - register an account
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = Username::new(&req.username)?;
    let email = Email::new(&req.email)?;
    let password = Password::new(&req.password)?;
    let about = req.about.filter(|a| !a.trim().is_empty());

    let password_hash = hash_password(password, state.bcrypt_cost).await?;
    let user = UserRepo::new(&state.pool)
        .create(NewUser {
            username,
            email,
            password_hash,
            about,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /auth/login - exchange credentials for a token pair
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = Email::new(&req.email)?;
    let repo = UserRepo::new(&state.pool);

    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(req.password, user.password.clone()).await? {
        tracing::info!(user_id = user.id, "login failed: bad password");
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.is_active {
        return Err(AuthError::Inactive.into());
    }

    let tokens = state.tokens.issue(user.id, &user.username)?;
    repo.set_refresh_token(user.id, Some(&tokens.refresh_id)).await?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse::from(tokens)))
}

/// POST /auth/refresh - rotate a refresh token into a new pair
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = state.tokens.verify(&req.refresh_token, TokenType::Refresh)?;
    let presented = claims.jti.clone().ok_or(AuthError::InvalidToken)?;
    let repo = UserRepo::new(&state.pool);

    let user = match repo.get(claims.user_id()?).await {
        Ok(user) => user,
        Err(DbError::NotFound { .. }) => return Err(AuthError::InvalidToken.into()),
        Err(e) => return Err(e.into()),
    };
    if !user.is_active {
        return Err(AuthError::Inactive.into());
    }

    let tokens = state.tokens.issue(user.id, &user.username)?;
    if !repo
        .rotate_refresh_token(user.id, &presented, &tokens.refresh_id)
        .await?
    {
        // reused or logged-out token
        tracing::warn!(user_id = user.id, "stale refresh token presented");
        return Err(AuthError::InvalidToken.into());
    }

    Ok(Json(TokenResponse::from(tokens)))
}

/// POST /auth/logout - revoke the current refresh token
async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    UserRepo::new(&state.pool)
        .set_refresh_token(user.id, None)
        .await?;

    tracing::info!(user_id = user.id, "user logged out");
    Ok(Json(MessageResponse::new(format!(
        "User {} is logged out.",
        user.username
    ))))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_is_bearer() {
        let body = TokenResponse::from(IssuedTokens {
            access_token: "a".into(),
            refresh_token: "r".into(),
            refresh_id: "id".into(),
            expires_in: 900,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["expires_in"], 900);
        assert!(json.get("refresh_id").is_none());
    }
}
