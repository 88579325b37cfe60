//! Current-user profile

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::db::User;
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;

/// Public view of a user; never includes the hash or token id
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub about: Option<String>,
    pub confirmed: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            about: u.about,
            confirmed: u.confirmed,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// GET /users/me
async fn me(CurrentUser(user): CurrentUser) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(UserResponse::from(user)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/users/me", get(me))
}
