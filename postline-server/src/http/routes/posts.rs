//! Post endpoints
//!
//! Reads and searches are public but rate limited; create and delete need
//! a bearer token.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use postline_core::SearchFilter;
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::db::{DbError, Post, PostRepo, PostWithAuthor};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidPostId};
use crate::http::rate_limit::limit_requests;
use crate::http::server::AppState;
use crate::models::PostText;

/// Create post request
#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub text: String,
}

/// Post response
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            text: p.text,
            user_id: p.user_id,
            username: None,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

impl From<PostWithAuthor> for PostResponse {
    fn from(p: PostWithAuthor) -> Self {
        Self {
            id: p.id,
            text: p.text,
            user_id: p.user_id,
            username: Some(p.username),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// One search result
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub post_id: i64,
    pub post_text: String,
    pub username: String,
    pub created_at: String,
}

impl From<PostWithAuthor> for SearchHit {
    fn from(p: PostWithAuthor) -> Self {
        Self {
            post_id: p.id,
            post_text: p.text,
            username: p.username,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// POST /posts - create a post as the current user
async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let text = PostText::new(&req.text)?;

    let post = PostRepo::new(&state.pool)
        .create(text, user.id)
        .await
        .map_err(|e| match e {
            // duplicate text is a client mistake, not a resource clash
            DbError::Conflict { reason } => ApiError::BadRequest {
                message: reason.to_owned(),
            },
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// GET /posts/{id} - read a single post
async fn read_post(
    State(state): State<Arc<AppState>>,
    ValidPostId(id): ValidPostId,
) -> Result<Json<PostResponse>, ApiError> {
    let post = PostRepo::new(&state.pool).get(id).await?;
    Ok(Json(PostResponse::from(post)))
}

/// DELETE /posts/{id} - delete one of the current user's posts
async fn delete_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidPostId(id): ValidPostId,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = PostRepo::new(&state.pool).delete_owned(id, user.id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Post with ID {} is successfully deleted.",
        deleted.id
    ))))
}

/// GET /posts/find/{*search} - search by `[@]username/date/days`
async fn search_posts(
    State(state): State<Arc<AppState>>,
    Path(search): Path<String>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    run_search(&state, &search).await
}

/// GET /posts/find - every post
async fn search_all(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SearchHit>>, ApiError> {
    run_search(&state, "").await
}

async fn run_search(state: &AppState, search: &str) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let filter = SearchFilter::parse(search);
    let query = filter.resolve(Utc::now().date_naive())?;
    tracing::debug!(
        username = ?query.username,
        range = ?query.range.map(|r| r.to_string()),
        days = ?query.range.map(|r| r.len_days()),
        "resolved post search"
    );

    let posts = PostRepo::new(&state.pool).search(&query).await?;
    Ok(Json(posts.into_iter().map(SearchHit::from).collect()))
}

/// Post routes; `state` is needed to attach the rate limiter.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let limited = middleware::from_fn_with_state(state, limit_requests);

    Router::new()
        .route("/posts", post(create_post))
        .route(
            "/posts/{id}",
            get(read_post).route_layer(limited.clone()).delete(delete_post),
        )
        .route("/posts/find", get(search_all).route_layer(limited.clone()))
        .route("/posts/find/", get(search_all).route_layer(limited.clone()))
        .route("/posts/find/{*search}", get(search_posts).route_layer(limited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> PostWithAuthor {
        let at = Utc.with_ymd_and_hms(2023, 8, 25, 12, 0, 0).unwrap();
        PostWithAuthor {
            id: 3,
            text: "hello".into(),
            user_id: 9,
            username: "alice".into(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn search_hit_shape() {
        let hit = serde_json::to_value(SearchHit::from(sample())).unwrap();
        assert_eq!(hit["post_id"], 3);
        assert_eq!(hit["post_text"], "hello");
        assert_eq!(hit["username"], "alice");
        assert_eq!(hit["created_at"], "2023-08-25T12:00:00+00:00");
    }

    #[test]
    fn post_response_omits_missing_username() {
        let p = sample();
        let plain = Post {
            id: p.id,
            text: p.text.clone(),
            user_id: p.user_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        };
        let body = serde_json::to_value(PostResponse::from(plain)).unwrap();
        assert!(body.get("username").is_none());

        let body = serde_json::to_value(PostResponse::from(p)).unwrap();
        assert_eq!(body["username"], "alice");
    }
}
