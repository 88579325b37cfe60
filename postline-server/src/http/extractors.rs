//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiError;
use super::server::AppState;
use crate::auth::{AuthError, TokenType};
use crate::db::{DbError, User, UserRepo};
use crate::models::{PostId, ValidationError};

/// The authenticated, active user behind a bearer access token
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let claims = state.tokens.verify(token, TokenType::Access)?;

        let user = match UserRepo::new(&state.pool).get(claims.user_id()?).await {
            Ok(user) => user,
            // token outlived its account
            Err(DbError::NotFound { .. }) => return Err(AuthError::InvalidToken.into()),
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            tracing::info!(user_id = user.id, "rejected request from inactive user");
            return Err(AuthError::Inactive.into());
        }

        Ok(Self(user))
    }
}

/// Extract a `Bearer` token; the scheme is case-insensitive.
pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extract and validate a post id from path
pub struct ValidPostId(pub PostId);

impl<S> FromRequestParts<S> for ValidPostId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let id = raw.parse::<i64>().map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "must be a positive integer",
            })
        })?;

        Ok(Self(PostId::new(id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder();
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_bearer_token() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let parts = parts_with_auth(Some("bearer   xyz"));
        assert_eq!(bearer_token(&parts), Some("xyz"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(bearer_token(&parts_with_auth(None)), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Basic dXNlcjpwdw=="))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Bearer  "))), None);
    }
}
