//! Post repository
//!
//! - create: INSERT, duplicate text surfaces as a conflict
//! - delete: single owner-scoped DELETE ... RETURNING
//! - search: one query assembled from the resolved filter

use chrono::{DateTime, Utc};
use postline_core::SearchQuery;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{unique_violation, DbError};
use crate::db::migrations::POST_TEXT_UNIQUE;
use crate::models::{PostId, PostText};

/// Post record from database
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post joined with its author's username
#[derive(Debug, Clone, FromRow)]
pub struct PostWithAuthor {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const JOINED_SELECT: &str = "SELECT p.id, p.text, p.user_id, u.username, p.created_at, p.updated_at \
                             FROM posts p JOIN users u ON u.id = p.user_id";

/// Post repository
pub struct PostRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a post owned by `user_id`.
    pub async fn create(&self, text: PostText, user_id: i64) -> Result<Post, DbError> {
        let result = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, user_id)
            VALUES ($1, $2)
            RETURNING id, text, user_id, created_at, updated_at
            "#,
        )
        .bind(text.as_str())
        .bind(user_id)
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(post) => {
                tracing::info!(post_id = post.id, user_id, "post created");
                Ok(post)
            }
            Err(e) => match unique_violation(&e).as_deref() {
                Some(POST_TEXT_UNIQUE) => Err(DbError::Conflict {
                    reason: "Post already exists",
                }),
                Some(other) => {
                    tracing::warn!(constraint = other, "unexpected unique violation on posts");
                    Err(e.into())
                }
                None => Err(e.into()),
            },
        }
    }

    /// Get a single post with its author.
    pub async fn get(&self, id: PostId) -> Result<PostWithAuthor, DbError> {
        let sql = format!("{JOINED_SELECT} WHERE p.id = $1");
        sqlx::query_as::<_, PostWithAuthor>(&sql)
            .bind(id.get())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "post",
                id: id.get().to_string(),
            })
    }

    /// Delete a post if, and only if, `user_id` owns it.
    ///
    /// Someone else's post reports NotFound, same as a missing one.
    pub async fn delete_owned(&self, id: PostId, user_id: i64) -> Result<Post, DbError> {
        let deleted = sqlx::query_as::<_, Post>(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND user_id = $2
            RETURNING id, text, user_id, created_at, updated_at
            "#,
        )
        .bind(id.get())
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "post",
            id: id.get().to_string(),
        })?;

        tracing::info!(post_id = deleted.id, user_id, "post deleted");
        Ok(deleted)
    }

    /// Run a resolved search, oldest first.
    ///
    /// An empty date range matches nothing and skips the database.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<PostWithAuthor>, DbError> {
        if query.range.is_some_and(|r| r.is_empty()) {
            return Ok(Vec::new());
        }

        let mut builder = search_sql(query);
        tracing::debug!(sql = builder.sql(), "post search");

        let posts = builder
            .build_query_as::<PostWithAuthor>()
            .fetch_all(self.pool)
            .await?;
        Ok(posts)
    }
}

/// Build the search statement: only present filters add predicates.
pub fn search_sql(query: &SearchQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(JOINED_SELECT);
    let mut glue = " WHERE ";

    if let Some(username) = &query.username {
        builder
            .push(glue)
            .push("LOWER(u.username) = LOWER(")
            .push_bind(username.as_str())
            .push(")");
        glue = " AND ";
    }

    if let Some(range) = &query.range {
        builder
            .push(glue)
            .push_bind(range.start_utc())
            .push(" <= p.created_at AND p.created_at < ")
            .push_bind(range.end_utc());
    }

    builder.push(" ORDER BY p.created_at, p.id");
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use postline_core::SearchFilter;

    fn resolve(path: &str) -> SearchQuery {
        SearchFilter::parse(path)
            .resolve(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap())
            .unwrap()
    }

    #[test]
    fn unfiltered_search_has_no_where() {
        let query = resolve("");
        let builder = search_sql(&query);
        assert_eq!(
            builder.sql(),
            format!("{JOINED_SELECT} ORDER BY p.created_at, p.id")
        );
    }

    #[test]
    fn username_only() {
        let query = resolve("@alice");
        let builder = search_sql(&query);
        assert!(builder
            .sql()
            .ends_with(" WHERE LOWER(u.username) = LOWER($1) ORDER BY p.created_at, p.id"));
    }

    #[test]
    fn range_only() {
        let query = resolve("2023-08-29/-5");
        let builder = search_sql(&query);
        assert!(builder
            .sql()
            .ends_with(" WHERE $1 <= p.created_at AND p.created_at < $2 ORDER BY p.created_at, p.id"));
    }

    #[test]
    fn username_and_range() {
        let query = resolve("alice/2023-08-29/-5");
        let builder = search_sql(&query);
        assert!(builder.sql().ends_with(
            " WHERE LOWER(u.username) = LOWER($1) AND $2 <= p.created_at AND p.created_at < $3 \
             ORDER BY p.created_at, p.id"
        ));
    }

    #[test]
    fn username_is_bound_not_inlined() {
        let query = resolve("@x'); DROP TABLE posts; --/2023-08-29");
        let builder = search_sql(&query);
        assert!(!builder.sql().contains("DROP TABLE"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_text_is_conflict() {
        // create the same text twice as one user, expect DbError::Conflict
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let user = crate::db::UserRepo::new(&pool)
            .create(crate::db::NewUser {
                username: crate::models::Username::new(&format!("dup{}", &suffix[..8])).unwrap(),
                email: crate::models::Email::new(&format!("{suffix}@dup.io")).unwrap(),
                password_hash: "x".into(),
                about: None,
            })
            .await
            .unwrap();

        let repo = PostRepo::new(&pool);
        let text = PostText::new(&format!("hello {suffix}")).unwrap();
        repo.create(text.clone(), user.id).await.unwrap();
        let err = repo.create(text, user.id).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { reason: "Post already exists" }));
    }
}
