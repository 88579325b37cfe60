//! Schema setup for users and posts

use sqlx::PgPool;

/// Statements run in order; every one is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(50) NOT NULL,
        email VARCHAR(250) NOT NULL,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        about TEXT,
        refresh_token VARCHAR(255),
        confirmed BOOLEAN NOT NULL DEFAULT FALSE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_username_lower_idx ON users (LOWER(username))",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (LOWER(email))",
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        text VARCHAR(10000) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    // btree rows cap out near 2.7kB, so uniqueness is enforced on a digest
    "CREATE UNIQUE INDEX IF NOT EXISTS posts_text_md5_idx ON posts (md5(text))",
    "CREATE INDEX IF NOT EXISTS posts_created_at_idx ON posts (created_at)",
    "CREATE INDEX IF NOT EXISTS posts_user_id_idx ON posts (user_id)",
];

/// Unique index names, used to classify conflicts
pub const USERNAME_UNIQUE: &str = "users_username_lower_idx";
pub const EMAIL_UNIQUE: &str = "users_email_lower_idx";
pub const POST_TEXT_UNIQUE: &str = "posts_text_md5_idx";

/// Create tables and indexes if they do not exist.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(statements = SCHEMA.len(), "Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_exist_in_schema() {
        let schema = SCHEMA.join("\n");
        for name in [USERNAME_UNIQUE, EMAIL_UNIQUE, POST_TEXT_UNIQUE] {
            assert!(schema.contains(name), "{name} missing from schema");
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
    }
}
