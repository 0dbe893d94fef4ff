use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Clone)]
pub struct BookmarkService {
    pool: PgPool,
}

impl BookmarkService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flips the bookmark for (user, question) and returns the new state.
    /// Delete-then-insert keeps the toggle free of a read-modify-write
    /// window; last action wins.
    pub async fn toggle(&self, user_id: Uuid, question_id: i64) -> Result<bool> {
        let deleted = sqlx::query_scalar::<_, i64>(
            r#"
            WITH removed AS (
                DELETE FROM s_user_bookmarks
                WHERE user_id = $1 AND question_id = $2
                RETURNING id
            )
            SELECT COUNT(*) FROM removed
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        if deleted > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO s_user_bookmarks (user_id, question_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, question_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// The user's flagged question ids, loaded once at session open.
    pub async fn load_for_user(&self, user_id: Uuid) -> Result<HashSet<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"SELECT question_id FROM s_user_bookmarks WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }
}
